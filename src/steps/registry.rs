//! The step registry.
//!
//! Built once per run from the loaded configuration and passed by
//! reference to the resolver, planner and scheduler.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use super::step::Step;
use crate::config::StepforgeConfig;
use crate::error::{Result, StepforgeError};
use crate::options::OptionOverride;
use crate::platform::Platform;
use crate::runner::DependencyGraph;

/// Immutable set of steps active on one platform.
#[derive(Debug, Clone)]
pub struct StepRegistry {
    platform: Platform,
    steps: BTreeMap<String, Step>,
    excluded: BTreeSet<String>,
}

impl StepRegistry {
    /// Register every step that applies on `platform`, with that
    /// platform's overrides merged in and `overrides` applied as
    /// explicit option values.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStep` when an override names a step that does not
    /// exist.
    pub fn from_config(
        config: &StepforgeConfig,
        platform: Platform,
        overrides: &[OptionOverride],
    ) -> Result<Self> {
        let mut steps = BTreeMap::new();
        let mut excluded = BTreeSet::new();

        for (name, step_config) in &config.steps {
            if platform.matches(&step_config.platforms) {
                steps.insert(
                    name.clone(),
                    Step::new(name.as_str(), step_config.for_platform(platform)),
                );
            } else {
                debug!("Step '{}' does not apply on {}", name, platform);
                excluded.insert(name.clone());
            }
        }

        for ov in overrides {
            let name = ov.target.step.as_str();
            match steps.get_mut(name) {
                Some(step) => {
                    step.config_mut()
                        .options
                        .insert(ov.target.option.clone(), ov.value.clone());
                }
                None if excluded.contains(name) => {
                    warn!("Ignoring override for '{}': step does not apply on {}", ov.target, platform);
                }
                None => {
                    return Err(StepforgeError::UnknownStep {
                        name: name.to_string(),
                        referenced_by: "command line".to_string(),
                    });
                }
            }
        }

        Ok(Self {
            platform,
            steps,
            excluded,
        })
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn get(&self, name: &str) -> Option<&Step> {
        self.steps.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    /// Whether `name` is configured but does not apply on this platform.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.contains(name)
    }

    /// Steps in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }

    pub fn excluded(&self) -> impl Iterator<Item = &str> {
        self.excluded.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Graph over dependencies and composite children of active steps.
    pub fn dependency_graph(&self) -> DependencyGraph {
        let mut builder = DependencyGraph::builder();
        for step in self.steps.values() {
            let edges = step
                .depends_on()
                .iter()
                .chain(step.children())
                .filter(|name| !self.is_excluded(name))
                .cloned()
                .collect::<Vec<_>>();
            builder = builder.add_node(step.name(), edges);
        }
        builder.build()
    }

    /// Active steps ordered so every step follows its dependencies.
    ///
    /// # Errors
    ///
    /// Returns `CircularDependency` when the steps form a cycle.
    pub fn topological_order(&self) -> Result<Vec<&Step>> {
        let order = self.dependency_graph().topological_order()?;
        Ok(order.iter().filter_map(|name| self.get(name)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionValue;

    fn config(yaml: &str) -> StepforgeConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    const YAML: &str = r#"
steps:
  fetch_fftw:
    kind: fetch
    platforms: [windows]
  fetch_zlib:
    kind: fetch
    options: {version: v1.2.5}
    platform_overrides:
      windows:
        options: {version: v1.2.3}
  build_zlib:
    kind: cmake
    depends_on: [fetch_zlib, fetch_fftw]
"#;

    #[test]
    fn platform_filter_excludes_steps() {
        let reg = StepRegistry::from_config(&config(YAML), Platform::Linux, &[]).unwrap();
        assert!(reg.contains("fetch_zlib"));
        assert!(!reg.contains("fetch_fftw"));
        assert!(reg.is_excluded("fetch_fftw"));
        assert!(!reg.is_excluded("nope"));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn platform_overrides_are_merged() {
        let reg = StepRegistry::from_config(&config(YAML), Platform::Windows, &[]).unwrap();
        let step = reg.get("fetch_zlib").unwrap();
        assert_eq!(step.config().options["version"], OptionValue::text("v1.2.3"));
        assert!(reg.contains("fetch_fftw"));
    }

    #[test]
    fn overrides_become_explicit_options() {
        let ov: OptionOverride = "fetch_zlib.version=v1.2.8".parse().unwrap();
        let reg = StepRegistry::from_config(&config(YAML), Platform::Linux, &[ov]).unwrap();
        assert_eq!(
            reg.get("fetch_zlib").unwrap().config().options["version"],
            OptionValue::text("v1.2.8")
        );
    }

    #[test]
    fn override_of_unknown_step_fails() {
        let ov: OptionOverride = "nope.version=1".parse().unwrap();
        match StepRegistry::from_config(&config(YAML), Platform::Linux, &[ov]) {
            Err(StepforgeError::UnknownStep {
                name,
                referenced_by,
            }) => {
                assert_eq!(name, "nope");
                assert_eq!(referenced_by, "command line");
            }
            other => panic!("expected unknown step, got {:?}", other),
        }
    }

    #[test]
    fn override_of_excluded_step_is_ignored() {
        let ov: OptionOverride = "fetch_fftw.version=3".parse().unwrap();
        assert!(StepRegistry::from_config(&config(YAML), Platform::Linux, &[ov]).is_ok());
    }

    #[test]
    fn topological_order_drops_excluded_dependencies() {
        let reg = StepRegistry::from_config(&config(YAML), Platform::Linux, &[]).unwrap();
        let names: Vec<_> = reg
            .topological_order()
            .unwrap()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["fetch_zlib", "build_zlib"]);
    }
}
