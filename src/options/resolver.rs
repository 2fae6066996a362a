//! The option resolver.
//!
//! Each step's options are finalized exactly once per run, in this order:
//!
//! 1. explicit values (config `options`, command-line overrides on top)
//! 2. references to other steps' finalized options
//! 3. static defaults, first from the config then from the step kind
//! 4. seeded values the kind computes from the step name
//! 5. `{placeholder}` templating, single pass
//! 6. derived values the kind computes from templated options
//! 7. required-option check
//!
//! The finalized result is written to the [`OptionStore`] and shared by
//! every later reader.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use super::store::{OptionOrigin, OptionStore, ResolvedOption, ResolvedOptions};
use super::value::{OptionValue, StepId};
use crate::config::interpolation::render;
use crate::error::{Result, StepforgeError};
use crate::platform::Platform;
use crate::steps::{Step, StepRegistry};

/// Run-wide values available to every step.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// Project root; relative option paths are taken against it
    pub project_root: PathBuf,
    /// Base directory for fetched sources, as written in the settings
    pub work_dir: String,
    pub platform: Platform,
}

impl ResolveContext {
    pub fn new(project_root: impl Into<PathBuf>, work_dir: impl Into<String>, platform: Platform) -> Self {
        Self {
            project_root: project_root.into(),
            work_dir: work_dir.into(),
            platform,
        }
    }

    /// Value of a builtin placeholder.
    pub fn builtin(&self, step: &StepId, name: &str) -> Option<String> {
        match name {
            "step" => Some(step.to_string()),
            "work_dir" => Some(self.work_dir.clone()),
            "project_root" => Some(self.project_root.display().to_string()),
            "platform" => Some(self.platform.to_string()),
            "lib_ext" => Some(self.platform.lib_ext().to_string()),
            "dll_ext" => Some(self.platform.dll_ext().to_string()),
            _ => None,
        }
    }
}

/// Option values of one step while it is being resolved.
#[derive(Debug, Clone, Default)]
pub struct OptionSlots {
    slots: BTreeMap<String, ResolvedOption>,
}

impl OptionSlots {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.slots.get(name).map(|s| &s.value)
    }

    /// Rendered text of an option.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).map(OptionValue::render)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Fill an option unless it already holds a value.
    pub fn fill(&mut self, name: impl Into<String>, value: OptionValue, origin: OptionOrigin) -> bool {
        let name = name.into();
        if self.slots.contains_key(&name) {
            return false;
        }
        self.slots.insert(name, ResolvedOption { value, origin });
        true
    }

    fn is_final(&self, name: &str) -> Option<bool> {
        self.slots.get(name).map(|s| {
            matches!(s.origin, OptionOrigin::Reference { .. }) || !s.value.has_placeholders()
        })
    }
}

/// Finalizes step options against a registry.
pub struct OptionResolver<'a> {
    registry: &'a StepRegistry,
    context: ResolveContext,
    store: OptionStore,
    /// Steps being resolved, with the option whose reference is being followed.
    in_progress: Vec<(StepId, Option<String>)>,
}

impl<'a> OptionResolver<'a> {
    pub fn new(registry: &'a StepRegistry, context: ResolveContext) -> Self {
        Self {
            registry,
            context,
            store: OptionStore::new(),
            in_progress: Vec::new(),
        }
    }

    pub fn registry(&self) -> &'a StepRegistry {
        self.registry
    }

    pub fn context(&self) -> &ResolveContext {
        &self.context
    }

    pub fn store(&self) -> &OptionStore {
        &self.store
    }

    /// Finalized options of `step`, resolving it (and whatever it
    /// references) on first use.
    ///
    /// # Errors
    ///
    /// `UnknownStep`, `CircularReference`, `UnresolvedPlaceholder` or
    /// `MissingOption`.
    pub fn resolve(&mut self, step: &str) -> Result<Arc<ResolvedOptions>> {
        self.resolve_requested(step, None)
    }

    fn resolve_requested(&mut self, step: &str, requested: Option<&str>) -> Result<Arc<ResolvedOptions>> {
        if let Some(done) = self.store.get(step) {
            return Ok(done);
        }

        if let Some(pos) = self.in_progress.iter().position(|(s, _)| s == step) {
            let mut chain: Vec<String> = self.in_progress[pos..]
                .iter()
                .map(|(s, o)| label(s.as_str(), o.as_deref()))
                .collect();
            chain.push(label(step, requested));
            return Err(StepforgeError::CircularReference {
                cycle: chain.join(" -> "),
            });
        }

        let registry = self.registry;
        let definition = registry.get(step).ok_or_else(|| StepforgeError::UnknownStep {
            name: step.to_string(),
            referenced_by: self
                .in_progress
                .last()
                .map(|(s, o)| label(s.as_str(), o.as_deref()))
                .unwrap_or_else(|| "command line".to_string()),
        })?;

        self.in_progress.push((definition.id().clone(), None));
        let built = self.build(definition);
        self.in_progress.pop();

        let options = built?;
        debug!(
            "Resolved {} option(s) for step '{}'",
            options.len(),
            definition.id()
        );
        self.store.finalize(options)
    }

    fn build(&mut self, step: &'a Step) -> Result<ResolvedOptions> {
        let config = step.config();
        let action = step.action();
        let platform = self.context.platform;
        let mut slots = OptionSlots::default();

        for (name, value) in &config.options {
            slots.fill(name.as_str(), value.clone(), OptionOrigin::Explicit);
        }

        for (name, source) in &config.refs {
            if slots.contains(name) {
                continue;
            }
            if self.registry.is_excluded(source.step.as_str()) {
                debug!(
                    "Step '{}' is not built on {}; '{}.{}' falls back to defaults",
                    source.step,
                    platform,
                    step.id(),
                    name
                );
                continue;
            }
            if let Some(current) = self.in_progress.last_mut() {
                current.1 = Some(name.clone());
            }
            let upstream =
                self.resolve_requested(source.step.as_str(), Some(source.option.as_str()))?;
            if let Some(value) = upstream.get(&source.option) {
                slots.fill(
                    name.as_str(),
                    value.clone(),
                    OptionOrigin::Reference {
                        from: source.clone(),
                    },
                );
            }
        }
        if let Some(current) = self.in_progress.last_mut() {
            current.1 = None;
        }

        for (name, value) in &config.defaults {
            slots.fill(name.as_str(), value.clone(), OptionOrigin::Default);
        }
        for (name, value) in action.schema_defaults(platform) {
            slots.fill(name, value, OptionOrigin::Default);
        }
        for (name, value) in action.seed(step.id(), &slots) {
            slots.fill(name, value, OptionOrigin::Seeded);
        }

        self.apply_templates(step.id(), &mut slots)?;

        for (name, value) in action.derive(&slots, &self.context) {
            slots.fill(name, value, OptionOrigin::Derived);
        }

        let required = action
            .required_options()
            .iter()
            .copied()
            .chain(config.required.iter().map(String::as_str));
        for name in required {
            if !slots.contains(name) {
                return Err(StepforgeError::MissingOption {
                    step: step.id().to_string(),
                    option: name.to_string(),
                });
            }
        }

        Ok(ResolvedOptions::new(step.id().clone(), slots.slots))
    }

    /// Fill placeholders in every non-reference option, reading the
    /// pre-template values only.
    fn apply_templates(&self, step: &StepId, slots: &mut OptionSlots) -> Result<()> {
        let raw = slots.clone();

        for (option, slot) in slots.slots.iter_mut() {
            if matches!(slot.origin, OptionOrigin::Reference { .. }) || !slot.value.has_placeholders() {
                continue;
            }
            let fill = |input: &str| -> Result<String> {
                render(input, |name| match raw.is_final(name) {
                    Some(true) => raw.text(name),
                    Some(false) => None,
                    None => self.context.builtin(step, name),
                })
                .map_err(|placeholder| StepforgeError::UnresolvedPlaceholder {
                    step: step.to_string(),
                    option: option.clone(),
                    placeholder,
                })
            };
            slot.value = match &slot.value {
                OptionValue::Text(s) => OptionValue::Text(fill(s)?),
                OptionValue::List(items) => OptionValue::List(
                    items.iter().map(|item| fill(item)).collect::<Result<Vec<_>>>()?,
                ),
                OptionValue::Bool(b) => OptionValue::Bool(*b),
            };
        }

        Ok(())
    }
}

fn label(step: &str, option: Option<&str>) -> String {
    match option {
        Some(option) => format!("{}.{}", step, option),
        None => step.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StepforgeConfig;

    fn registry(yaml: &str, platform: Platform) -> StepRegistry {
        let config: StepforgeConfig = serde_yaml::from_str(yaml).unwrap();
        StepRegistry::from_config(&config, platform, &[]).unwrap()
    }

    fn context(platform: Platform) -> ResolveContext {
        ResolveContext::new("/project", "build", platform)
    }

    #[test]
    fn templates_same_step_options() {
        let reg = registry(
            r#"
steps:
  demo:
    options:
      a: foo
      b: "1.0"
      name: "{a}-{b}"
      argv: [echo]
"#,
            Platform::Linux,
        );
        let mut resolver = OptionResolver::new(&reg, context(Platform::Linux));
        let opts = resolver.resolve("demo").unwrap();
        assert_eq!(opts.get_str("name").as_deref(), Some("foo-1.0"));
        assert_eq!(opts.origin("name"), Some(&OptionOrigin::Explicit));
    }

    #[test]
    fn unset_placeholder_is_configuration_error() {
        let reg = registry(
            "steps:\n  demo:\n    options:\n      name: \"{a}-{missing}\"\n      a: x\n      argv: [echo]",
            Platform::Linux,
        );
        let mut resolver = OptionResolver::new(&reg, context(Platform::Linux));
        match resolver.resolve("demo") {
            Err(StepforgeError::UnresolvedPlaceholder {
                step,
                option,
                placeholder,
            }) => {
                assert_eq!(step, "demo");
                assert_eq!(option, "name");
                assert_eq!(placeholder, "missing");
            }
            other => panic!("expected unresolved placeholder, got {:?}", other),
        }
    }

    #[test]
    fn chained_templates_are_rejected() {
        let reg = registry(
            "steps:\n  demo:\n    options:\n      a: \"{b}\"\n      b: \"{c}\"\n      c: x\n      argv: [echo]",
            Platform::Linux,
        );
        let mut resolver = OptionResolver::new(&reg, context(Platform::Linux));
        let err = resolver.resolve("demo").unwrap_err();
        assert!(matches!(
            err,
            StepforgeError::UnresolvedPlaceholder { ref option, .. } if option == "a"
        ));
    }

    #[test]
    fn builtins_are_available() {
        let reg = registry(
            "steps:\n  demo:\n    options:\n      lib: \"{work_dir}/{step}.{lib_ext}\"\n      argv: [echo]",
            Platform::Windows,
        );
        let mut resolver = OptionResolver::new(&reg, context(Platform::Windows));
        let opts = resolver.resolve("demo").unwrap();
        assert_eq!(opts.get_str("lib").as_deref(), Some("build/demo.lib"));
    }

    #[test]
    fn list_items_are_templated() {
        let reg = registry(
            "steps:\n  demo:\n    options:\n      v: \"2\"\n      argv: [tool, \"--v={v}\", \"{{raw}}\"]",
            Platform::Linux,
        );
        let mut resolver = OptionResolver::new(&reg, context(Platform::Linux));
        let opts = resolver.resolve("demo").unwrap();
        assert_eq!(opts.get_list("argv"), vec!["tool", "--v=2", "{raw}"]);
    }

    #[test]
    fn reference_copies_finalized_value() {
        let reg = registry(
            r#"
steps:
  fetch_x:
    options:
      source_dir: ./x-src
      argv: [fetch]
  build_x:
    depends_on: [fetch_x]
    refs:
      directory: fetch_x.source_dir
    options:
      argv: [make]
"#,
            Platform::Linux,
        );
        let mut resolver = OptionResolver::new(&reg, context(Platform::Linux));
        let opts = resolver.resolve("build_x").unwrap();
        assert_eq!(opts.get_str("directory").as_deref(), Some("./x-src"));
        assert_eq!(
            opts.origin("directory"),
            Some(&OptionOrigin::Reference {
                from: crate::options::OptionRef::new("fetch_x", "source_dir")
            })
        );
        // The source step was finalized on the way.
        assert!(resolver.store().contains("fetch_x"));
    }

    #[test]
    fn explicit_value_wins_over_reference_and_default() {
        let reg = registry(
            r#"
steps:
  a:
    options: {x: from-a, argv: [a]}
  b:
    options: {x: explicit, argv: [b]}
    refs: {x: a.x}
    defaults: {x: default}
"#,
            Platform::Linux,
        );
        let mut resolver = OptionResolver::new(&reg, context(Platform::Linux));
        let opts = resolver.resolve("b").unwrap();
        assert_eq!(opts.get_str("x").as_deref(), Some("explicit"));
        assert!(!resolver.store().contains("a"));
    }

    #[test]
    fn default_applies_when_reference_has_no_value() {
        let reg = registry(
            r#"
steps:
  a:
    options: {argv: [a]}
  b:
    options: {argv: [b]}
    refs: {x: a.x}
    defaults: {x: fallback}
"#,
            Platform::Linux,
        );
        let mut resolver = OptionResolver::new(&reg, context(Platform::Linux));
        let opts = resolver.resolve("b").unwrap();
        assert_eq!(opts.get_str("x").as_deref(), Some("fallback"));
        assert_eq!(opts.origin("x"), Some(&OptionOrigin::Default));
    }

    #[test]
    fn reference_values_are_not_templated() {
        let reg = registry(
            r#"
steps:
  a:
    options: {pattern: "{{keep}}", argv: [a]}
  b:
    options: {argv: [b]}
    refs: {pattern: a.pattern}
"#,
            Platform::Linux,
        );
        let mut resolver = OptionResolver::new(&reg, context(Platform::Linux));
        let opts = resolver.resolve("b").unwrap();
        assert_eq!(opts.get_str("pattern").as_deref(), Some("{keep}"));
    }

    #[test]
    fn reference_cycle_fails_without_looping() {
        let reg = registry(
            r#"
steps:
  a:
    options: {argv: [a]}
    refs: {x: b.y}
  b:
    options: {argv: [b]}
    refs: {y: a.x}
"#,
            Platform::Linux,
        );
        let mut resolver = OptionResolver::new(&reg, context(Platform::Linux));
        match resolver.resolve("a") {
            Err(StepforgeError::CircularReference { cycle }) => {
                assert_eq!(cycle, "a.x -> b.y -> a.x");
            }
            other => panic!("expected circular reference, got {:?}", other),
        }
    }

    #[test]
    fn missing_required_option_names_step_and_option() {
        let reg = registry("steps:\n  run_it:\n    kind: command", Platform::Linux);
        let mut resolver = OptionResolver::new(&reg, context(Platform::Linux));
        match resolver.resolve("run_it") {
            Err(StepforgeError::MissingOption { step, option }) => {
                assert_eq!(step, "run_it");
                assert_eq!(option, "argv");
            }
            other => panic!("expected missing option, got {:?}", other),
        }
    }

    #[test]
    fn config_required_list_is_enforced() {
        let reg = registry(
            "steps:\n  a:\n    options: {argv: [a]}\n    required: [token]",
            Platform::Linux,
        );
        let mut resolver = OptionResolver::new(&reg, context(Platform::Linux));
        assert!(matches!(
            resolver.resolve("a"),
            Err(StepforgeError::MissingOption { .. })
        ));
    }

    #[test]
    fn reference_to_excluded_step_falls_back() {
        let reg = registry(
            r#"
steps:
  fetch_win_only:
    platforms: [windows]
    options: {source_dir: win-src, argv: [x]}
  build:
    options: {argv: [make]}
    refs: {extra: fetch_win_only.source_dir}
    defaults: {extra: none}
"#,
            Platform::Linux,
        );
        let mut resolver = OptionResolver::new(&reg, context(Platform::Linux));
        let opts = resolver.resolve("build").unwrap();
        assert_eq!(opts.get_str("extra").as_deref(), Some("none"));
    }

    #[test]
    fn unknown_step_is_reported() {
        let reg = registry("steps: {}", Platform::Linux);
        let mut resolver = OptionResolver::new(&reg, context(Platform::Linux));
        assert!(matches!(
            resolver.resolve("nope"),
            Err(StepforgeError::UnknownStep { .. })
        ));
    }

    #[test]
    fn resolution_happens_once() {
        let reg = registry("steps:\n  a:\n    options: {argv: [a]}", Platform::Linux);
        let mut resolver = OptionResolver::new(&reg, context(Platform::Linux));
        let first = resolver.resolve("a").unwrap();
        let second = resolver.resolve("a").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
