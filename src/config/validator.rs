//! Configuration validation rules.
//!
//! This module validates configuration for correctness before any step
//! runs:
//! - `depends_on`, `steps` and `refs` must name existing steps
//! - only composite steps may list children
//! - only fetch steps may declare `post_fetch` hooks
//! - patch edit patterns must be valid regular expressions
//! - no circular step dependencies or option references

use regex::Regex;

use crate::config::schema::{PatchEdit, PostFetchHook, StepConfig, StepKind, StepforgeConfig};
use crate::error::{Result, StepforgeError};
use crate::platform::Platform;
use crate::runner::dependency::DependencyGraph;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Step name if error is step-specific
    pub step: Option<String>,
    /// Cycle path for the circular rules
    pub cycle: Option<String>,
}

impl ValidationError {
    fn for_step(rule: &str, step: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
            step: Some(step.to_string()),
            cycle: None,
        }
    }

    fn cycle(rule: &str, path: Vec<String>, message: &str) -> Self {
        let cycle = path.join(" -> ");
        Self {
            rule: rule.to_string(),
            message: format!("{}: {}", message, cycle),
            step: None,
            cycle: Some(cycle),
        }
    }

    /// Convert into the matching [`StepforgeError`].
    pub fn into_error(self) -> StepforgeError {
        match (self.rule.as_str(), self.cycle) {
            ("circular-dependency", Some(cycle)) => StepforgeError::CircularDependency { cycle },
            ("circular-reference", Some(cycle)) => StepforgeError::CircularReference { cycle },
            _ => StepforgeError::ConfigValidationError {
                message: self.message,
            },
        }
    }
}

/// Validate a configuration as it applies on `platform`.
///
/// Collects every error rather than stopping at the first one.
pub fn validate_config(config: &StepforgeConfig, platform: Platform) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut names: Vec<&String> = config.steps.keys().collect();
    names.sort();

    for name in &names {
        let step = &config.steps[name.as_str()];
        errors.extend(validate_step(config, name, step));
        for ov in step.platform_overrides.values() {
            if let Some(hooks) = &ov.post_fetch {
                errors.extend(validate_patch_patterns(name, hooks));
            }
            let deps = ov.depends_on.iter().flatten();
            let children = ov.steps.iter().flatten();
            for dep in deps.chain(children) {
                if !config.steps.contains_key(dep) {
                    errors.push(ValidationError::for_step(
                        "unknown-step",
                        name,
                        format!(
                            "Step '{}' has a platform override naming '{}' which does not exist",
                            name, dep
                        ),
                    ));
                }
            }
        }
    }

    if let Some(root) = &config.settings.default_root {
        if !config.steps.contains_key(root) {
            errors.push(ValidationError {
                rule: "unknown-step".to_string(),
                message: format!("default_root '{}' does not exist", root),
                step: None,
                cycle: None,
            });
        }
    }

    errors.extend(validate_cycles(config, platform));
    errors
}

fn validate_step(config: &StepforgeConfig, name: &str, step: &StepConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for dep in &step.depends_on {
        if !config.steps.contains_key(dep) {
            errors.push(ValidationError::for_step(
                "unknown-step",
                name,
                format!("Step '{}' depends on '{}' which does not exist", name, dep),
            ));
        }
    }

    for child in &step.steps {
        if !config.steps.contains_key(child) {
            errors.push(ValidationError::for_step(
                "unknown-step",
                name,
                format!("Step '{}' lists child '{}' which does not exist", name, child),
            ));
        }
    }

    for (option, source) in &step.refs {
        if !config.steps.contains_key(source.step.as_str()) {
            errors.push(ValidationError::for_step(
                "unknown-step",
                name,
                format!(
                    "Option '{}.{}' references '{}' but step '{}' does not exist",
                    name, option, source, source.step
                ),
            ));
        }
    }

    if !step.steps.is_empty() && step.kind != StepKind::Composite {
        errors.push(ValidationError::for_step(
            "children-on-non-composite",
            name,
            format!(
                "Step '{}' lists child steps but is of kind '{}'",
                name, step.kind
            ),
        ));
    }

    if !step.post_fetch.is_empty() && step.kind != StepKind::Fetch {
        errors.push(ValidationError::for_step(
            "post-fetch-on-non-fetch",
            name,
            format!(
                "Step '{}' declares post_fetch hooks but is of kind '{}'",
                name, step.kind
            ),
        ));
    }

    errors.extend(validate_patch_patterns(name, &step.post_fetch));
    errors
}

fn validate_patch_patterns(name: &str, hooks: &[PostFetchHook]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for hook in hooks {
        let PostFetchHook::Patch { file, edits, .. } = hook else {
            continue;
        };
        for pattern in edits.iter().filter_map(PatchEdit::regex) {
            if let Err(e) = Regex::new(pattern) {
                errors.push(ValidationError::for_step(
                    "invalid-patch-pattern",
                    name,
                    format!(
                        "Step '{}' patches {} with invalid pattern '{}': {}",
                        name, file, pattern, e
                    ),
                ));
            }
        }
    }
    errors
}

fn validate_cycles(config: &StepforgeConfig, platform: Platform) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut steps = DependencyGraph::builder();
    let mut options = DependencyGraph::builder();

    for (name, base) in &config.steps {
        let step = base.for_platform(platform);
        steps = steps.add_node(name.as_str(), step.depends_on.iter().chain(&step.steps).cloned());
        for (option, source) in &step.refs {
            options = options.add_node(format!("{}.{}", name, option), [source.to_string()]);
        }
    }

    if let Some(cycle) = steps.build().find_cycle() {
        errors.push(ValidationError::cycle(
            "circular-dependency",
            cycle,
            "Circular dependency detected",
        ));
    }
    if let Some(cycle) = options.build().find_cycle() {
        errors.push(ValidationError::cycle(
            "circular-reference",
            cycle,
            "Circular option reference",
        ));
    }

    errors
}

/// Validate and return the first problem as an error.
///
/// # Errors
///
/// A single problem is returned as its specific error (for example
/// `CircularDependency`); several are joined into one
/// `ConfigValidationError`.
pub fn validate(config: &StepforgeConfig, platform: Platform) -> Result<()> {
    let mut errors = validate_config(config, platform);

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0).into_error()),
        _ => {
            let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
            Err(StepforgeError::ConfigValidationError {
                message: messages.join("; "),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(yaml: &str) -> StepforgeConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn valid_config_passes() {
        let config = config(
            r#"
steps:
  fetch_x:
    kind: fetch
  build_x:
    kind: cmake
    depends_on: [fetch_x]
    refs:
      source_dir: fetch_x.source_dir
  all:
    kind: composite
    steps: [build_x]
"#,
        );
        assert!(validate_config(&config, Platform::Linux).is_empty());
        assert!(validate(&config, Platform::Linux).is_ok());
    }

    #[test]
    fn unknown_dependency_is_reported() {
        let config = config("steps:\n  build_x:\n    depends_on: [fetch_x]");
        let errors = validate_config(&config, Platform::Linux);
        assert!(errors.iter().any(|e| e.rule == "unknown-step"));
        assert_eq!(errors[0].step.as_deref(), Some("build_x"));
    }

    #[test]
    fn unknown_reference_step_is_reported() {
        let config = config("steps:\n  build_x:\n    refs:\n      source_dir: fetch_y.source_dir");
        let errors = validate_config(&config, Platform::Linux);
        assert!(errors
            .iter()
            .any(|e| e.rule == "unknown-step" && e.message.contains("fetch_y")));
    }

    #[test]
    fn unknown_default_root_is_reported() {
        let config = config("settings:\n  default_root: nope\nsteps: {}");
        let errors = validate_config(&config, Platform::Linux);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn children_require_composite_kind() {
        let config = config(
            "steps:\n  a:\n    kind: command\n    steps: [b]\n  b:\n    kind: command",
        );
        let errors = validate_config(&config, Platform::Linux);
        assert!(errors.iter().any(|e| e.rule == "children-on-non-composite"));
    }

    #[test]
    fn post_fetch_requires_fetch_kind() {
        let config = config(
            r#"
steps:
  build_x:
    kind: cmake
    post_fetch:
      - type: command
        argv: [echo]
"#,
        );
        let errors = validate_config(&config, Platform::Linux);
        assert!(errors.iter().any(|e| e.rule == "post-fetch-on-non-fetch"));
    }

    #[test]
    fn invalid_patch_pattern_rejected_at_load() {
        let config = config(
            r#"
steps:
  fetch_x:
    kind: fetch
    post_fetch:
      - type: patch
        file: CMakeLists.txt
        edits:
          - op: insert_after
            pattern: "^project\\("
            line: "set(X ON)"
          - op: delete_matching
            pattern: "(unclosed"
"#,
        );
        let errors = validate_config(&config, Platform::Linux);
        let invalid: Vec<_> = errors
            .iter()
            .filter(|e| e.rule == "invalid-patch-pattern")
            .collect();
        assert_eq!(invalid.len(), 1);
        assert!(invalid[0].message.contains("(unclosed"));
        assert_eq!(invalid[0].step.as_deref(), Some("fetch_x"));

        assert!(matches!(
            validate(&config, Platform::Linux),
            Err(StepforgeError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn invalid_override_pattern_rejected_at_load() {
        let config = config(
            r#"
steps:
  fetch_x:
    kind: fetch
    platform_overrides:
      windows:
        post_fetch:
          - type: patch
            file: CMakeLists.txt
            edits:
              - op: insert_before_end
                line: "install(X)"
                unless: "[z-a]"
"#,
        );
        let errors = validate_config(&config, Platform::Linux);
        assert!(errors.iter().any(|e| e.rule == "invalid-patch-pattern"));
    }

    #[test]
    fn dependency_cycle_becomes_circular_dependency() {
        let config = config(
            "steps:\n  a:\n    depends_on: [b]\n  b:\n    depends_on: [a]",
        );
        let result = validate(&config, Platform::Linux);
        assert!(matches!(
            result,
            Err(StepforgeError::CircularDependency { .. })
        ));
    }

    #[test]
    fn composite_child_cycle_is_detected() {
        let config = config("steps:\n  all:\n    kind: composite\n    steps: [all]");
        let result = validate(&config, Platform::Linux);
        assert!(matches!(
            result,
            Err(StepforgeError::CircularDependency { .. })
        ));
    }

    #[test]
    fn reference_cycle_becomes_circular_reference() {
        let config = config(
            r#"
steps:
  a:
    refs:
      x: b.y
  b:
    refs:
      y: a.x
"#,
        );
        match validate(&config, Platform::Linux) {
            Err(StepforgeError::CircularReference { cycle }) => {
                assert!(cycle.contains("a.x"));
                assert!(cycle.contains("b.y"));
            }
            other => panic!("expected circular reference, got {:?}", other),
        }
    }

    #[test]
    fn platform_override_cycle_only_on_that_platform() {
        let config = config(
            r#"
steps:
  a:
    platform_overrides:
      windows:
        depends_on: [b]
  b:
    depends_on: [a]
"#,
        );
        assert!(validate(&config, Platform::Linux).is_ok());
        assert!(validate(&config, Platform::Windows).is_err());
    }

    #[test]
    fn multiple_errors_are_joined() {
        let config = config("steps:\n  a:\n    depends_on: [x, y]");
        match validate(&config, Platform::Linux) {
            Err(StepforgeError::ConfigValidationError { message }) => {
                assert!(message.contains("'x'"));
                assert!(message.contains("'y'"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
