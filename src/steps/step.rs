//! The step model.

use std::path::{Path, PathBuf};

use crate::config::interpolation::render;
use crate::config::{SkipCheck, StepConfig, StepKind};
use crate::error::{Result, StepforgeError};
use crate::options::{ResolveContext, ResolvedOptions, StepId};

use super::kind::{action_for, StepAction};

/// A registered step: its name and its platform-specific configuration.
#[derive(Debug, Clone)]
pub struct Step {
    id: StepId,
    config: StepConfig,
}

impl Step {
    pub fn new(id: impl Into<StepId>, config: StepConfig) -> Self {
        Self {
            id: id.into(),
            config,
        }
    }

    pub fn id(&self) -> &StepId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.as_str()
    }

    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut StepConfig {
        &mut self.config
    }

    pub fn kind(&self) -> StepKind {
        self.config.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.config.description.as_deref()
    }

    /// Steps whose work must be done before this one, in declared order.
    pub fn depends_on(&self) -> &[String] {
        &self.config.depends_on
    }

    /// Composite children, in declared order.
    pub fn children(&self) -> &[String] {
        &self.config.steps
    }

    pub fn action(&self) -> &'static dyn StepAction {
        action_for(self.config.kind)
    }

    /// The predicate deciding whether this step is already satisfied.
    pub fn skip_check(&self) -> SkipCheck {
        self.config.skip_if.clone().unwrap_or_default()
    }

    /// Name of the option holding this step's output location.
    pub fn output_option(&self, options: &ResolvedOptions) -> Option<String> {
        self.config
            .output
            .clone()
            .or_else(|| self.action().default_output(options).map(String::from))
    }

    /// Absolute output location, when the step declares one.
    pub fn output_path(&self, options: &ResolvedOptions, project_root: &Path) -> Option<PathBuf> {
        let option = self.output_option(options)?;
        options.get_path(&option, project_root)
    }
}

/// Fill `{placeholders}` in `input` from a step's finalized options and
/// the run-wide builtins.
///
/// `field` names the setting being expanded, for error messages.
pub fn expand(
    input: &str,
    options: &ResolvedOptions,
    context: &ResolveContext,
    field: &str,
) -> Result<String> {
    render(input, |name| {
        options
            .get_str(name)
            .or_else(|| context.builtin(options.step(), name))
    })
    .map_err(|placeholder| StepforgeError::UnresolvedPlaceholder {
        step: options.step().to_string(),
        option: field.to_string(),
        placeholder,
    })
}

/// Expand every element of an argument vector.
pub fn expand_all(
    items: &[String],
    options: &ResolvedOptions,
    context: &ResolveContext,
    field: &str,
) -> Result<Vec<String>> {
    items
        .iter()
        .map(|item| expand(item, options, context, field))
        .collect()
}
