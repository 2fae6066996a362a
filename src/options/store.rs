//! Finalized option values and the write-once store that holds them.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use super::value::{OptionRef, OptionValue, StepId};
use crate::error::{Result, StepforgeError};

/// Where a finalized option value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum OptionOrigin {
    /// Set in the config `options` map or on the command line
    Explicit,
    /// Copied from another step's finalized option
    Reference { from: OptionRef },
    /// Static default from the config or the step kind
    Default,
    /// Computed from the step name before templating
    Seeded,
    /// Computed from other options after templating
    Derived,
}

impl OptionOrigin {
    pub fn label(&self) -> String {
        match self {
            OptionOrigin::Explicit => "explicit".to_string(),
            OptionOrigin::Reference { from } => format!("from {}", from),
            OptionOrigin::Default => "default".to_string(),
            OptionOrigin::Seeded => "seeded".to_string(),
            OptionOrigin::Derived => "derived".to_string(),
        }
    }
}

/// A single finalized value with its origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedOption {
    pub value: OptionValue,
    #[serde(flatten)]
    pub origin: OptionOrigin,
}

/// Every finalized option of one step.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedOptions {
    step: StepId,
    values: BTreeMap<String, ResolvedOption>,
}

impl ResolvedOptions {
    pub fn new(step: StepId, values: BTreeMap<String, ResolvedOption>) -> Self {
        Self { step, values }
    }

    pub fn step(&self) -> &StepId {
        &self.step
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name).map(|o| &o.value)
    }

    pub fn origin(&self, name: &str) -> Option<&OptionOrigin> {
        self.values.get(name).map(|o| &o.origin)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResolvedOption)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Text value. Lists and booleans are rendered.
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.get(name).map(OptionValue::render)
    }

    /// Text value that must be present.
    ///
    /// # Errors
    ///
    /// Returns `MissingOption` when the option is unset.
    pub fn require_str(&self, name: &str) -> Result<String> {
        self.get_str(name).ok_or_else(|| self.missing(name))
    }

    /// List value; a text value is a one-element list, unset is empty.
    pub fn get_list(&self, name: &str) -> Vec<String> {
        self.get(name).map(OptionValue::as_list).unwrap_or_default()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(OptionValue::as_bool)
    }

    /// Path value made absolute against `project_root`.
    pub fn get_path(&self, name: &str, project_root: &Path) -> Option<PathBuf> {
        self.get_str(name).map(|p| absolutize(&p, project_root))
    }

    /// # Errors
    ///
    /// Returns `MissingOption` when the option is unset.
    pub fn require_path(&self, name: &str, project_root: &Path) -> Result<PathBuf> {
        self.get_path(name, project_root)
            .ok_or_else(|| self.missing(name))
    }

    fn missing(&self, name: &str) -> StepforgeError {
        StepforgeError::MissingOption {
            step: self.step.to_string(),
            option: name.to_string(),
        }
    }
}

/// Resolve `path` against `root` unless it is already absolute.
pub fn absolutize(path: impl AsRef<Path>, root: &Path) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Write-once store of finalized options, one entry per step.
///
/// Later readers share the stored value; nothing overwrites it.
#[derive(Debug, Default)]
pub struct OptionStore {
    finalized: HashMap<StepId, Arc<ResolvedOptions>>,
}

impl OptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, step: &str) -> Option<Arc<ResolvedOptions>> {
        self.finalized.get(step).cloned()
    }

    pub fn contains(&self, step: &str) -> bool {
        self.finalized.contains_key(step)
    }

    /// Record a step's finalized options.
    ///
    /// # Errors
    ///
    /// Fails if the step was already finalized.
    pub fn finalize(&mut self, options: ResolvedOptions) -> Result<Arc<ResolvedOptions>> {
        let step = options.step().clone();
        if self.finalized.contains_key(&step) {
            return Err(StepforgeError::Other(anyhow::anyhow!(
                "options of step '{}' were already finalized",
                step
            )));
        }
        let options = Arc::new(options);
        self.finalized.insert(step, Arc::clone(&options));
        Ok(options)
    }

    pub fn len(&self) -> usize {
        self.finalized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finalized.is_empty()
    }
}
