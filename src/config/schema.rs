//! Configuration schema definitions for stepforge.
//!
//! This module contains all the struct definitions that map to
//! the YAML configuration file format.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::options::{OptionRef, OptionValue};
use crate::platform::Platform;

/// Root configuration structure for `.stepforge/config.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepforgeConfig {
    /// Global settings
    pub settings: Settings,

    /// Step definitions
    #[serde(default)]
    pub steps: HashMap<String, StepConfig>,
}

/// Global settings that apply to every step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base directory for fetched sources, relative to the project root
    #[serde(default = "default_work_dir")]
    pub work_dir: String,

    /// Root step used when no root is given on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_root: Option<String>,

    /// Toolchain activation wrapper for external commands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<ToolchainConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            default_root: None,
            toolchain: None,
        }
    }
}

fn default_work_dir() -> String {
    "build".to_string()
}

fn is_false(v: &bool) -> bool {
    !v
}

/// Command prefix that sets up a compiler environment.
///
/// ```yaml
/// toolchain:
///   activate: ["cmd", "/c", "vcvarsall.bat", "amd64", "&&"]
///   platforms: [windows]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Arguments placed before every command
    pub activate: Vec<String>,

    /// Platforms the prefix applies to (empty = all)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<Platform>,
}

/// What a step does when it runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Download and unpack a source archive
    Fetch,
    /// Configure, compile and install a CMake project
    Cmake,
    /// Run an arbitrary command
    #[default]
    Command,
    /// Write a text file
    WriteFile,
    /// Copy files into a directory
    Copy,
    /// Group of child steps with no action of its own
    Composite,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Fetch => "fetch",
            StepKind::Cmake => "cmake",
            StepKind::Command => "command",
            StepKind::WriteFile => "write_file",
            StepKind::Copy => "copy",
            StepKind::Composite => "composite",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for a single step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Step kind
    pub kind: StepKind,

    /// Step description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Steps that must run before this one, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Child steps of a composite, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,

    /// Explicit option values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, OptionValue>,

    /// Static defaults, used when neither a value nor a reference applies
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, OptionValue>,

    /// Options inherited from other steps (`option: step.option`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub refs: BTreeMap<String, OptionRef>,

    /// Extra option names that must be set before the step runs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Option naming the step's output location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// When the step is already satisfied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_if: Option<SkipCheck>,

    /// Restrict this step to specific platforms.
    /// Empty list (default) means "all platforms".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<Platform>,

    /// Per-platform overrides for this step
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub platform_overrides: HashMap<Platform, StepPlatformOverride>,

    /// Hooks run after a fetch step unpacks its archive
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_fetch: Vec<PostFetchHook>,
}

impl StepConfig {
    /// Apply the override for `platform`, if one is declared.
    pub fn for_platform(&self, platform: Platform) -> StepConfig {
        let mut resolved = self.clone();
        if let Some(ov) = self.platform_overrides.get(&platform) {
            ov.apply_to(&mut resolved);
        }
        resolved.platform_overrides.clear();
        resolved
    }
}

/// Partial step definition merged over the base on one platform.
///
/// A `null` value in one of the option maps removes the key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepPlatformOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Option<OptionValue>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, Option<OptionValue>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub refs: BTreeMap<String, Option<OptionRef>>,

    /// Replaces the dependency list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Vec<String>>,

    /// Replaces the child list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_if: Option<SkipCheck>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Replaces the hook list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_fetch: Option<Vec<PostFetchHook>>,

    /// Drop the base `required` list
    #[serde(default, skip_serializing_if = "is_false")]
    pub clear_required: bool,
}

impl StepPlatformOverride {
    fn apply_to(&self, step: &mut StepConfig) {
        if let Some(desc) = &self.description {
            step.description = Some(desc.clone());
        }
        merge_nullable(&mut step.options, &self.options);
        merge_nullable(&mut step.defaults, &self.defaults);
        merge_nullable(&mut step.refs, &self.refs);
        if let Some(deps) = &self.depends_on {
            step.depends_on = deps.clone();
        }
        if let Some(children) = &self.steps {
            step.steps = children.clone();
        }
        if let Some(check) = &self.skip_if {
            step.skip_if = Some(check.clone());
        }
        if let Some(output) = &self.output {
            step.output = Some(output.clone());
        }
        if let Some(hooks) = &self.post_fetch {
            step.post_fetch = hooks.clone();
        }
        if self.clear_required {
            step.required.clear();
        }
    }
}

fn merge_nullable<V: Clone>(base: &mut BTreeMap<String, V>, overlay: &BTreeMap<String, Option<V>>) {
    for (key, value) in overlay {
        match value {
            Some(v) => {
                base.insert(key.clone(), v.clone());
            }
            None => {
                base.remove(key);
            }
        }
    }
}

/// Predicate deciding whether a step is already satisfied.
///
/// A satisfied step is recorded in the plan but not executed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SkipCheck {
    /// The step's output location exists
    #[default]
    OutputExists,

    /// A path exists (templated with the step's options)
    PathExists {
        /// Path to check (relative to project root)
        path: String,
    },

    /// A command exits with status 0
    CommandSucceeds {
        argv: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        directory: Option<String>,
    },

    /// Never satisfied; the step always runs
    Never,

    /// Always satisfied; the step never runs
    Always,

    /// All checks must pass
    All { checks: Vec<SkipCheck> },

    /// Any check passing is sufficient
    Any { checks: Vec<SkipCheck> },

    /// Inverts a check
    Not { check: Box<SkipCheck> },
}

/// Work done on freshly unpacked sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PostFetchHook {
    /// Edit a file in the source tree
    Patch {
        /// File path relative to `source_dir`
        file: String,

        /// Apply only when the file's SHA-256 matches
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expect_sha256: Option<String>,

        edits: Vec<PatchEdit>,
    },

    /// Run a command (in `source_dir` unless `directory` is given)
    Command {
        argv: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        directory: Option<String>,
    },
}

/// A single line-oriented edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PatchEdit {
    /// Replace every occurrence of `from` with `to`
    Replace { from: String, to: String },

    /// Insert `line` after the first line matching `pattern`
    InsertAfter { pattern: String, line: String },

    /// Insert `line` `offset` lines before the end of the file,
    /// unless some line already matches `unless`
    InsertBeforeEnd {
        line: String,
        #[serde(default)]
        offset: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unless: Option<String>,
    },

    /// Remove every line matching `pattern`
    DeleteMatching { pattern: String },
}

impl PatchEdit {
    /// The regular expression this edit matches lines against, if any.
    pub fn regex(&self) -> Option<&str> {
        match self {
            PatchEdit::InsertAfter { pattern, .. } | PatchEdit::DeleteMatching { pattern } => {
                Some(pattern.as_str())
            }
            PatchEdit::InsertBeforeEnd { unless, .. } => unless.as_deref(),
            PatchEdit::Replace { .. } => None,
        }
    }
}
