//! Configuration loading, parsing, and validation for stepforge.
//!
//! This module handles all aspects of configuration:
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Deep merging in [`merger`]
//! - Validation in [`validator`]
//! - Placeholder templating in [`interpolation`]
//!
//! # Example
//!
//! ```
//! use stepforge::config::{load_merged_config, validate};
//! use stepforge::platform::Platform;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".stepforge");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(dir.join("config.yml"), "steps:\n  hello:\n    options: {argv: [echo, hi]}").unwrap();
//!
//! let config = load_merged_config(temp.path()).unwrap();
//! validate(&config, Platform::current()).unwrap();
//! assert!(config.steps.contains_key("hello"));
//! ```
//!
//! # Configuration File Locations
//!
//! 1. Project config (`.stepforge/config.yml`, required)
//! 2. Local overrides (`.stepforge/config.local.yml`, merged on top)

pub mod interpolation;
pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use schema::{
    PatchEdit, PostFetchHook, Settings, SkipCheck, StepConfig, StepKind, StepPlatformOverride,
    StepforgeConfig, ToolchainConfig,
};

pub use loader::{
    find_project_root, load_config, load_config_file, load_config_value, load_merged_config,
    parse_config, project_config_path, ConfigPaths, CONFIG_DIR,
};

pub use merger::{deep_merge, merge_configs};

pub use validator::{validate, validate_config, ValidationError};

pub use interpolation::{extract_placeholders, has_placeholders, parse_placeholders, render, Segment};
