//! Configuration file discovery and loading.

use crate::config::merger::merge_configs;
use crate::config::schema::StepforgeConfig;
use crate::error::{Result, StepforgeError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-project configuration directory.
pub const CONFIG_DIR: &str = ".stepforge";

/// Paths to configuration files in merge order (later overrides earlier).
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project config: .stepforge/config.yml
    pub project: Option<PathBuf>,

    /// Local overrides: .stepforge/config.local.yml
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self {
            project: existing(project_config_path(project_root)),
            project_local: existing(project_root.join(CONFIG_DIR).join("config.local.yml")),
        }
    }

    /// Returns all existing config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        self.project.iter().chain(self.project_local.iter()).collect()
    }

    pub fn has_project_config(&self) -> bool {
        self.project.is_some()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.exists().then_some(path)
}

/// Location of the required project config.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join("config.yml")
}

/// Find the project root by walking up from `start`.
///
/// The first directory containing `.stepforge/` wins.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_DIR).is_dir())
        .map(Path::to_path_buf)
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StepforgeError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            StepforgeError::Io(e)
        }
    })
}

/// Load a single config file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist and
/// `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<StepforgeConfig> {
    let content = read_config(path)?;
    parse_config(&content, path)
}

/// Parse YAML content into a [`StepforgeConfig`].
///
/// `source_path` is used for error reporting only.
pub fn parse_config(content: &str, source_path: &Path) -> Result<StepforgeConfig> {
    if content.trim().is_empty() {
        return Ok(StepforgeConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| StepforgeError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a config file as a raw YAML value, for merging.
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = read_config(path)?;
    serde_yaml::from_str(&content).map_err(|e| StepforgeError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load the project config with local overrides merged on top.
///
/// # Errors
///
/// Returns `ConfigNotFound` if `.stepforge/config.yml` is missing.
pub fn load_merged_config(project_root: &Path) -> Result<StepforgeConfig> {
    let paths = ConfigPaths::discover(project_root);
    if !paths.has_project_config() {
        return Err(StepforgeError::ConfigNotFound {
            path: project_config_path(project_root),
        });
    }

    let mut documents = Vec::new();
    for path in paths.all_existing() {
        debug!("Loading config {}", path.display());
        documents.push(load_config_value(path)?);
    }

    let merged = merge_configs(&documents);
    serde_yaml::from_value(merged).map_err(|e| StepforgeError::ConfigParseError {
        path: project_config_path(project_root),
        message: format!("Failed to parse merged config: {}", e),
    })
}

/// Load config with optional path override.
///
/// With `config_override` only that file is loaded, without merging.
pub fn load_config(project_root: &Path, config_override: Option<&Path>) -> Result<StepforgeConfig> {
    match config_override {
        Some(path) => load_config_file(path),
        None => load_merged_config(project_root),
    }
}
