//! Locating and loading the project a command operates on.

use std::path::{Path, PathBuf};

use crate::config::{find_project_root, load_config};
use crate::error::Result;
use crate::options::OptionOverride;
use crate::platform::Platform;
use crate::runner::Engine;

/// Project root plus an optional alternate config file.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config_path: Option<PathBuf>,
}

impl Project {
    pub fn new(root: PathBuf, config_path: Option<PathBuf>) -> Self {
        Self { root, config_path }
    }

    /// Project root for `explicit` (`--project`, taken relative to `cwd`),
    /// else the nearest ancestor of `cwd` with a `.stepforge/` directory,
    /// else `cwd`.
    pub fn discover_root(explicit: Option<&Path>, cwd: &Path) -> PathBuf {
        match explicit {
            Some(path) => cwd.join(path),
            None => find_project_root(cwd).unwrap_or_else(|| cwd.to_path_buf()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the configuration and build an engine for this platform.
    pub fn load(&self, overrides: &[OptionOverride]) -> Result<Engine> {
        let config = load_config(&self.root, self.config_path.as_deref())?;
        Engine::new(config, self.root.clone(), Platform::current(), overrides)
    }
}
