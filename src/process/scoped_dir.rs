//! Scoped change of the process working directory.

use std::env;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

/// Changes the working directory on creation and changes it back when
/// dropped, on every exit path including early returns and panics.
///
/// Guards nest: inner guards restore to the directory the outer guard
/// entered, which the outer guard later restores in turn.
#[derive(Debug)]
#[must_use = "the previous directory is restored when the guard is dropped"]
pub struct ScopedDir {
    previous: PathBuf,
    current: PathBuf,
}

impl ScopedDir {
    /// Enter `directory`, remembering the current one.
    ///
    /// # Errors
    ///
    /// Fails if the current directory cannot be read or `directory`
    /// cannot be entered; the working directory is unchanged then.
    pub fn enter(directory: &Path) -> Result<Self> {
        let previous = env::current_dir()?;
        env::set_current_dir(directory)?;
        debug!("Entered {}", directory.display());
        Ok(Self {
            previous,
            current: directory.to_path_buf(),
        })
    }

    /// Directory that will be restored.
    pub fn previous(&self) -> &Path {
        &self.previous
    }

    /// Directory this guard entered.
    pub fn current(&self) -> &Path {
        &self.current
    }
}

impl Drop for ScopedDir {
    fn drop(&mut self) {
        if let Err(e) = env::set_current_dir(&self.previous) {
            warn!(
                "Failed to restore working directory {}: {}",
                self.previous.display(),
                e
            );
        } else {
            debug!("Restored {}", self.previous.display());
        }
    }
}
