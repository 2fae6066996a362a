//! Fetcher serving prepared local files, for tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::http::Fetcher;
use crate::error::{Result, StepforgeError};

/// Serves registered URLs from local files and records every request.
#[derive(Debug, Default)]
pub struct RecordingFetcher {
    served: HashMap<String, PathBuf>,
    requests: RefCell<Vec<String>>,
}

impl RecordingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests for `url` with the contents of `file`.
    pub fn serve(mut self, url: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        self.served.insert(url.into(), file.into());
        self
    }

    /// Requested URLs in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Fetcher for RecordingFetcher {
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.requests.borrow_mut().push(url.to_string());
        let source = self
            .served
            .get(url)
            .ok_or_else(|| StepforgeError::FetchError {
                url: url.to_string(),
                message: "HTTP 404 Not Found".to_string(),
            })?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, dest)?;
        Ok(())
    }
}
