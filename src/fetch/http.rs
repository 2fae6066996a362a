//! URL download.

use std::fs::{self, File};
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use tracing::{debug, info};

use crate::error::{Result, StepforgeError};

/// Downloads a URL to a local file.
pub trait Fetcher {
    /// Download `url` to `dest`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` when the resource cannot be retrieved.
    fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Default timeout for archive downloads.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Fetches over HTTP(S), and copies `file://` URLs and plain paths.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("stepforge/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self { client })
    }

    fn fetch_http(&self, url: &str, dest: &Path) -> anyhow::Result<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("request failed for {}", url))?;

        if !response.status().is_success() {
            bail!("HTTP {}", response.status());
        }

        let mut file =
            File::create(dest).with_context(|| format!("cannot create {}", dest.display()))?;
        let bytes = response
            .copy_to(&mut file)
            .with_context(|| format!("failed to read body of {}", url))?;
        Ok(bytes)
    }

    fn fetch_local(source: &Path, dest: &Path) -> anyhow::Result<u64> {
        fs::copy(source, dest).with_context(|| format!("cannot copy {}", source.display()))
    }
}

impl Fetcher for HttpFetcher {
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        info!("Fetching {}", url);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let result = match url.split_once("://") {
            Some(("http" | "https", _)) => self.fetch_http(url, dest),
            Some(("file", path)) => Self::fetch_local(Path::new(path), dest),
            Some((scheme, _)) => Err(anyhow::anyhow!("unsupported scheme '{}'", scheme)),
            None => Self::fetch_local(Path::new(url), dest),
        };

        match result {
            Ok(bytes) => {
                debug!("Wrote {} bytes to {}", bytes, dest.display());
                Ok(())
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(dest) {
                    debug!("Could not remove partial download {}: {}", dest.display(), cleanup);
                }
                Err(StepforgeError::FetchError {
                    url: url.to_string(),
                    message: format!("{:#}", e),
                })
            }
        }
    }
}

/// File name component of a URL, used to name the downloaded archive.
pub fn url_file_name(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn url_file_name_takes_last_segment() {
        assert_eq!(
            url_file_name("https://github.com/madler/zlib/archive/v1.2.5.tar.gz"),
            Some("v1.2.5.tar.gz")
        );
        assert_eq!(url_file_name("http://host/a/b.zip?raw=1"), Some("b.zip"));
        assert_eq!(url_file_name("http://host/dir/"), None);
    }

    #[test]
    fn copies_local_paths() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src.tar");
        fs::write(&source, "archive").unwrap();
        let dest = temp.path().join("dl").join("copy.tar");

        let fetcher = HttpFetcher::new().unwrap();
        fetcher.download(source.to_str().unwrap(), &dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "archive");

        let file_url = format!("file://{}", source.display());
        fetcher.download(&file_url, &dest).unwrap();
        assert!(dest.is_file());
    }

    #[test]
    fn missing_local_file_is_fetch_error() {
        let temp = TempDir::new().unwrap();
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .download("/definitely/not/here.tar.gz", &temp.path().join("x.tar.gz"))
            .unwrap_err();
        assert!(matches!(err, StepforgeError::FetchError { .. }));
    }

    #[test]
    fn unsupported_scheme_is_fetch_error() {
        let temp = TempDir::new().unwrap();
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .download("ftp://example.com/x.tar.gz", &temp.path().join("x.tar.gz"))
            .unwrap_err();
        match err {
            StepforgeError::FetchError { url, message } => {
                assert_eq!(url, "ftp://example.com/x.tar.gz");
                assert!(message.contains("ftp"));
            }
            other => panic!("expected fetch error, got {:?}", other),
        }
    }
}
