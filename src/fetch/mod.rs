//! Source retrieval: download an archive and unpack it.

pub mod archive;
pub mod http;
pub mod mock;

pub use archive::{extract, ArchiveFormat, MemberFilter};
pub use http::{url_file_name, Fetcher, HttpFetcher};
pub use mock::RecordingFetcher;

use std::path::{Path, PathBuf};

use crate::error::{Result, StepforgeError};

/// Download `url` into `download_dir` and unpack it into `unpack_dir`.
///
/// Returns the path of the downloaded archive.
pub fn fetch_and_unpack(
    fetcher: &dyn Fetcher,
    url: &str,
    download_dir: &Path,
    unpack_dir: &Path,
    filter: &MemberFilter,
) -> Result<PathBuf> {
    let name = url_file_name(url).ok_or_else(|| StepforgeError::FetchError {
        url: url.to_string(),
        message: "URL has no file name".to_string(),
    })?;
    let archive = download_dir.join(name);
    fetcher.download(url, &archive)?;
    extract(&archive, unpack_dir, filter)?;
    Ok(archive)
}
