//! Archive extraction with a member filter.
//!
//! Supports:
//! - `.tar.gz` / `.tgz`
//! - `.tar`
//! - `.zip`
//!
//! Members keep their full path inside the archive; a tarball whose
//! entries start with `zlib-1.2.5/` unpacks to `<dest>/zlib-1.2.5/...`.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{debug, info};

use crate::error::{Result, StepforgeError};

/// Archive container format, from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    TarGz,
    Zip,
}

impl ArchiveFormat {
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else if name.ends_with(".tar") {
            Some(ArchiveFormat::Tar)
        } else if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else {
            None
        }
    }
}

/// Decides which archive members are extracted.
#[derive(Debug, Clone, Default)]
pub struct MemberFilter {
    exclude_suffixes: Vec<String>,
}

impl MemberFilter {
    /// Exclude members whose name ends with any of `suffixes`,
    /// ignoring case.
    pub fn excluding<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            exclude_suffixes: suffixes
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn admits(&self, member: &str) -> bool {
        let lower = member.to_lowercase();
        !self
            .exclude_suffixes
            .iter()
            .any(|suffix| lower.ends_with(suffix.as_str()))
    }
}

/// Unpack `archive` into `dest`, skipping members the filter rejects.
///
/// Returns the number of members written.
///
/// # Errors
///
/// Returns `FetchError` for unknown formats and unreadable archives.
pub fn extract(archive: &Path, dest: &Path, filter: &MemberFilter) -> Result<usize> {
    let format = ArchiveFormat::detect(archive).ok_or_else(|| StepforgeError::FetchError {
        url: archive.display().to_string(),
        message: "unsupported archive format".to_string(),
    })?;

    fs::create_dir_all(dest)?;
    let extracted = match format {
        ArchiveFormat::TarGz => {
            let file = File::open(archive)?;
            unpack_tar(GzDecoder::new(BufReader::new(file)), dest, filter)
        }
        ArchiveFormat::Tar => unpack_tar(BufReader::new(File::open(archive)?), dest, filter),
        ArchiveFormat::Zip => unpack_zip(archive, dest, filter),
    }
    .map_err(|message| StepforgeError::FetchError {
        url: archive.display().to_string(),
        message,
    })?;

    info!(
        "Unpacked {} member(s) of {} to {}",
        extracted,
        archive.display(),
        dest.display()
    );
    Ok(extracted)
}

fn unpack_tar<R: Read>(reader: R, dest: &Path, filter: &MemberFilter) -> std::result::Result<usize, String> {
    let mut archive = Archive::new(reader);
    let mut count = 0;

    let entries = archive.entries().map_err(|e| e.to_string())?;
    for entry in entries {
        let mut entry = entry.map_err(|e| e.to_string())?;
        let name = entry
            .path()
            .map_err(|e| e.to_string())?
            .to_string_lossy()
            .into_owned();

        if !filter.admits(&name) {
            debug!("Skipping {}", name);
            continue;
        }
        if entry.unpack_in(dest).map_err(|e| format!("{}: {}", name, e))? {
            count += 1;
        }
    }

    Ok(count)
}

fn unpack_zip(archive: &Path, dest: &Path, filter: &MemberFilter) -> std::result::Result<usize, String> {
    let file = File::open(archive).map_err(|e| e.to_string())?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| format!("failed to open zip: {}", e))?;
    let mut count = 0;

    for i in 0..zip.len() {
        let mut member = zip
            .by_index(i)
            .map_err(|e| format!("failed to read zip entry: {}", e))?;
        let name = member.name().to_string();

        if !filter.admits(&name) {
            debug!("Skipping {}", name);
            continue;
        }
        let Some(relative) = member.enclosed_name() else {
            debug!("Skipping unsafe member {}", name);
            continue;
        };
        let target = dest.join(relative);

        if member.is_dir() {
            fs::create_dir_all(&target).map_err(|e| e.to_string())?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
            let mut out = File::create(&target).map_err(|e| e.to_string())?;
            std::io::copy(&mut member, &mut out).map_err(|e| format!("{}: {}", name, e))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = member.unix_mode() {
                    fs::set_permissions(&target, fs::Permissions::from_mode(mode))
                        .map_err(|e| e.to_string())?;
                }
            }
        }
        count += 1;
    }

    Ok(count)
}
