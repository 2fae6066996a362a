//! Post-fetch hooks.
//!
//! Hooks run in order on a freshly unpacked source tree. A patch whose
//! target file does not look the way the patch expects is skipped with
//! a warning rather than failing the step.

use std::fs;
use std::path::Path;

use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::kind::StepContext;
use super::step::{expand, expand_all, Step};
use crate::config::{PatchEdit, PostFetchHook};
use crate::error::{Result, StepforgeError};
use crate::options::{absolutize, ResolvedOptions};

/// What a hook did.
#[derive(Debug)]
pub enum PatchOutcome {
    /// The file was rewritten.
    Applied,
    /// The edits left the file as it was.
    Unchanged,
    /// The file did not match expectations; nothing was written.
    Skipped(StepforgeError),
    /// A hook command ran.
    Ran,
}

impl PatchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, PatchOutcome::Applied)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, PatchOutcome::Skipped(_))
    }
}

/// Run the step's post-fetch hooks against `source_dir`.
///
/// # Errors
///
/// Fails on invalid edit patterns, IO errors, or a failing hook command.
/// Patches that decline to apply are reported as
/// [`PatchOutcome::Skipped`], not as errors.
pub fn run_hooks(
    step: &Step,
    options: &ResolvedOptions,
    ctx: &StepContext<'_>,
    source_dir: &Path,
) -> Result<Vec<PatchOutcome>> {
    let mut outcomes = Vec::new();

    for hook in &step.config().post_fetch {
        let outcome = match hook {
            PostFetchHook::Patch {
                file,
                expect_sha256,
                edits,
            } => {
                let file = expand(file, options, ctx.resolve, "post_fetch.file")?;
                let path = absolutize(&file, source_dir);
                let outcome = apply_patch(&path, expect_sha256.as_deref(), edits)?;
                match &outcome {
                    PatchOutcome::Skipped(reason) => warn!("'{}': {}", step.id(), reason),
                    PatchOutcome::Applied => info!("Patched {}", path.display()),
                    _ => debug!("{} already patched", path.display()),
                }
                outcome
            }
            PostFetchHook::Command { argv, directory } => {
                let argv = expand_all(argv, options, ctx.resolve, "post_fetch.argv")?;
                let directory = match directory {
                    Some(dir) => {
                        let dir = expand(dir, options, ctx.resolve, "post_fetch.directory")?;
                        absolutize(&dir, source_dir)
                    }
                    None => source_dir.to_path_buf(),
                };
                ctx.runner.invoke(&directory, &argv)?;
                PatchOutcome::Ran
            }
        };
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

/// Apply `edits` to the file at `path`.
///
/// With `expect_sha256`, the file is only touched when its current
/// SHA-256 matches. All edits are applied in memory before anything is
/// written, so a skipped patch leaves the file untouched.
pub fn apply_patch(
    path: &Path,
    expect_sha256: Option<&str>,
    edits: &[PatchEdit],
) -> Result<PatchOutcome> {
    let skipped = |message: String| {
        Ok(PatchOutcome::Skipped(StepforgeError::PatchError {
            path: path.to_path_buf(),
            message,
        }))
    };

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return skipped("file not found".to_string());
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(expected) = expect_sha256 {
        let actual = hex::encode(Sha256::digest(&bytes).as_slice());
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return skipped(format!(
                "unexpected content (sha256 {}, expected {})",
                actual, expected
            ));
        }
    }

    let original = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => return skipped("file is not valid UTF-8".to_string()),
    };
    let mut document = Document::parse(&original);
    for edit in edits {
        if let Err(message) = document.apply(edit, path)? {
            return skipped(message);
        }
    }

    let patched = document.render();
    if patched == original {
        return Ok(PatchOutcome::Unchanged);
    }
    fs::write(path, patched)?;
    Ok(PatchOutcome::Applied)
}

/// A text file as a list of lines.
struct Document {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl Document {
    fn parse(text: &str) -> Self {
        let trailing_newline = text.ends_with('\n');
        let body = text.strip_suffix('\n').unwrap_or(text);
        let lines = if text.is_empty() {
            Vec::new()
        } else {
            body.split('\n').map(String::from).collect()
        };
        Self {
            lines,
            trailing_newline,
        }
    }

    fn render(&self) -> String {
        let mut text = self.lines.join("\n");
        if self.trailing_newline {
            text.push('\n');
        }
        text
    }

    /// Apply one edit. The inner `Err` is a reason to skip the patch.
    fn apply(
        &mut self,
        edit: &PatchEdit,
        path: &Path,
    ) -> Result<std::result::Result<(), String>> {
        match edit {
            PatchEdit::Replace { from, to } => {
                let text = self.render().replace(from.as_str(), to);
                *self = Document::parse(&text);
            }
            PatchEdit::InsertAfter { pattern, line } => {
                let regex = compile(pattern, path)?;
                match self.lines.iter().position(|l| regex.is_match(l)) {
                    Some(index) => self.lines.insert(index + 1, line.clone()),
                    None => return Ok(Err(format!("no line matches '{}'", pattern))),
                }
            }
            PatchEdit::InsertBeforeEnd {
                line,
                offset,
                unless,
            } => {
                if let Some(unless) = unless {
                    let regex = compile(unless, path)?;
                    if self.lines.iter().any(|l| regex.is_match(l)) {
                        return Ok(Ok(()));
                    }
                }
                let index = self.lines.len().saturating_sub(*offset);
                self.lines.insert(index, line.clone());
            }
            PatchEdit::DeleteMatching { pattern } => {
                let regex = compile(pattern, path)?;
                self.lines.retain(|l| !regex.is_match(l));
            }
        }
        Ok(Ok(()))
    }
}

fn compile(pattern: &str, path: &Path) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| StepforgeError::ConfigValidationError {
        message: format!(
            "invalid patch pattern '{}' for {}: {}",
            pattern,
            path.display(),
            e
        ),
    })
}

/// SHA-256 of a file, hex encoded.
pub fn file_sha256(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&bytes).as_slice()))
}
