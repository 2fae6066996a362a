//! Skip predicate evaluation.
//!
//! A satisfied step is recorded in the plan but not executed, which is
//! what makes re-running a whole plan idempotent.

use std::path::Path;

use super::step::{expand, expand_all, Step};
use crate::config::SkipCheck;
use crate::error::Result;
use crate::options::{absolutize, ResolveContext, ResolvedOptions};
use crate::process::{display_command, ProcessRunner};

/// Result of evaluating a skip predicate.
///
/// `description` is user-visible: it appears in plan listings as the
/// reason a step is satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Whether prior state already satisfies the step.
    pub satisfied: bool,

    pub description: String,
}

impl CheckResult {
    pub fn satisfied(description: impl Into<String>) -> Self {
        Self {
            satisfied: true,
            description: description.into(),
        }
    }

    pub fn pending(description: impl Into<String>) -> Self {
        Self {
            satisfied: false,
            description: description.into(),
        }
    }
}

/// Inputs a predicate may read.
pub struct CheckContext<'a> {
    pub step: &'a Step,
    pub options: &'a ResolvedOptions,
    pub resolve: &'a ResolveContext,
    pub runner: &'a dyn ProcessRunner,
}

/// Evaluate `check` for a step.
///
/// # Errors
///
/// Fails only when a templated path or argument names an unknown
/// placeholder.
pub fn evaluate(check: &SkipCheck, ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let root = ctx.resolve.project_root.as_path();
    match check {
        SkipCheck::OutputExists => Ok(output_exists(ctx, root)),
        SkipCheck::PathExists { path } => {
            let path = expand(path, ctx.options, ctx.resolve, "skip_if.path")?;
            Ok(path_exists(&path, root))
        }
        SkipCheck::CommandSucceeds { argv, directory } => {
            let argv = expand_all(argv, ctx.options, ctx.resolve, "skip_if.argv")?;
            let directory = match directory {
                Some(dir) => {
                    absolutize(expand(dir, ctx.options, ctx.resolve, "skip_if.directory")?, root)
                }
                None => root.to_path_buf(),
            };
            let command = display_command(&argv);
            if !argv.is_empty() && ctx.runner.succeeds(&directory, &argv) {
                Ok(CheckResult::satisfied(format!("Command succeeded: {}", command)))
            } else {
                Ok(CheckResult::pending(format!("Command failed: {}", command)))
            }
        }
        SkipCheck::Never => Ok(CheckResult::pending("Always runs")),
        SkipCheck::Always => Ok(CheckResult::satisfied("Marked as satisfied")),
        SkipCheck::All { checks } => {
            let results = checks
                .iter()
                .map(|c| evaluate(c, ctx))
                .collect::<Result<Vec<_>>>()?;
            if results.iter().all(|r| r.satisfied) {
                Ok(CheckResult::satisfied(format!(
                    "All {} checks passed",
                    checks.len()
                )))
            } else {
                let failed: Vec<_> = results
                    .iter()
                    .filter(|r| !r.satisfied)
                    .map(|r| r.description.as_str())
                    .collect();
                Ok(CheckResult::pending(failed.join("; ")))
            }
        }
        SkipCheck::Any { checks } => {
            let mut descriptions = Vec::new();
            for check in checks {
                let result = evaluate(check, ctx)?;
                if result.satisfied {
                    return Ok(result);
                }
                descriptions.push(result.description);
            }
            Ok(CheckResult::pending(descriptions.join("; ")))
        }
        SkipCheck::Not { check } => {
            let inner = evaluate(check, ctx)?;
            let description = format!("not ({})", inner.description);
            Ok(CheckResult {
                satisfied: !inner.satisfied,
                description,
            })
        }
    }
}

fn output_exists(ctx: &CheckContext<'_>, root: &Path) -> CheckResult {
    match ctx.step.output_path(ctx.options, root) {
        Some(path) if path.exists() => {
            CheckResult::satisfied(format!("Output exists: {}", path.display()))
        }
        Some(path) => CheckResult::pending(format!("Output missing: {}", path.display())),
        None => CheckResult::pending("No output location"),
    }
}

fn path_exists(path: &str, root: &Path) -> CheckResult {
    let full = absolutize(path, root);
    if full.exists() {
        CheckResult::satisfied(format!("File exists: {}", path))
    } else {
        CheckResult::pending(format!("File missing: {}", path))
    }
}
