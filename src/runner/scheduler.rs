//! Sequential, fail-fast plan execution.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::plan::{Plan, PlanEntry};
use crate::error::{Result, StepforgeError};
use crate::options::StepId;
use crate::steps::{StepContext, StepRegistry};

/// Progress events emitted during execution.
#[derive(Debug)]
pub enum RunProgress<'a> {
    /// A step is about to run.
    StepStarting {
        name: &'a str,
        index: usize,
        total: usize,
    },
    /// A step finished successfully.
    StepFinished { name: &'a str, duration: Duration },
    /// A step was already satisfied.
    StepSatisfied { name: &'a str, reason: &'a str },
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Steps that ran, in order.
    pub executed: Vec<StepId>,
    /// Steps skipped because they were already satisfied.
    pub satisfied: Vec<StepId>,
    pub duration: Duration,
}

/// Execute `plan` in order.
pub fn execute(plan: &Plan, registry: &StepRegistry, ctx: &StepContext<'_>) -> Result<RunReport> {
    execute_with_progress(plan, registry, ctx, |_| {})
}

/// Execute `plan` in order, reporting progress.
///
/// # Errors
///
/// The first failing step stops the run; its error is wrapped in
/// `StepFailed` and no later step is attempted.
pub fn execute_with_progress(
    plan: &Plan,
    registry: &StepRegistry,
    ctx: &StepContext<'_>,
    mut on_progress: impl FnMut(RunProgress<'_>),
) -> Result<RunReport> {
    let start = Instant::now();
    let total = plan.run_count();
    let mut report = RunReport::default();
    let mut index = 0;

    for entry in plan.entries() {
        let name = entry.step().as_str();
        let options = match entry {
            PlanEntry::Satisfied { reason, .. } => {
                on_progress(RunProgress::StepSatisfied { name, reason });
                report.satisfied.push(entry.step().clone());
                continue;
            }
            PlanEntry::Run { options, .. } => options,
        };

        let step = registry.get(name).ok_or_else(|| StepforgeError::UnknownStep {
            name: name.to_string(),
            referenced_by: plan.root().to_string(),
        })?;

        index += 1;
        on_progress(RunProgress::StepStarting { name, index, total });
        let step_start = Instant::now();

        if let Err(e) = step.action().run(step, options, ctx) {
            warn!("Step '{}' failed: {}", name, e);
            return Err(StepforgeError::StepFailed {
                step: name.to_string(),
                source: Box::new(e),
            });
        }

        let duration = step_start.elapsed();
        info!("Step '{}' finished in {:?}", name, duration);
        on_progress(RunProgress::StepFinished { name, duration });
        report.executed.push(entry.step().clone());
    }

    report.duration = start.elapsed();
    Ok(report)
}
