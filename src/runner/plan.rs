//! Run plan construction.
//!
//! The plan is built depth-first from a root step: declared
//! dependencies first, in order, then composite children, then the step
//! itself. A step whose skip predicate is satisfied is recorded but not
//! expanded further, and no step appears twice.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Result, StepforgeError};
use crate::options::{OptionResolver, ResolvedOptions, StepId};
use crate::process::ProcessRunner;
use crate::steps::{evaluate, CheckContext};

/// One step in a run plan.
#[derive(Debug, Clone)]
pub enum PlanEntry {
    /// The step will be executed.
    Run {
        step: StepId,
        options: Arc<ResolvedOptions>,
    },
    /// Prior state already satisfies the step.
    Satisfied {
        step: StepId,
        options: Arc<ResolvedOptions>,
        reason: String,
    },
}

impl PlanEntry {
    pub fn step(&self) -> &StepId {
        match self {
            PlanEntry::Run { step, .. } | PlanEntry::Satisfied { step, .. } => step,
        }
    }

    pub fn options(&self) -> &Arc<ResolvedOptions> {
        match self {
            PlanEntry::Run { options, .. } | PlanEntry::Satisfied { options, .. } => options,
        }
    }

    pub fn will_run(&self) -> bool {
        matches!(self, PlanEntry::Run { .. })
    }
}

/// Ordered, duplicate-free steps selected for one invocation.
#[derive(Debug, Clone)]
pub struct Plan {
    root: StepId,
    entries: Vec<PlanEntry>,
}

impl Plan {
    pub fn root(&self) -> &StepId {
        &self.root
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries that will execute.
    pub fn run_count(&self) -> usize {
        self.entries.iter().filter(|e| e.will_run()).count()
    }

    /// Position of `step` in the plan.
    pub fn position(&self, step: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.step() == step)
    }

    /// Step names in plan order.
    pub fn step_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.step().as_str()).collect()
    }
}

/// Build the run plan for `root`.
///
/// Options of every visited step are resolved here, so configuration
/// errors surface before anything runs. Skip predicates are evaluated
/// once, at plan time.
///
/// # Errors
///
/// `UnknownStep`, `CircularDependency`, or any option resolution error.
pub fn build_plan(
    resolver: &mut OptionResolver<'_>,
    runner: &dyn ProcessRunner,
    root: &str,
) -> Result<Plan> {
    let registry = resolver.registry();
    if registry.is_excluded(root) {
        return Err(StepforgeError::ConfigValidationError {
            message: format!(
                "step '{}' does not apply on {}",
                root,
                registry.platform()
            ),
        });
    }

    let mut planner = Planner {
        resolver,
        runner,
        entries: Vec::new(),
        placed: HashSet::new(),
        in_progress: Vec::new(),
    };
    planner.visit(root, None)?;

    let plan = Plan {
        root: StepId::new(root),
        entries: planner.entries,
    };
    info!(
        "Plan for '{}': {} step(s), {} to run",
        root,
        plan.len(),
        plan.run_count()
    );
    Ok(plan)
}

struct Planner<'r, 'a> {
    resolver: &'r mut OptionResolver<'a>,
    runner: &'r dyn ProcessRunner,
    entries: Vec<PlanEntry>,
    placed: HashSet<String>,
    in_progress: Vec<String>,
}

impl Planner<'_, '_> {
    fn visit(&mut self, name: &str, parent: Option<&str>) -> Result<()> {
        if self.placed.contains(name) {
            return Ok(());
        }
        if let Some(pos) = self.in_progress.iter().position(|n| n == name) {
            let mut cycle = self.in_progress[pos..].to_vec();
            cycle.push(name.to_string());
            return Err(StepforgeError::CircularDependency {
                cycle: cycle.join(" -> "),
            });
        }

        let registry = self.resolver.registry();
        let step = registry
            .get(name)
            .ok_or_else(|| StepforgeError::UnknownStep {
                name: name.to_string(),
                referenced_by: parent.unwrap_or("command line").to_string(),
            })?;
        let options = self.resolver.resolve(name)?;

        let check = evaluate(
            &step.skip_check(),
            &CheckContext {
                step,
                options: &options,
                resolve: self.resolver.context(),
                runner: self.runner,
            },
        )?;
        if check.satisfied {
            debug!("'{}' is satisfied: {}", name, check.description);
            self.placed.insert(name.to_string());
            self.entries.push(PlanEntry::Satisfied {
                step: step.id().clone(),
                options,
                reason: check.description,
            });
            return Ok(());
        }

        self.in_progress.push(name.to_string());
        for dep in step.depends_on().iter().chain(step.children()) {
            if registry.is_excluded(dep) {
                debug!("'{}' skips '{}': not built on {}", name, dep, registry.platform());
                continue;
            }
            self.visit(dep, Some(name))?;
        }
        self.in_progress.pop();

        self.placed.insert(name.to_string());
        self.entries.push(PlanEntry::Run {
            step: step.id().clone(),
            options,
        });
        Ok(())
    }
}
