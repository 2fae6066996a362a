//! Shared rendering for plans, options and failures.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{Result, StepforgeError};
use crate::options::ResolvedOptions;
use crate::runner::{Plan, PlanEntry};
use crate::ui::UserInterface;

/// Pretty-printed JSON for `--json` output.
pub fn to_json(value: &impl Serialize) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| StepforgeError::Other(e.into()))
}

/// Print the failing step and the context of its underlying error.
pub fn show_failure(ui: &mut dyn UserInterface, err: &StepforgeError) {
    let cause = match err {
        StepforgeError::StepFailed { step, source } => {
            ui.error(&format!("Step '{}' failed", step));
            source.as_ref()
        }
        other => {
            ui.error(&other.to_string());
            return;
        }
    };

    match cause {
        StepforgeError::ProcessError {
            command,
            directory,
            code,
            ..
        } => {
            ui.key_value("command", command);
            let code = code.map_or_else(|| "none".to_string(), |c| c.to_string());
            ui.key_value("exit code", &code);
            ui.key_value("directory", &directory.display().to_string());
        }
        other => ui.key_value("error", &other.to_string()),
    }

    if let Some(log) = err.log_context() {
        ui.show_detail("Log:", log);
    }
}

/// One line per option: `name = value (origin)`.
pub fn show_options(ui: &mut dyn UserInterface, options: &ResolvedOptions) {
    for (name, option) in options.iter() {
        ui.key_value(
            name,
            &format!("{} ({})", option.value, option.origin.label()),
        );
    }
}

/// Print a plan; with `with_options`, each step's options follow it.
pub fn show_plan(ui: &mut dyn UserInterface, plan: &Plan, with_options: bool) {
    ui.show_header(&format!("Plan for {}", plan.root()));
    for (index, entry) in plan.entries().iter().enumerate() {
        match entry {
            PlanEntry::Run { step, .. } => {
                ui.message(&format!("{:>3}. {} (run)", index + 1, step));
            }
            PlanEntry::Satisfied { step, reason, .. } => {
                ui.message(&format!("{:>3}. {} (satisfied: {})", index + 1, step, reason));
            }
        }
        if with_options {
            show_options(ui, entry.options());
        }
    }
    ui.message(&format!(
        "{} of {} step(s) will run",
        plan.run_count(),
        plan.len()
    ));
}

/// JSON view of a plan.
pub fn plan_json(plan: &Plan) -> Value {
    let steps: Vec<Value> = plan
        .entries()
        .iter()
        .map(|entry| {
            let (status, reason) = match entry {
                PlanEntry::Run { .. } => ("run", None),
                PlanEntry::Satisfied { reason, .. } => ("satisfied", Some(reason.as_str())),
            };
            json!({
                "step": entry.step().as_str(),
                "status": status,
                "reason": reason,
                "options": &**entry.options(),
            })
        })
        .collect();
    json!({ "root": plan.root().as_str(), "steps": steps })
}
