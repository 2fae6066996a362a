//! User-facing output.
//!
//! - [`UserInterface`] trait, so commands can be tested with [`MockUI`]
//! - [`TerminalUI`] for styled terminal output
//! - [`OutputMode`] verbosity levels

pub mod mock;
pub mod output;
pub mod terminal;
pub mod theme;

pub use mock::MockUI;
pub use output::{format_duration, OutputMode};
pub use terminal::TerminalUI;
pub use theme::{should_use_colors, Theme};

use std::time::Duration;

use crate::runner::RunProgress;

/// Output surface used by the commands.
pub trait UserInterface {
    fn output_mode(&self) -> OutputMode;

    /// Plain line.
    fn message(&mut self, msg: &str);

    fn success(&mut self, msg: &str);

    fn warning(&mut self, msg: &str);

    fn error(&mut self, msg: &str);

    fn show_header(&mut self, title: &str);

    /// A step is about to run (`index` counts from 1).
    fn show_step_starting(&mut self, name: &str, index: usize, total: usize);

    fn show_step_finished(&mut self, name: &str, duration: Duration);

    /// A step was skipped because prior state satisfies it.
    fn show_step_satisfied(&mut self, name: &str, reason: &str);

    /// Multi-line context, such as a captured build log.
    fn show_detail(&mut self, title: &str, detail: &str);

    fn key_value(&mut self, key: &str, value: &str);
}

/// Forward a scheduler event to the UI.
pub fn report_progress(ui: &mut dyn UserInterface, event: RunProgress<'_>) {
    match event {
        RunProgress::StepStarting { name, index, total } => {
            ui.show_step_starting(name, index, total)
        }
        RunProgress::StepFinished { name, duration } => ui.show_step_finished(name, duration),
        RunProgress::StepSatisfied { name, reason } => ui.show_step_satisfied(name, reason),
    }
}
