//! Options command implementation.
//!
//! `stepforge options STEP` prints the finalized options of one step
//! together with where each value came from.

use crate::cli::args::OptionsArgs;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::{show_options, to_json};
use super::project::Project;

pub struct OptionsCommand {
    project: Project,
    args: OptionsArgs,
}

impl OptionsCommand {
    pub fn new(project: Project, args: OptionsArgs) -> Self {
        Self { project, args }
    }
}

impl Command for OptionsCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let engine = self.project.load(&self.args.options)?;
        let options = engine.resolve_options(&self.args.step)?;

        if self.args.json {
            ui.message(&to_json(options.as_ref())?);
        } else {
            ui.show_header(&format!("Options of {}", self.args.step));
            show_options(ui, &options);
        }
        Ok(CommandResult::success())
    }
}
