//! Command dispatching.
//!
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::args::{Cli, Commands, RunArgs};
use crate::error::{Result, StepforgeError};
use crate::ui::UserInterface;

use super::display::show_failure;
use super::list::ListCommand;
use super::options::OptionsCommand;
use super::plan::PlanCommand;
use super::project::Project;
use super::run::RunCommand;

/// Exit code for a failed step or an invalid configuration.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code when no configuration file exists.
pub const EXIT_NO_CONFIG: i32 = 2;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command.
    ///
    /// Errors are reported by the dispatcher, so commands simply return them.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    project: Project,
}

impl CommandDispatcher {
    pub fn new(project_root: PathBuf, config_path: Option<PathBuf>) -> Self {
        Self {
            project: Project::new(project_root, config_path),
        }
    }

    pub fn project_root(&self) -> &Path {
        self.project.root()
    }

    /// Dispatch and execute a command.
    ///
    /// A missing configuration exits with [`EXIT_NO_CONFIG`]; every other
    /// error is printed with its context and exits with [`EXIT_FAILURE`].
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> CommandResult {
        let project = self.project.clone();
        let result = match &cli.command {
            Some(Commands::Run(args)) => RunCommand::new(project, args.clone()).execute(ui),
            Some(Commands::Plan(args)) => PlanCommand::new(project, args.clone()).execute(ui),
            Some(Commands::List(args)) => ListCommand::new(project, args.clone()).execute(ui),
            Some(Commands::Options(args)) => {
                OptionsCommand::new(project, args.clone()).execute(ui)
            }
            None => RunCommand::new(project, RunArgs::default()).execute(ui),
        };

        match result {
            Ok(result) => result,
            Err(StepforgeError::ConfigNotFound { path }) => {
                ui.error(&format!(
                    "No configuration found at {}",
                    path.display()
                ));
                CommandResult::failure(EXIT_NO_CONFIG)
            }
            Err(e) => {
                debug!("Command failed: {:?}", e);
                show_failure(ui, &e);
                CommandResult::failure(EXIT_FAILURE)
            }
        }
    }
}
