//! Command-line interface for stepforge.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, ListArgs, OptionsArgs, PlanArgs, RunArgs};
pub use commands::{Command, CommandDispatcher, CommandResult, Project};
