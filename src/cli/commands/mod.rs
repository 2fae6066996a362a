//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait and is routed by
//! [`CommandDispatcher`], which also turns errors into exit codes.

pub mod dispatcher;
pub mod display;
pub mod list;
pub mod options;
pub mod plan;
pub mod project;
pub mod run;

pub use dispatcher::{Command, CommandDispatcher, CommandResult, EXIT_FAILURE, EXIT_NO_CONFIG};
pub use project::Project;
