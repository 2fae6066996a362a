//! External process invocation.
//!
//! Every command runs inside a [`ScopedDir`] guard, so the process
//! working directory is restored on every exit path. On platforms that
//! need it, a configured [`Toolchain`] activation prefix is placed in
//! front of each command.

pub mod mock;
pub mod runner;
pub mod scoped_dir;

pub use mock::{Invocation, RecordingRunner};
pub use runner::{display_command, OutputLine, ProcessRunner, SystemRunner, Toolchain};
pub use scoped_dir::ScopedDir;
