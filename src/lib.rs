//! stepforge - declarative, dependency-ordered builds of third-party code.
//!
//! A project describes named steps in `.stepforge/config.yml`: fetching
//! source archives, patching them, configuring and installing CMake
//! projects, running commands, writing files. Steps share settings
//! through options that may reference other steps' options, and a step
//! whose output already exists is not run again.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, merging, and validation
//! - [`error`] - Error types and result aliases
//! - [`fetch`] - Archive download and extraction
//! - [`options`] - Option values, references, and resolution
//! - [`platform`] - Host platform detection
//! - [`process`] - External command execution
//! - [`runner`] - Planning and executing steps
//! - [`steps`] - Step kinds, skip predicates, and patches
//! - [`ui`] - Terminal output
//!
//! # Example
//!
//! ```
//! use stepforge::config::render;
//!
//! let url = render("https://zlib.net/zlib-{version}.tar.gz", |name| {
//!     (name == "version").then(|| "1.3".to_string())
//! })
//! .unwrap();
//! assert_eq!(url, "https://zlib.net/zlib-1.3.tar.gz");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod options;
pub mod platform;
pub mod process;
pub mod runner;
pub mod steps;
pub mod ui;

pub use error::{Result, StepforgeError};
