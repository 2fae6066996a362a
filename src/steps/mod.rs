//! Steps: the units of provisioning work.
//!
//! - [`Step`] - a registered step with its platform-specific config
//! - [`StepRegistry`] - every step that applies on the current platform
//! - [`StepAction`] - per-kind option defaults and run behaviour
//! - [`evaluate`] - skip predicates deciding whether a step is satisfied
//! - [`run_hooks`] - post-fetch patches and commands
//!
//! # Example
//!
//! ```
//! use stepforge::config::StepforgeConfig;
//! use stepforge::platform::Platform;
//! use stepforge::steps::StepRegistry;
//!
//! let config: StepforgeConfig = serde_yaml::from_str(r#"
//! steps:
//!   fetch_zlib:
//!     kind: fetch
//!     options: { version: v1.2.5 }
//! "#).unwrap();
//!
//! let registry = StepRegistry::from_config(&config, Platform::Linux, &[]).unwrap();
//! assert!(registry.contains("fetch_zlib"));
//! ```

pub mod kind;
pub mod patch;
pub mod predicate;
pub mod registry;
pub mod step;

pub use kind::{action_for, StepAction, StepContext};
pub use patch::{apply_patch, file_sha256, run_hooks, PatchOutcome};
pub use predicate::{evaluate, CheckContext, CheckResult};
pub use registry::StepRegistry;
pub use step::{expand, expand_all, Step};
