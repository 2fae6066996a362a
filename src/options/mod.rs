//! Step options: values, cross-step references, and their resolution.
//!
//! - [`value`] defines option values, step identifiers and references
//! - [`store`] holds finalized options, written once per step
//! - [`resolver`] runs the resolution pipeline

pub mod resolver;
pub mod store;
pub mod value;

pub use resolver::{OptionResolver, OptionSlots, ResolveContext};
pub use store::{absolutize, OptionOrigin, OptionStore, ResolvedOption, ResolvedOptions};
pub use value::{OptionOverride, OptionRef, OptionValue, StepId};
