//! Step ordering and execution.

pub mod dependency;
pub mod engine;
pub mod plan;
pub mod scheduler;

pub use dependency::{DependencyGraph, DependencyGraphBuilder};
pub use engine::Engine;
pub use plan::{build_plan, Plan, PlanEntry};
pub use scheduler::{execute, execute_with_progress, RunProgress, RunReport};
