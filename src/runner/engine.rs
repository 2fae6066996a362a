//! One configured run: validated config, registry and resolve context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::plan::{build_plan, Plan};
use super::scheduler::{execute_with_progress, RunProgress, RunReport};
use crate::config::{validate, StepforgeConfig};
use crate::error::{Result, StepforgeError};
use crate::fetch::Fetcher;
use crate::options::{OptionOverride, OptionResolver, ResolveContext, ResolvedOptions};
use crate::platform::Platform;
use crate::process::{ProcessRunner, Toolchain};
use crate::steps::{StepContext, StepRegistry};

/// Entry point for planning and running steps.
#[derive(Debug)]
pub struct Engine {
    config: StepforgeConfig,
    registry: StepRegistry,
    context: ResolveContext,
}

impl Engine {
    /// Validate `config` for `platform` and register its steps.
    ///
    /// # Errors
    ///
    /// Any validation error, or `UnknownStep` for an override naming a
    /// step that does not exist.
    pub fn new(
        config: StepforgeConfig,
        project_root: impl Into<PathBuf>,
        platform: Platform,
        overrides: &[OptionOverride],
    ) -> Result<Self> {
        validate(&config, platform)?;
        let registry = StepRegistry::from_config(&config, platform, overrides)?;
        let context = ResolveContext::new(project_root, config.settings.work_dir.clone(), platform);
        debug!(
            "Registered {} step(s) for {}",
            registry.len(),
            platform
        );
        Ok(Self {
            config,
            registry,
            context,
        })
    }

    pub fn config(&self) -> &StepforgeConfig {
        &self.config
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn context(&self) -> &ResolveContext {
        &self.context
    }

    pub fn project_root(&self) -> &Path {
        &self.context.project_root
    }

    /// Toolchain activation prefix for this platform, if configured.
    pub fn toolchain(&self) -> Option<Toolchain> {
        Toolchain::from_config(self.config.settings.toolchain.as_ref(), self.context.platform)
    }

    /// The requested root, or the configured default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValidationError` when neither is given.
    pub fn root_step(&self, requested: Option<&str>) -> Result<String> {
        requested
            .map(String::from)
            .or_else(|| self.config.settings.default_root.clone())
            .ok_or_else(|| StepforgeError::ConfigValidationError {
                message: "no root step given and settings.default_root is not set".to_string(),
            })
    }

    /// Finalized options of one step.
    pub fn resolve_options(&self, step: &str) -> Result<Arc<ResolvedOptions>> {
        let mut resolver = OptionResolver::new(&self.registry, self.context.clone());
        resolver.resolve(step)
    }

    /// Build the run plan for `root`.
    pub fn plan(&self, root: &str, runner: &dyn ProcessRunner) -> Result<Plan> {
        let mut resolver = OptionResolver::new(&self.registry, self.context.clone());
        build_plan(&mut resolver, runner, root)
    }

    /// Plan and execute `root`.
    pub fn run(
        &self,
        root: &str,
        runner: &dyn ProcessRunner,
        fetcher: &dyn Fetcher,
        on_progress: impl FnMut(RunProgress<'_>),
    ) -> Result<RunReport> {
        let plan = self.plan(root, runner)?;
        self.execute(&plan, runner, fetcher, on_progress)
    }

    /// Execute an already built plan.
    pub fn execute(
        &self,
        plan: &Plan,
        runner: &dyn ProcessRunner,
        fetcher: &dyn Fetcher,
        on_progress: impl FnMut(RunProgress<'_>),
    ) -> Result<RunReport> {
        let ctx = StepContext::new(runner, fetcher, &self.context);
        execute_with_progress(plan, &self.registry, &ctx, on_progress)
    }
}
