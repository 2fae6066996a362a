//! Step kinds.
//!
//! Each [`StepKind`] maps to a [`StepAction`] that contributes option
//! defaults to the resolver, names the step's default output location,
//! and performs the step's work.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info, warn};

use super::patch::run_hooks;
use super::step::Step;
use crate::config::StepKind;
use crate::error::{Result, StepforgeError};
use crate::fetch::{fetch_and_unpack, Fetcher, MemberFilter};
use crate::options::{OptionSlots, OptionValue, ResolveContext, ResolvedOptions, StepId};
use crate::platform::Platform;
use crate::process::ProcessRunner;

/// Collaborators available to a running step.
pub struct StepContext<'a> {
    pub runner: &'a dyn ProcessRunner,
    pub fetcher: &'a dyn Fetcher,
    pub resolve: &'a ResolveContext,
}

impl<'a> StepContext<'a> {
    pub fn new(
        runner: &'a dyn ProcessRunner,
        fetcher: &'a dyn Fetcher,
        resolve: &'a ResolveContext,
    ) -> Self {
        Self {
            runner,
            fetcher,
            resolve,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.resolve.project_root
    }

    pub fn platform(&self) -> Platform {
        self.resolve.platform
    }
}

/// Behaviour shared by all steps of one kind.
pub trait StepAction: Sync {
    fn kind(&self) -> StepKind;

    /// Static defaults, applied after config defaults.
    fn schema_defaults(&self, _platform: Platform) -> Vec<(&'static str, OptionValue)> {
        Vec::new()
    }

    /// Options that must hold a value once resolution completes.
    fn required_options(&self) -> &'static [&'static str] {
        &[]
    }

    /// Values computed from the step name before templating.
    fn seed(&self, _step: &StepId, _slots: &OptionSlots) -> Vec<(&'static str, OptionValue)> {
        Vec::new()
    }

    /// Values computed from templated options.
    fn derive(
        &self,
        _slots: &OptionSlots,
        _context: &ResolveContext,
    ) -> Vec<(&'static str, OptionValue)> {
        Vec::new()
    }

    /// Option naming the output location when the config names none.
    fn default_output(&self, _options: &ResolvedOptions) -> Option<&'static str> {
        None
    }

    /// Perform the step's work.
    fn run(&self, step: &Step, options: &ResolvedOptions, ctx: &StepContext<'_>) -> Result<()>;
}

static FETCH: FetchAction = FetchAction;
static CMAKE: CmakeAction = CmakeAction;
static COMMAND: CommandAction = CommandAction;
static WRITE_FILE: WriteFileAction = WriteFileAction;
static COPY: CopyAction = CopyAction;
static COMPOSITE: CompositeAction = CompositeAction;

/// The action implementing `kind`.
pub fn action_for(kind: StepKind) -> &'static dyn StepAction {
    match kind {
        StepKind::Fetch => &FETCH,
        StepKind::Cmake => &CMAKE,
        StepKind::Command => &COMMAND,
        StepKind::WriteFile => &WRITE_FILE,
        StepKind::Copy => &COPY,
        StepKind::Composite => &COMPOSITE,
    }
}

fn join(base: &str, parts: &[&str]) -> OptionValue {
    let mut path = PathBuf::from(base);
    for part in parts {
        path.push(part);
    }
    OptionValue::text(path.to_string_lossy())
}

/// Download and unpack a source archive, then run post-fetch hooks.
pub struct FetchAction;

impl StepAction for FetchAction {
    fn kind(&self) -> StepKind {
        StepKind::Fetch
    }

    fn schema_defaults(&self, _platform: Platform) -> Vec<(&'static str, OptionValue)> {
        vec![
            ("full_name", OptionValue::text("{package_name}-{version}")),
            (
                "url",
                OptionValue::text(
                    "https://github.com/{github_owner}/{package_name}/archive/{version}.tar.gz",
                ),
            ),
        ]
    }

    fn required_options(&self) -> &'static [&'static str] {
        &["url", "unpack_dir", "source_dir"]
    }

    fn seed(&self, step: &StepId, slots: &OptionSlots) -> Vec<(&'static str, OptionValue)> {
        let name = step.as_str();
        let package = slots
            .get("package_name")
            .cloned()
            .unwrap_or_else(|| OptionValue::text(name.rsplit('_').next().unwrap_or(name)));
        vec![("package_name", package.clone()), ("github_owner", package)]
    }

    fn derive(
        &self,
        slots: &OptionSlots,
        context: &ResolveContext,
    ) -> Vec<(&'static str, OptionValue)> {
        let mut derived = Vec::new();
        let unpack_dir = match (slots.text("unpack_dir"), slots.text("package_name")) {
            (Some(dir), _) => dir,
            (None, Some(package)) => {
                let dir = join(&context.work_dir, &[&package]);
                derived.push(("unpack_dir", dir.clone()));
                dir.render()
            }
            (None, None) => return derived,
        };
        if let Some(full_name) = slots.text("full_name") {
            derived.push(("source_dir", join(&unpack_dir, &[&full_name])));
        }
        derived
    }

    fn default_output(&self, _options: &ResolvedOptions) -> Option<&'static str> {
        Some("source_dir")
    }

    fn run(&self, step: &Step, options: &ResolvedOptions, ctx: &StepContext<'_>) -> Result<()> {
        let root = ctx.project_root();
        let url = options.require_str("url")?;
        let unpack_dir = options.require_path("unpack_dir", root)?;
        let source_dir = options.require_path("source_dir", root)?;
        let result = Self::unpack_and_prepare(step, options, ctx, &url, &unpack_dir, &source_dir);
        if result.is_err() {
            Self::discard_source(&source_dir, &unpack_dir, root);
        }
        result
    }
}

impl FetchAction {
    fn unpack_and_prepare(
        step: &Step,
        options: &ResolvedOptions,
        ctx: &StepContext<'_>,
        url: &str,
        unpack_dir: &Path,
        source_dir: &Path,
    ) -> Result<()> {
        let download_dir = source_dir.parent().unwrap_or(unpack_dir);
        let filter = MemberFilter::excluding(options.get_list("exclude"));

        fetch_and_unpack(ctx.fetcher, url, download_dir, unpack_dir, &filter)?;
        if !source_dir.is_dir() {
            return Err(StepforgeError::FetchError {
                url: url.to_string(),
                message: format!("archive did not produce {}", source_dir.display()),
            });
        }

        let outcomes = run_hooks(step, options, ctx, source_dir)?;
        debug!("{} post-fetch hook(s) ran for '{}'", outcomes.len(), step.id());
        Ok(())
    }

    /// Remove a partially prepared `source_dir` so the next plan does not
    /// treat the step as satisfied.
    fn discard_source(source_dir: &Path, unpack_dir: &Path, root: &Path) {
        if source_dir == unpack_dir || root.starts_with(source_dir) || !source_dir.exists() {
            return;
        }
        match fs::remove_dir_all(source_dir) {
            Ok(()) => debug!("Removed incomplete {}", source_dir.display()),
            Err(e) => warn!("Could not remove incomplete {}: {}", source_dir.display(), e),
        }
    }
}

/// Configure, compile and install a CMake project out of source.
pub struct CmakeAction;

impl CmakeAction {
    fn configure_command(
        options: &ResolvedOptions,
        platform: Platform,
        root: &Path,
    ) -> Result<Vec<String>> {
        let mut argv = vec![
            options.require_str("cmake")?,
            "-G".to_string(),
            options.require_str("generator")?,
        ];
        if Self::installs(options) && platform.is_windows() {
            let prefix = options.require_path("install_root", root)?;
            argv.push(format!("-DCMAKE_INSTALL_PREFIX:PATH={}", prefix.display()));
        }
        if let Some(build_type) = options.get_str("build_type").filter(|s| !s.is_empty()) {
            argv.push(format!("-DCMAKE_BUILD_TYPE:STRING={}", build_type));
        }
        argv.extend(options.get_list("extra_cmake_options"));
        argv.push(
            options
                .require_path("source_dir", root)?
                .display()
                .to_string(),
        );
        Ok(argv)
    }

    fn install_command(
        options: &ResolvedOptions,
        platform: Platform,
        root: &Path,
    ) -> Result<Vec<String>> {
        let make = options.require_str("make")?;
        if platform.is_windows() {
            return Ok(vec![make, "install".to_string()]);
        }
        let destdir = options.require_path("install_root", root)?;
        Ok(vec![
            make,
            format!("DESTDIR={}", destdir.display()),
            "install".to_string(),
        ])
    }

    fn installs(options: &ResolvedOptions) -> bool {
        options.get_bool("do_install").unwrap_or(true)
    }
}

/// Attach CMake's own error log to a failed configure run.
fn with_cmake_log(err: StepforgeError, target_dir: &Path) -> StepforgeError {
    match err {
        StepforgeError::ProcessError {
            command,
            directory,
            code,
            log,
        } => {
            let error_log = target_dir.join("CMakeFiles").join("CMakeError.log");
            StepforgeError::ProcessError {
                command,
                directory,
                code,
                log: fs::read_to_string(error_log).ok().or(log),
            }
        }
        other => other,
    }
}

impl StepAction for CmakeAction {
    fn kind(&self) -> StepKind {
        StepKind::Cmake
    }

    fn schema_defaults(&self, platform: Platform) -> Vec<(&'static str, OptionValue)> {
        let mut defaults = vec![
            ("cmake", OptionValue::text("cmake")),
            ("generator", OptionValue::text(platform.cmake_generator())),
            ("make", OptionValue::text(platform.make_program())),
            ("do_install", OptionValue::Bool(true)),
        ];
        if platform.is_windows() {
            defaults.push(("build_type", OptionValue::text("Release")));
        }
        defaults
    }

    fn required_options(&self) -> &'static [&'static str] {
        &["source_dir", "target_dir"]
    }

    fn derive(
        &self,
        slots: &OptionSlots,
        context: &ResolveContext,
    ) -> Vec<(&'static str, OptionValue)> {
        let Some(source) = slots.text("source_dir") else {
            return Vec::new();
        };
        let source = Path::new(&source);
        let leaf = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parent = source
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        let install_root = slots
            .text("install_root")
            .unwrap_or_else(|| join(&parent, &["install", &leaf]).render());
        let install_dir = if context.platform.is_windows() {
            OptionValue::text(install_root.clone())
        } else {
            join(&install_root, &["usr", "local"])
        };

        vec![
            ("target_dir", join(&parent, &["tmp", &leaf])),
            ("install_root", OptionValue::text(install_root)),
            ("install_dir", install_dir),
        ]
    }

    fn default_output(&self, options: &ResolvedOptions) -> Option<&'static str> {
        Self::installs(options).then_some("install_root")
    }

    fn run(&self, step: &Step, options: &ResolvedOptions, ctx: &StepContext<'_>) -> Result<()> {
        let root = ctx.project_root();
        let platform = ctx.platform();
        let target_dir = options.require_path("target_dir", root)?;
        fs::create_dir_all(&target_dir)?;

        info!("Configuring '{}' in {}", step.id(), target_dir.display());
        let configure = Self::configure_command(options, platform, root)?;
        ctx.runner
            .invoke(&target_dir, &configure)
            .map_err(|e| with_cmake_log(e, &target_dir))?;

        let make = vec![options.require_str("make")?];
        ctx.runner.invoke(&target_dir, &make)?;

        if Self::installs(options) {
            let install = Self::install_command(options, platform, root)?;
            ctx.runner.invoke(&target_dir, &install)?;
        }
        Ok(())
    }
}

/// Run an arbitrary command.
pub struct CommandAction;

impl StepAction for CommandAction {
    fn kind(&self) -> StepKind {
        StepKind::Command
    }

    fn schema_defaults(&self, _platform: Platform) -> Vec<(&'static str, OptionValue)> {
        vec![("directory", OptionValue::text("."))]
    }

    fn required_options(&self) -> &'static [&'static str] {
        &["directory", "argv"]
    }

    fn run(&self, _step: &Step, options: &ResolvedOptions, ctx: &StepContext<'_>) -> Result<()> {
        let directory = options.require_path("directory", ctx.project_root())?;
        let argv = options.get_list("argv");
        if argv.is_empty() {
            return Err(StepforgeError::MissingOption {
                step: options.step().to_string(),
                option: "argv".to_string(),
            });
        }
        ctx.runner.invoke(&directory, &argv)
    }
}

/// Write a file from an option value.
pub struct WriteFileAction;

impl StepAction for WriteFileAction {
    fn kind(&self) -> StepKind {
        StepKind::WriteFile
    }

    fn required_options(&self) -> &'static [&'static str] {
        &["path", "contents"]
    }

    fn default_output(&self, _options: &ResolvedOptions) -> Option<&'static str> {
        Some("path")
    }

    fn run(&self, step: &Step, options: &ResolvedOptions, ctx: &StepContext<'_>) -> Result<()> {
        let path = options.require_path("path", ctx.project_root())?;
        let contents = match options.get("contents") {
            Some(OptionValue::List(lines)) => {
                let mut text = lines.join("\n");
                text.push('\n');
                text
            }
            _ => options.require_str("contents")?,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        info!("'{}' wrote {}", step.id(), path.display());
        Ok(())
    }
}

/// Copy files into a directory.
pub struct CopyAction;

impl StepAction for CopyAction {
    fn kind(&self) -> StepKind {
        StepKind::Copy
    }

    fn required_options(&self) -> &'static [&'static str] {
        &["sources", "destination"]
    }

    fn run(&self, step: &Step, options: &ResolvedOptions, ctx: &StepContext<'_>) -> Result<()> {
        let root = ctx.project_root();
        let destination = options.require_path("destination", root)?;
        fs::create_dir_all(&destination)?;

        for source in options.get_list("sources") {
            let source = crate::options::absolutize(&source, root);
            let Some(file_name) = source.file_name() else {
                continue;
            };
            let target = destination.join(file_name);
            fs::copy(&source, &target).with_context(|| {
                format!(
                    "'{}' cannot copy {} to {}",
                    step.id(),
                    source.display(),
                    target.display()
                )
            })?;
            debug!("Copied {} to {}", source.display(), target.display());
        }
        Ok(())
    }
}

/// Groups child steps; has no work of its own.
pub struct CompositeAction;

impl StepAction for CompositeAction {
    fn kind(&self) -> StepKind {
        StepKind::Composite
    }

    fn run(&self, step: &Step, _options: &ResolvedOptions, _ctx: &StepContext<'_>) -> Result<()> {
        debug!("'{}' completed its children", step.id());
        Ok(())
    }
}
