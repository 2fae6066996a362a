//! Run command implementation.
//!
//! `stepforge run [ROOT]` plans the root step and executes every step
//! that is not already satisfied, stopping at the first failure.

use tracing::info;

use crate::cli::args::RunArgs;
use crate::error::Result;
use crate::fetch::HttpFetcher;
use crate::process::SystemRunner;
use crate::ui::{format_duration, report_progress, UserInterface};

use super::dispatcher::{Command, CommandResult};
use super::display::show_plan;
use super::project::Project;

pub struct RunCommand {
    project: Project,
    args: RunArgs,
}

impl RunCommand {
    pub fn new(project: Project, args: RunArgs) -> Self {
        Self { project, args }
    }

    pub fn args(&self) -> &RunArgs {
        &self.args
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let engine = self.project.load(&self.args.options)?;
        let root = engine.root_step(self.args.root.as_deref())?;
        let runner = SystemRunner::new()
            .with_toolchain(engine.toolchain())
            .with_echo(ui.output_mode().shows_command_output());

        let plan = engine.plan(&root, &runner)?;
        if self.args.dry_run {
            show_plan(ui, &plan, true);
            return Ok(CommandResult::success());
        }

        ui.show_header(&format!("Building {}", root));
        let fetcher = HttpFetcher::new()?;
        let report = engine.execute(&plan, &runner, &fetcher, |event| {
            report_progress(ui, event)
        })?;

        info!(
            "Run of {} finished: {} executed, {} satisfied",
            root,
            report.executed.len(),
            report.satisfied.len()
        );
        ui.success(&format!(
            "{} step(s) run, {} already satisfied ({})",
            report.executed.len(),
            report.satisfied.len(),
            format_duration(report.duration)
        ));
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const CONFIG: &str = r##"
settings:
  default_root: all
steps:
  header:
    kind: write_file
    options:
      path: out/version.h
      contents: ["#define X_VERSION \"{version}\""]
      version: "1.0"
  all:
    kind: composite
    steps: [header]
"##;

    fn project(config: &str) -> (TempDir, Project) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".stepforge")).unwrap();
        fs::write(temp.path().join(".stepforge/config.yml"), config).unwrap();
        let project = Project::new(temp.path().to_path_buf(), None);
        (temp, project)
    }

    fn read(root: &Path, rel: &str) -> String {
        fs::read_to_string(root.join(rel)).unwrap()
    }

    #[test]
    fn runs_default_root_then_skips_satisfied_step() {
        let (temp, project) = project(CONFIG);
        let cmd = RunCommand::new(project.clone(), RunArgs::default());
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert_eq!(read(temp.path(), "out/version.h"), "#define X_VERSION \"1.0\"\n");
        assert!(ui.steps().contains(&"done header".to_string()));

        let mut ui = MockUI::new();
        RunCommand::new(project, RunArgs::default())
            .execute(&mut ui)
            .unwrap();
        assert!(ui.steps().contains(&"satisfied header".to_string()));
        assert!(ui.successes()[0].starts_with("1 step(s) run, 1 already satisfied"));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let (temp, project) = project(CONFIG);
        let args = RunArgs {
            dry_run: true,
            options: vec!["header.version=2.0".parse().unwrap()],
            ..Default::default()
        };
        let mut ui = MockUI::new();

        RunCommand::new(project, args).execute(&mut ui).unwrap();

        assert!(!temp.path().join("out").exists());
        assert!(ui.messages().iter().any(|m| m.contains("header (run)")));
        assert!(ui.messages().contains(&"version: 2.0 (explicit)".to_string()));
    }

    #[test]
    fn missing_root_is_an_error() {
        let (_temp, project) = project("steps:\n  a:\n    options:\n      argv: [\"true\"]\n");
        let mut ui = MockUI::new();
        assert!(RunCommand::new(project, RunArgs::default())
            .execute(&mut ui)
            .is_err());
    }
}
