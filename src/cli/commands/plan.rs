//! Plan command implementation.
//!
//! `stepforge plan [ROOT]` shows the ordered steps a run would visit and
//! whether each one would execute, without side effects beyond the
//! commands of `command_succeeds` skip checks.

use crate::cli::args::PlanArgs;
use crate::error::Result;
use crate::process::SystemRunner;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::{plan_json, show_plan, to_json};
use super::project::Project;

pub struct PlanCommand {
    project: Project,
    args: PlanArgs,
}

impl PlanCommand {
    pub fn new(project: Project, args: PlanArgs) -> Self {
        Self { project, args }
    }
}

impl Command for PlanCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let engine = self.project.load(&self.args.options)?;
        let root = engine.root_step(self.args.root.as_deref())?;
        let runner = SystemRunner::new().with_toolchain(engine.toolchain());
        let plan = engine.plan(&root, &runner)?;

        if self.args.json {
            ui.message(&to_json(&plan_json(&plan))?);
        } else {
            show_plan(ui, &plan, false);
        }
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
steps:
  fetch_x:
    kind: fetch
    options:
      version: "1.0"
      url: https://example.com/x-1.0.tar.gz
      source_dir: x-src
  build_x:
    kind: cmake
    depends_on: [fetch_x]
    refs:
      source_dir: fetch_x.source_dir
"#;

    fn project() -> (TempDir, Project) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".stepforge")).unwrap();
        fs::write(temp.path().join(".stepforge/config.yml"), CONFIG).unwrap();
        let project = Project::new(temp.path().to_path_buf(), None);
        (temp, project)
    }

    #[test]
    fn text_plan_lists_steps_in_order() {
        let (_temp, project) = project();
        let args = PlanArgs {
            root: Some("build_x".to_string()),
            ..Default::default()
        };
        let mut ui = MockUI::new();

        PlanCommand::new(project, args).execute(&mut ui).unwrap();

        assert_eq!(ui.messages()[0], "  1. fetch_x (run)");
        assert_eq!(ui.messages()[1], "  2. build_x (run)");
        assert_eq!(ui.messages()[2], "2 of 2 step(s) will run");
    }

    #[test]
    fn json_plan_reports_satisfied_steps() {
        let (temp, project) = project();
        fs::create_dir_all(temp.path().join("x-src")).unwrap();
        let args = PlanArgs {
            root: Some("build_x".to_string()),
            json: true,
            ..Default::default()
        };
        let mut ui = MockUI::new();

        PlanCommand::new(project, args).execute(&mut ui).unwrap();

        let value: serde_json::Value = serde_json::from_str(&ui.messages()[0]).unwrap();
        assert_eq!(value["root"], "build_x");
        let steps = value["steps"].as_array().unwrap();
        assert_eq!(steps[0]["step"], "fetch_x");
        assert_eq!(steps[0]["status"], "satisfied");
        assert_eq!(steps[1]["status"], "run");
        assert_eq!(
            steps[1]["options"]["values"]["source_dir"]["value"],
            "x-src"
        );
    }
}
