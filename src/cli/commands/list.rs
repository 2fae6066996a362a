//! List command implementation.
//!
//! `stepforge list` shows every step active on this platform in
//! dependency order, followed by the steps excluded here.

use serde_json::json;

use crate::cli::args::ListArgs;
use crate::error::Result;
use crate::steps::Step;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::to_json;
use super::project::Project;

pub struct ListCommand {
    project: Project,
    args: ListArgs,
}

impl ListCommand {
    pub fn new(project: Project, args: ListArgs) -> Self {
        Self { project, args }
    }
}

fn summary(step: &Step) -> String {
    let mut line = format!("{} [{}]", step.name(), step.kind());
    if !step.depends_on().is_empty() {
        line.push_str(&format!(" after {}", step.depends_on().join(", ")));
    }
    if !step.children().is_empty() {
        line.push_str(&format!(" of {}", step.children().join(", ")));
    }
    line
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let engine = self.project.load(&[])?;
        let registry = engine.registry();
        let ordered = registry.topological_order()?;
        let excluded: Vec<&str> = registry.excluded().collect();

        if self.args.json {
            let steps: Vec<_> = ordered
                .iter()
                .map(|step| {
                    json!({
                        "name": step.name(),
                        "kind": step.kind(),
                        "description": step.description(),
                        "depends_on": step.depends_on(),
                        "steps": step.children(),
                    })
                })
                .collect();
            let value = json!({
                "platform": registry.platform().as_str(),
                "steps": steps,
                "excluded": excluded,
            });
            ui.message(&to_json(&value)?);
            return Ok(CommandResult::success());
        }

        ui.show_header(&format!("Steps ({})", registry.platform()));
        for step in &ordered {
            ui.message(&summary(step));
            if let Some(description) = step.description() {
                ui.message(&format!("    {}", description));
            }
        }
        if !excluded.is_empty() {
            ui.message(&format!(
                "Not on {}: {}",
                registry.platform(),
                excluded.join(", ")
            ));
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
  all:
    kind: composite
    steps: [build_x]
  build_x:
    kind: command
    description: Build x
    depends_on: [fetch_x]
    options:
      argv: ["make"]
  fetch_x:
    kind: command
    options:
      argv: ["true"]
  windows_only:
    platforms: [windows]
    options:
      argv: ["cmd"]
  macos_only:
    platforms: [macos]
    options:
      argv: ["true"]
"#;

    fn project() -> (TempDir, Project) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".stepforge")).unwrap();
        fs::write(temp.path().join(".stepforge/config.yml"), CONFIG).unwrap();
        let project = Project::new(temp.path().to_path_buf(), None);
        (temp, project)
    }

    #[test]
    fn summary_shows_kind_and_edges() {
        let (_temp, project) = project();
        let engine = project.load(&[]).unwrap();
        let build = engine.registry().get("build_x").unwrap();
        assert_eq!(summary(build), "build_x [command] after fetch_x");
        let all = engine.registry().get("all").unwrap();
        assert_eq!(summary(all), "all [composite] of build_x");
    }

    #[test]
    fn json_lists_dependencies_first() {
        let (_temp, project) = project();
        let mut ui = MockUI::new();

        ListCommand::new(project, ListArgs { json: true })
            .execute(&mut ui)
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&ui.messages()[0]).unwrap();
        let names: Vec<&str> = value["steps"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        let pos = |n: &str| names.iter().position(|x| *x == n).unwrap();
        assert!(pos("fetch_x") < pos("build_x"));
        assert!(pos("build_x") < pos("all"));
        assert_eq!(value["steps"][pos("build_x")]["description"], "Build x");
        assert!(!value["excluded"].as_array().unwrap().is_empty());
    }

    #[test]
    fn text_lists_excluded_steps() {
        let (_temp, project) = project();
        let mut ui = MockUI::new();

        ListCommand::new(project, ListArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert!(ui.messages().iter().any(|m| m == "    Build x"));
        assert!(ui.messages().iter().any(|m| m.starts_with("Not on ")));
    }
}
