//! Mock UI for testing.
//!
//! `MockUI` captures every interaction for later assertion.
//!
//! # Example
//!
//! ```
//! use stepforge::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.message("Planning");
//! ui.success("Done");
//!
//! assert!(ui.messages().contains(&"Planning".to_string()));
//! assert!(ui.successes().contains(&"Done".to_string()));
//! ```

use std::time::Duration;

use super::{OutputMode, UserInterface};

/// Records UI calls instead of printing them.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    steps: Vec<String>,
    details: Vec<(String, String)>,
}

impl MockUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Step progress lines, such as `start build_x 2/3`.
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn details(&self) -> &[(String, String)] {
        &self.details
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn show_step_starting(&mut self, name: &str, index: usize, total: usize) {
        self.steps.push(format!("start {} {}/{}", name, index, total));
    }

    fn show_step_finished(&mut self, name: &str, _duration: Duration) {
        self.steps.push(format!("done {}", name));
    }

    fn show_step_satisfied(&mut self, name: &str, _reason: &str) {
        self.steps.push(format!("satisfied {}", name));
    }

    fn show_detail(&mut self, title: &str, detail: &str) {
        self.details.push((title.to_string(), detail.to_string()));
    }

    fn key_value(&mut self, key: &str, value: &str) {
        self.messages.push(format!("{}: {}", key, value));
    }
}
