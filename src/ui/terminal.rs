//! Terminal UI.

use std::io::Write;
use std::time::Duration;

use console::Term;

use super::output::format_duration;
use super::{should_use_colors, OutputMode, Theme, UserInterface};

/// Writes styled status to stdout and errors to stderr.
pub struct TerminalUI {
    out: Term,
    err: Term,
    theme: Theme,
    mode: OutputMode,
}

impl TerminalUI {
    pub fn new(mode: OutputMode, no_color: bool) -> Self {
        let theme = if should_use_colors(no_color) {
            Theme::new()
        } else {
            Theme::plain()
        };
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            theme,
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        writeln!(self.out, "{}", msg).ok();
    }

    fn success(&mut self, msg: &str) {
        writeln!(self.out, "{}", self.theme.format_success(msg)).ok();
    }

    fn warning(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_warning(msg)).ok();
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_error(msg)).ok();
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_progress() {
            writeln!(self.out, "\n{}\n", self.theme.format_header(title)).ok();
        }
    }

    fn show_step_starting(&mut self, name: &str, index: usize, total: usize) {
        if self.mode.shows_progress() {
            writeln!(
                self.out,
                "{} {}",
                self.theme.dim.apply_to(format!("[{}/{}]", index, total)),
                self.theme.info.apply_to(name)
            )
            .ok();
        }
    }

    fn show_step_finished(&mut self, name: &str, duration: Duration) {
        if self.mode.shows_progress() {
            let line = format!("{} {}", name, self.theme.dim.apply_to(format_duration(duration)));
            writeln!(self.out, "{}", self.theme.format_success(&line)).ok();
        }
    }

    fn show_step_satisfied(&mut self, name: &str, reason: &str) {
        if self.mode.shows_progress() {
            writeln!(
                self.out,
                "{}",
                self.theme.format_satisfied(&format!("{} ({})", name, reason))
            )
            .ok();
        }
    }

    fn show_detail(&mut self, title: &str, detail: &str) {
        writeln!(self.err, "{}", self.theme.dim.apply_to(title)).ok();
        for line in detail.lines() {
            writeln!(self.err, "  {}", line).ok();
        }
    }

    fn key_value(&mut self, key: &str, value: &str) {
        writeln!(self.out, "  {}: {}", self.theme.key.apply_to(key), value).ok();
    }
}
