//! Terminal styling.

use console::Style;

/// Styles used by the terminal UI.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Success messages (green)
    pub success: Style,
    /// Warnings (orange)
    pub warning: Style,
    /// Errors (red bold)
    pub error: Style,
    /// Running steps (magenta)
    pub info: Style,
    /// Secondary text
    pub dim: Style,
    pub highlight: Style,
    /// Headers (magenta bold)
    pub header: Style,
    /// Key labels in key-value listings (bold)
    pub key: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

impl Theme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            info: Style::new().magenta(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            header: Style::new().bold().magenta(),
            key: Style::new().bold(),
        }
    }

    /// A theme without colors, for pipes and `--no-color`.
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
            key: Style::new(),
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        format!("{} {}", self.success.apply_to("✓"), msg)
    }

    pub fn format_warning(&self, msg: &str) -> String {
        format!("{} {}", self.warning.apply_to("⚠"), msg)
    }

    pub fn format_error(&self, msg: &str) -> String {
        format!("{} {}", self.error.apply_to("✗"), self.error.apply_to(msg))
    }

    pub fn format_satisfied(&self, msg: &str) -> String {
        format!("{} {}", self.dim.apply_to("○"), self.dim.apply_to(msg))
    }

    pub fn format_header(&self, title: &str) -> String {
        format!("{}", self.header.apply_to(title))
    }
}

/// Whether colored output should be used.
///
/// `NO_COLOR` and `--no-color` disable colors; otherwise `console`
/// decides from the terminal.
pub fn should_use_colors(no_color_flag: bool) -> bool {
    if no_color_flag || std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    console::colors_enabled()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_theme_has_no_escapes() {
        let theme = Theme::plain();
        assert_eq!(theme.format_success("done"), "✓ done");
        assert_eq!(theme.format_error("failed"), "✗ failed");
        assert_eq!(theme.format_satisfied("fetch_zlib"), "○ fetch_zlib");
    }

    #[test]
    fn flag_disables_colors() {
        assert!(!should_use_colors(true));
    }
}
