//! Busy indicator shown under the conversation while the agent works.

use chatline_tui_core::Theme;
use ratatui::text::{Line, Span};

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Braille spinner advanced once per event loop tick.
#[derive(Debug, Clone, Default)]
pub struct Spinner {
    frame: usize,
    active: bool,
    label: String,
}

impl Spinner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `label`. A running spinner only has its label replaced.
    pub fn start(&mut self, label: impl Into<String>) {
        if !self.active {
            self.frame = 0;
            self.active = true;
        }
        self.label = label.into();
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn tick(&mut self) {
        if self.active {
            self.frame = (self.frame + 1) % FRAMES.len();
        }
    }

    pub fn char(&self) -> &'static str {
        FRAMES[self.frame % FRAMES.len()]
    }

    /// `  ⠋ Working…`, or an empty line when stopped.
    pub fn line(&self, theme: &Theme) -> Line<'static> {
        if !self.active {
            return Line::default();
        }
        Line::from(vec![
            Span::raw("  "),
            Span::styled(self.char(), theme.primary_style()),
            Span::raw(" "),
            Span::styled(self.label.clone(), theme.muted_style()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatline_tui_render::line_text;

    #[test]
    fn test_tick_only_when_active() {
        let mut spinner = Spinner::new();
        spinner.tick();
        assert_eq!(spinner.char(), "⠋");
        spinner.start("Working…");
        spinner.tick();
        assert_eq!(spinner.char(), "⠙");
        for _ in 0..9 {
            spinner.tick();
        }
        assert_eq!(spinner.char(), "⠙");
    }

    #[test]
    fn test_restart_keeps_frame() {
        let mut spinner = Spinner::new();
        spinner.start("Thinking…");
        spinner.tick();
        spinner.start("Working…");
        assert_eq!(spinner.char(), "⠙");
        assert_eq!(spinner.label(), "Working…");
    }

    #[test]
    fn test_line() {
        let theme = Theme::default();
        let mut spinner = Spinner::new();
        assert_eq!(line_text(&spinner.line(&theme)), "");
        spinner.start("Working…");
        assert_eq!(line_text(&spinner.line(&theme)), "  ⠋ Working…");
        spinner.stop();
        assert!(!spinner.is_active());
    }
}
