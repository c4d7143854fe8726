//! Status banner widget.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

/// Status bar severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    /// Informational.
    Info,
    /// Warning.
    Warning,
    /// Error.
    Error,
}

impl StatusLevel {
    /// Returns color for level.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Info => Color::Cyan,
            Self::Warning => Color::Yellow,
            Self::Error => Color::Red,
        }
    }

    const fn icon(self) -> &'static str {
        match self {
            Self::Info => "i",
            Self::Warning => "!",
            Self::Error => "✖",
        }
    }
}

/// Single-line banner with a message on the left and a hint on the right.
#[derive(Debug, Clone)]
pub struct StatusBar {
    message: String,
    hint: String,
    level: StatusLevel,
}

impl StatusBar {
    #[must_use]
    pub fn new(level: StatusLevel, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            hint: String::new(),
            level,
        }
    }

    /// Creates error status bar.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Error, message)
    }

    /// Sets right-aligned hint.
    #[must_use]
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn level(&self) -> StatusLevel {
        self.level
    }
}

impl Widget for &StatusBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }

        let banner = Style::default()
            .fg(Color::White)
            .bg(self.level.color())
            .add_modifier(Modifier::BOLD);
        let hint_style = Style::default().fg(Color::Black).bg(self.level.color());

        let width = usize::from(area.width);
        let left = format!(" {} {}", self.level.icon(), self.message);
        let hint = if self.hint.is_empty() {
            String::new()
        } else {
            format!("{} ", self.hint)
        };

        let mut spans = vec![Span::styled(left.as_str(), banner)];
        let used = left.width() + hint.width();
        if used < width && !hint.is_empty() {
            spans.push(Span::styled(" ".repeat(width - used), banner));
            spans.push(Span::styled(hint.as_str(), hint_style));
        }

        Paragraph::new(Line::from(spans))
            .style(banner)
            .render(area, buf);
    }
}
