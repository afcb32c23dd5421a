//! Status bar widget.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

/// Tint of the status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

impl StatusLevel {
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Info => Color::Cyan,
            Self::Success => Color::Green,
            Self::Error => Color::Red,
        }
    }
}

/// Bottom line of the catalog: a message on the left, cover metrics in the
/// middle, key hints on the right.
///
/// A section that would run into the one before it is left out; the message
/// is always drawn.
#[derive(Debug, Clone)]
pub struct StatusBar {
    message: String,
    metrics: String,
    hints: String,
    level: StatusLevel,
}

impl StatusBar {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            message: String::new(),
            metrics: String::new(),
            hints: String::new(),
            level: StatusLevel::Info,
        }
    }

    #[must_use]
    pub fn left(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn center(mut self, metrics: impl Into<String>) -> Self {
        self.metrics = metrics.into();
        self
    }

    #[must_use]
    pub fn right(mut self, hints: impl Into<String>) -> Self {
        self.hints = hints.into();
        self
    }

    #[must_use]
    pub const fn level(mut self, level: StatusLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new().left(message)
    }

    /// Which optional sections fit beside the message in `width` columns.
    fn fitting(&self, width: usize) -> (bool, bool) {
        const GAP: usize = 2;
        let message = self.message.width();
        let metrics = self.metrics.width();
        let hints = self.hints.width();

        let center_start = width.saturating_sub(metrics) / 2;
        let show_metrics = !self.metrics.is_empty() && message + GAP <= center_start;
        let occupied = if show_metrics {
            center_start + metrics
        } else {
            message
        };
        let show_hints = !self.hints.is_empty() && occupied + GAP + hints <= width;
        (show_metrics, show_hints)
    }
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for &StatusBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let message_style = Style::default()
            .fg(self.level.color())
            .add_modifier(Modifier::BOLD);
        let muted = Style::default().fg(Color::DarkGray);
        let (show_metrics, show_hints) = self.fitting(usize::from(area.width));

        Paragraph::new(Span::styled(self.message.as_str(), message_style)).render(area, buf);

        if show_metrics {
            Paragraph::new(Line::styled(self.metrics.as_str(), muted))
                .alignment(Alignment::Center)
                .render(area, buf);
        }
        if show_hints {
            Paragraph::new(Line::styled(self.hints.as_str(), muted))
                .alignment(Alignment::Right)
                .render(area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(bar: &StatusBar, width: u16) -> String {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        bar.render(area, &mut buf);
        (0..width).map(|x| buf[(x, 0)].symbol()).collect()
    }

    #[test]
    fn test_sections_are_aligned() {
        let bar = StatusBar::info("12 books").right("q quit");
        let text = row(&bar, 30);
        assert!(text.starts_with("12 books"));
        assert!(text.ends_with("q quit"));
    }

    #[test]
    fn test_sections_give_way_when_narrow() {
        let bar = StatusBar::info("Page 1 of 3")
            .center("Loaded: 4")
            .right("q quit · / search");
        let text = row(&bar, 40);
        assert!(text.contains("Loaded: 4"));
        assert!(!text.contains("quit"));

        let text = row(&bar, 14);
        assert!(text.starts_with("Page 1 of 3"));
        assert!(!text.contains("Loaded"));
    }

    #[test]
    fn test_error_level_color() {
        let bar = StatusBar::info("Failed to load books").level(StatusLevel::Error);
        let area = Rect::new(0, 0, 30, 1);
        let mut buf = Buffer::empty(area);
        (&bar).render(area, &mut buf);
        assert_eq!(buf[(0, 0)].fg, Color::Red);
    }
}
