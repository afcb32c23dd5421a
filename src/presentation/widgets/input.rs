//! Single-line text input widget.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

/// Text input field widget.
///
/// The cursor is a character index, so multi-byte titles and author names
/// edit correctly.
#[derive(Debug, Clone)]
pub struct TextInput {
    value: String,
    cursor: usize,
    focused: bool,
    placeholder: String,
    label: String,
    error: Option<String>,
}

impl TextInput {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            focused: false,
            placeholder: String::new(),
            label: label.into(),
            error: None,
        }
    }

    #[must_use]
    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = text.into();
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.set_value(value);
        self
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    #[must_use]
    pub const fn is_focused(&self) -> bool {
        self.focused
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Validation message shown under the field; `None` clears it.
    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(i, _)| i)
    }

    pub fn input_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn move_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    /// Applies an editing key. Returns false for keys the input ignores.
    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> bool {
        use crossterm::event::{KeyCode, KeyModifiers};

        match key.code {
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.input_char(c);
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.move_start(),
            KeyCode::End => self.move_end(),
            _ => return false,
        }
        true
    }

    /// Rows needed to draw the field, including its error line.
    #[must_use]
    pub const fn height(&self) -> u16 {
        if self.error.is_some() { 4 } else { 3 }
    }

    /// Display column of the cursor within the text.
    fn cursor_column(&self) -> usize {
        let before: String = self.value.chars().take(self.cursor).collect();
        before.width()
    }
}

impl Widget for &TextInput {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_color = match (self.focused, self.error.is_some()) {
            (_, true) => Color::Red,
            (true, false) => Color::Cyan,
            (false, false) => Color::Gray,
        };

        let text_style = if self.value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::White)
        };

        let field_area = Rect::new(area.x, area.y, area.width, area.height.min(3));
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(self.label.as_str());
        let inner = block.inner(field_area);

        let display = if self.value.is_empty() {
            self.placeholder.as_str()
        } else {
            self.value.as_str()
        };
        block.render(field_area, buf);
        Paragraph::new(display).style(text_style).render(inner, buf);

        if let Some(error) = &self.error
            && area.height > 3
        {
            let error_area = Rect::new(area.x + 1, area.y + 3, area.width.saturating_sub(1), 1);
            Paragraph::new(Line::from(Span::styled(
                error.as_str(),
                Style::default().fg(Color::Red),
            )))
            .render(error_area, buf);
        }

        if self.focused && inner.width > 0 {
            let column = u16::try_from(self.cursor_column()).unwrap_or(u16::MAX);
            let cursor_x = inner.x.saturating_add(column);
            if cursor_x < inner.x + inner.width {
                buf[(cursor_x, inner.y)]
                    .set_style(Style::default().bg(Color::White).fg(Color::Black));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn test_text_input_basic() {
        let mut input = TextInput::new("Title");
        assert!(input.value().is_empty());

        input.input_char('a');
        input.input_char('b');
        assert_eq!(input.value(), "ab");

        input.backspace();
        assert_eq!(input.value(), "a");
    }

    #[test]
    fn test_multibyte_editing() {
        let mut input = TextInput::new("Author").with_value("Gabriel García");
        input.move_left();
        input.move_left();
        input.backspace();
        // Removes the 'c' before the accented character.
        assert_eq!(input.value(), "Gabriel Garía");

        input.move_start();
        input.delete();
        assert_eq!(input.value(), "abriel Garía");
    }

    #[test]
    fn test_handle_key_ignores_control_chords() {
        let mut input = TextInput::new("Query");
        assert!(input.handle_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE)));
        assert!(!input.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!input.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
        assert_eq!(input.value(), "x");
    }

    #[test]
    fn test_error_adds_a_row() {
        let mut input = TextInput::new("ISBN");
        assert_eq!(input.height(), 3);
        input.set_error(Some("ISBN is required".to_string()));
        assert_eq!(input.height(), 4);

        let area = Rect::new(0, 0, 24, 4);
        let mut buf = Buffer::empty(area);
        (&input).render(area, &mut buf);
        let error_row: String = (0..area.width).map(|x| buf[(x, 3)].symbol()).collect();
        assert!(error_row.contains("ISBN is required"));
    }
}
