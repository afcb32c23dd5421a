//! Add-book form popup.

use chrono::Datelike;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
};

use crate::application::services::{BookDraft, CATEGORIES, LANGUAGES, cover_url_for_isbn};
use crate::domain::entities::{FieldErrors, NewBook};
use crate::presentation::widgets::TextInput;

use super::utils::centered_fixed;

const POPUP_WIDTH: u16 = 76;

/// Form fields in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Author,
    Isbn,
    Category,
    Language,
    Publisher,
    PublicationYear,
    PageCount,
    TotalCopies,
    AvailableCopies,
    CoverImageUrl,
    Description,
}

impl BookField {
    pub const ALL: [Self; 12] = [
        Self::Title,
        Self::Author,
        Self::Isbn,
        Self::Category,
        Self::Language,
        Self::Publisher,
        Self::PublicationYear,
        Self::PageCount,
        Self::TotalCopies,
        Self::AvailableCopies,
        Self::CoverImageUrl,
        Self::Description,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "Title *",
            Self::Author => "Author *",
            Self::Isbn => "ISBN *",
            Self::Category => "Category * (←/→)",
            Self::Language => "Language (←/→)",
            Self::Publisher => "Publisher",
            Self::PublicationYear => "Publication Year",
            Self::PageCount => "Page Count",
            Self::TotalCopies => "Total Copies",
            Self::AvailableCopies => "Available Copies",
            Self::CoverImageUrl => "Cover Image URL",
            Self::Description => "Description",
        }
    }

    /// Key used by validation errors for this field.
    #[must_use]
    pub const fn error_key(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Isbn => "isbn",
            Self::Category => "category",
            Self::Language => "language",
            Self::Publisher => "publisher",
            Self::PublicationYear => "publicationYear",
            Self::PageCount => "pageCount",
            Self::TotalCopies => "totalCopies",
            Self::AvailableCopies => "availableCopies",
            Self::CoverImageUrl => "coverImageUrl",
            Self::Description => "description",
        }
    }

    /// Options for fields picked from a list.
    #[must_use]
    pub const fn options(self) -> Option<&'static [&'static str]> {
        match self {
            Self::Category => Some(&CATEGORIES),
            Self::Language => Some(&LANGUAGES),
            _ => None,
        }
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    None,
    Submit(NewBook),
    Cancel,
}

pub struct AddBookForm {
    inputs: Vec<TextInput>,
    focus: BookField,
    submitting: bool,
    submit_error: Option<String>,
    current_year: i32,
}

impl AddBookForm {
    #[must_use]
    pub fn new() -> Self {
        Self::for_year(chrono::Local::now().year())
    }

    /// A blank form validated against `current_year`.
    #[must_use]
    pub fn for_year(current_year: i32) -> Self {
        let draft = BookDraft::new(current_year);
        let inputs = BookField::ALL
            .iter()
            .map(|field| {
                let input = TextInput::new(field.label()).with_value(draft_value(&draft, *field));
                match field {
                    BookField::Isbn => input.placeholder("978-0-00-000000-0"),
                    BookField::CoverImageUrl => input.placeholder("https://..."),
                    _ => input,
                }
            })
            .collect();

        let mut form = Self {
            inputs,
            focus: BookField::Title,
            submitting: false,
            submit_error: None,
            current_year,
        };
        form.set_focus(BookField::Title);
        form
    }

    #[must_use]
    pub const fn focus(&self) -> BookField {
        self.focus
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    #[must_use]
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    fn input(&self, field: BookField) -> &TextInput {
        &self.inputs[field.position()]
    }

    fn input_mut(&mut self, field: BookField) -> &mut TextInput {
        &mut self.inputs[field.position()]
    }

    #[must_use]
    pub fn value(&self, field: BookField) -> &str {
        self.input(field).value()
    }

    #[must_use]
    pub fn error(&self, field: BookField) -> Option<&str> {
        self.input(field).error()
    }

    pub fn set_value(&mut self, field: BookField, value: &str) {
        self.input_mut(field).set_value(value);
    }

    fn set_focus(&mut self, field: BookField) {
        self.input_mut(self.focus).set_focused(false);
        self.focus = field;
        self.input_mut(field).set_focused(true);
    }

    /// Collects the typed values.
    #[must_use]
    pub fn draft(&self) -> BookDraft {
        BookDraft {
            title: self.value(BookField::Title).to_string(),
            author: self.value(BookField::Author).to_string(),
            isbn: self.value(BookField::Isbn).to_string(),
            category: self.value(BookField::Category).to_string(),
            language: self.value(BookField::Language).to_string(),
            publisher: self.value(BookField::Publisher).to_string(),
            publication_year: self.value(BookField::PublicationYear).to_string(),
            page_count: self.value(BookField::PageCount).to_string(),
            description: self.value(BookField::Description).to_string(),
            cover_image_url: self.value(BookField::CoverImageUrl).to_string(),
            total_copies: self.value(BookField::TotalCopies).to_string(),
            available_copies: self.value(BookField::AvailableCopies).to_string(),
        }
    }

    fn apply_errors(&mut self, errors: &FieldErrors) {
        for field in BookField::ALL {
            let message = errors.get(field.error_key()).cloned();
            self.input_mut(field).set_error(message);
        }
        if let Some(first) = BookField::ALL
            .iter()
            .find(|f| errors.contains_key(f.error_key()))
        {
            self.set_focus(*first);
        }
    }

    /// The server rejected the book.
    pub fn set_submit_error(&mut self, message: impl Into<String>) {
        self.submitting = false;
        self.submit_error = Some(message.into());
    }

    fn cycle_option(&mut self, forward: bool) {
        let Some(options) = self.focus.options() else {
            return;
        };
        let current = self.value(self.focus);
        let len = options.len();
        let next = match options.iter().position(|o| *o == current) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        let focus = self.focus;
        self.input_mut(focus).set_value(options[next]);
        self.input_mut(focus).set_error(None);
    }

    /// Fills a blank cover URL with a guess from the ISBN, or from title
    /// and author when no ISBN is entered.
    fn suggest_cover_url(&mut self) {
        if !self.value(BookField::CoverImageUrl).trim().is_empty() {
            return;
        }
        let isbn = self.value(BookField::Isbn);
        let url = cover_url_for_isbn(
            self.value(BookField::Title).trim(),
            self.value(BookField::Author).trim(),
            Some(isbn),
        );
        self.set_value(BookField::CoverImageUrl, &url);
    }

    fn submit(&mut self) -> FormAction {
        match self.draft().to_new_book_for_year(self.current_year) {
            Ok(book) => {
                self.apply_errors(&FieldErrors::new());
                self.submit_error = None;
                self.submitting = true;
                FormAction::Submit(book)
            }
            Err(errors) => {
                self.apply_errors(&errors);
                FormAction::None
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        if self.submitting {
            return FormAction::None;
        }

        match key.code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return self.submit();
            }
            KeyCode::Char('g') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.suggest_cover_url();
            }
            KeyCode::Enter if self.focus == BookField::Description => return self.submit(),
            KeyCode::Tab | KeyCode::Down | KeyCode::Enter => {
                let next = BookField::ALL[(self.focus.position() + 1) % BookField::ALL.len()];
                self.set_focus(next);
            }
            KeyCode::BackTab | KeyCode::Up => {
                let len = BookField::ALL.len();
                let previous = BookField::ALL[(self.focus.position() + len - 1) % len];
                self.set_focus(previous);
            }
            KeyCode::Left if self.focus.options().is_some() => self.cycle_option(false),
            KeyCode::Right if self.focus.options().is_some() => self.cycle_option(true),
            _ if self.focus.options().is_some() => {}
            _ => {
                let focus = self.focus;
                let input = self.input_mut(focus);
                if input.handle_key(key) {
                    // Typing clears that field's message.
                    input.set_error(None);
                }
            }
        }
        FormAction::None
    }
}

impl Default for AddBookForm {
    fn default() -> Self {
        Self::new()
    }
}

fn draft_value(draft: &BookDraft, field: BookField) -> &str {
    match field {
        BookField::Title => &draft.title,
        BookField::Author => &draft.author,
        BookField::Isbn => &draft.isbn,
        BookField::Category => &draft.category,
        BookField::Language => &draft.language,
        BookField::Publisher => &draft.publisher,
        BookField::PublicationYear => &draft.publication_year,
        BookField::PageCount => &draft.page_count,
        BookField::TotalCopies => &draft.total_copies,
        BookField::AvailableCopies => &draft.available_copies,
        BookField::CoverImageUrl => &draft.cover_image_url,
        BookField::Description => &draft.description,
    }
}

impl Widget for &AddBookForm {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Two columns of fields plus the footer.
        let rows: u16 = BookField::ALL
            .chunks(2)
            .map(|pair| {
                pair.iter()
                    .map(|f| self.input(*f).height())
                    .max()
                    .unwrap_or(3)
            })
            .sum();
        let popup = centered_fixed(POPUP_WIDTH, rows + 4, area);
        Clear.render(popup, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Add New Book ");
        let inner = block.inner(popup);
        block.render(popup, buf);

        let [fields_area, footer_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(2)]).areas(inner);

        let mut y = fields_area.y;
        for pair in BookField::ALL.chunks(2) {
            let height = pair
                .iter()
                .map(|f| self.input(*f).height())
                .max()
                .unwrap_or(3);
            if y + height > fields_area.bottom() {
                break;
            }
            let row = Rect::new(fields_area.x, y, fields_area.width, height);
            let columns = Layout::horizontal([Constraint::Percentage(50); 2])
                .spacing(1)
                .split(row);
            for (field, column) in pair.iter().zip(columns.iter()) {
                self.input(*field).render(*column, buf);
            }
            y += height;
        }

        let status = if self.submitting {
            Line::styled(
                "Adding book...",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
            )
        } else if let Some(error) = &self.submit_error {
            Line::styled(error.as_str(), Style::default().fg(Color::Red))
        } else {
            Line::from(vec![
                Span::styled("Tab next · ", Style::default().fg(Color::DarkGray)),
                Span::styled("Ctrl+G guess cover · ", Style::default().fg(Color::DarkGray)),
                Span::styled("Ctrl+S add book · ", Style::default().fg(Color::DarkGray)),
                Span::styled("Esc cancel", Style::default().fg(Color::DarkGray)),
            ])
        };
        Paragraph::new(status).render(footer_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl_s() -> KeyEvent {
        KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)
    }

    fn type_text(form: &mut AddBookForm, text: &str) {
        for c in text.chars() {
            form.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_starts_with_draft_defaults() {
        let form = AddBookForm::for_year(2026);
        assert_eq!(form.focus(), BookField::Title);
        assert_eq!(form.value(BookField::Language), "English");
        assert_eq!(form.value(BookField::PublicationYear), "2026");
        assert_eq!(form.value(BookField::TotalCopies), "1");
    }

    #[test]
    fn test_empty_submit_marks_required_fields() {
        let mut form = AddBookForm::for_year(2026);
        form.handle_key(key(KeyCode::Tab));
        assert_eq!(form.handle_key(ctrl_s()), FormAction::None);

        assert_eq!(form.error(BookField::Title), Some("Title is required"));
        assert_eq!(form.error(BookField::Category), Some("Category is required"));
        assert_eq!(form.error(BookField::PageCount), Some("Page count must be at least 1"));
        assert!(form.error(BookField::Language).is_none());
        // Focus jumps to the first field in error.
        assert_eq!(form.focus(), BookField::Title);
    }

    #[test]
    fn test_typing_clears_field_error() {
        let mut form = AddBookForm::for_year(2026);
        form.handle_key(ctrl_s());
        assert!(form.error(BookField::Title).is_some());

        type_text(&mut form, "D");
        assert!(form.error(BookField::Title).is_none());
        assert!(form.error(BookField::Author).is_some());
    }

    #[test]
    fn test_select_fields_cycle() {
        let mut form = AddBookForm::for_year(2026);
        for _ in 0..3 {
            form.handle_key(key(KeyCode::Tab));
        }
        assert_eq!(form.focus(), BookField::Category);

        form.handle_key(key(KeyCode::Right));
        assert_eq!(form.value(BookField::Category), "Fiction");
        form.handle_key(key(KeyCode::Left));
        assert_eq!(form.value(BookField::Category), "Poetry");
        // Typing does not edit a select field.
        form.handle_key(key(KeyCode::Char('x')));
        assert_eq!(form.value(BookField::Category), "Poetry");
    }

    #[test]
    fn test_valid_form_submits() {
        let mut form = AddBookForm::for_year(2026);
        type_text(&mut form, "Dune");
        form.set_value(BookField::Author, "Frank Herbert");
        form.set_value(BookField::Isbn, "9780441013593");
        form.set_value(BookField::Category, "Science Fiction");
        form.set_value(BookField::PublicationYear, "1965");
        form.set_value(BookField::PageCount, "412");

        let FormAction::Submit(book) = form.handle_key(ctrl_s()) else {
            panic!("expected submit");
        };
        assert_eq!(book.title, "Dune");
        assert_eq!(book.page_count, 412);
        assert!(form.is_submitting());

        // Keys are ignored while the request is in flight.
        assert_eq!(form.handle_key(key(KeyCode::Esc)), FormAction::None);

        form.set_submit_error("Failed to create book. Please try again.");
        assert!(!form.is_submitting());
        assert_eq!(form.handle_key(key(KeyCode::Esc)), FormAction::Cancel);
    }

    #[test]
    fn test_cover_url_guess() {
        let ctrl_g = KeyEvent::new(KeyCode::Char('g'), KeyModifiers::CONTROL);

        let mut form = AddBookForm::for_year(2026);
        form.set_value(BookField::Isbn, "978-0-441-01359-3");
        form.handle_key(ctrl_g);
        assert_eq!(
            form.value(BookField::CoverImageUrl),
            "https://covers.openlibrary.org/b/isbn/9780441013593-L.jpg"
        );

        let mut form = AddBookForm::for_year(2026);
        form.set_value(BookField::Title, "Dune");
        form.set_value(BookField::Author, "Frank Herbert");
        form.handle_key(ctrl_g);
        assert!(form.value(BookField::CoverImageUrl).ends_with("&q=Dune%20Frank%20Herbert"));

        // An entered URL is kept.
        let mut form = AddBookForm::for_year(2026);
        form.set_value(BookField::CoverImageUrl, "https://img/x.jpg");
        form.set_value(BookField::Isbn, "9780441013593");
        form.handle_key(ctrl_g);
        assert_eq!(form.value(BookField::CoverImageUrl), "https://img/x.jpg");
    }

    #[test]
    fn test_render_shows_errors() {
        let mut form = AddBookForm::for_year(2026);
        form.handle_key(ctrl_s());

        let area = Rect::new(0, 0, 80, 60);
        let mut buf = Buffer::empty(area);
        (&form).render(area, &mut buf);
        let text: String = (0..area.height)
            .map(|y| (0..area.width).map(|x| buf[(x, y)].symbol()).collect::<String>())
            .collect();
        assert!(text.contains("Add New Book"));
        assert!(text.contains("Title is required"));
    }
}
