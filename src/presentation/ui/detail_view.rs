//! Book detail popup.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, StatefulWidget, Widget, Wrap},
};
use ratatui_image::picker::Picker;
use tokio::sync::mpsc;

use crate::domain::entities::{Book, BookId, CoverOptions};
use crate::domain::ports::CoverFetchPort;
use crate::presentation::cover::{CoverEvent, CoverSlot, CoverTransition};
use crate::presentation::widgets::star_line;

use super::utils::centered_fixed;

/// The detail cover loads at once and retries harder than grid cards.
pub const DETAIL_RETRY_COUNT: u32 = 3;

const POPUP_WIDTH: u16 = 90;
const POPUP_HEIGHT: u16 = 30;
const COVER_WIDTH: u16 = 28;
const SIMILAR_LIMIT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailAction {
    None,
    Close,
    /// Open another book from the similar list.
    Open(BookId),
}

pub struct DetailViewState {
    book: Book,
    cover: CoverSlot,
    available: Option<bool>,
    similar: Vec<Book>,
    similar_selected: usize,
    tick: u64,
}

impl DetailViewState {
    /// Opens the popup for `book`; its cover starts loading right away.
    #[must_use]
    pub fn new(
        book: Book,
        fetcher: Arc<dyn CoverFetchPort>,
        cover_tx: mpsc::UnboundedSender<CoverEvent>,
    ) -> Self {
        let options = CoverOptions::default()
            .with_lazy(false)
            .with_retry_count(DETAIL_RETRY_COUNT);
        let cover = CoverSlot::for_book(&book, &options, fetcher, cover_tx);
        Self {
            book,
            cover,
            available: None,
            similar: Vec::new(),
            similar_selected: 0,
            tick: 0,
        }
    }

    #[must_use]
    pub const fn book(&self) -> &Book {
        &self.book
    }

    #[must_use]
    pub const fn cover(&self) -> &CoverSlot {
        &self.cover
    }

    #[must_use]
    pub fn similar(&self) -> &[Book] {
        &self.similar
    }

    /// Returns true if `event` was issued by this popup's loader.
    #[must_use]
    pub fn owns(&self, event: &CoverEvent) -> bool {
        let loader = self.cover.loader();
        event.key == loader.key() && event.generation == loader.generation()
    }

    pub fn handle_cover_event(&mut self, event: CoverEvent) -> Option<CoverTransition> {
        self.cover.handle_event(event)
    }

    /// Applies a fresher copy of the record.
    pub fn refresh(&mut self, book: Book) {
        if book.id == self.book.id {
            self.cover.update_book(&book);
            self.book = book;
        }
    }

    pub fn set_availability(&mut self, id: BookId, available: bool) {
        if id == self.book.id {
            self.available = Some(available);
        }
    }

    pub fn set_similar(&mut self, id: BookId, books: Vec<Book>) {
        if id == self.book.id {
            self.similar = books.into_iter().take(SIMILAR_LIMIT).collect();
            self.similar_selected = 0;
        }
    }

    pub fn sync_cover(&mut self, picker: &Picker) {
        self.cover.sync_surface(picker);
    }

    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// Whether a copy can be borrowed, preferring the live check.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.unwrap_or_else(|| self.book.is_available())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> DetailAction {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => DetailAction::Close,
            KeyCode::Down | KeyCode::Char('j') if !self.similar.is_empty() => {
                self.similar_selected = (self.similar_selected + 1) % self.similar.len();
                DetailAction::None
            }
            KeyCode::Up | KeyCode::Char('k') if !self.similar.is_empty() => {
                self.similar_selected =
                    (self.similar_selected + self.similar.len() - 1) % self.similar.len();
                DetailAction::None
            }
            KeyCode::Enter => self
                .similar
                .get(self.similar_selected)
                .map_or(DetailAction::None, |b| DetailAction::Open(b.id)),
            _ => DetailAction::None,
        }
    }

    fn info_lines(&self) -> Vec<Line<'static>> {
        let book = &self.book;
        let label = Style::default().fg(Color::DarkGray);
        let mut lines = vec![
            Line::styled(
                book.title.clone(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Line::styled(format!("by {}", book.author), Style::default().fg(Color::Gray)),
            Line::raw(""),
        ];

        if let Some(rating) = book.average_rating {
            lines.push(Line::from(vec![
                Span::styled(star_line(rating), Style::default().fg(Color::Yellow)),
                Span::raw(format!(" {rating:.1} ({} reviews)", book.rating_count)),
            ]));
            lines.push(Line::raw(""));
        }

        if let Some(description) = book.description.as_deref().filter(|d| !d.trim().is_empty()) {
            lines.push(Line::raw(description.to_string()));
            lines.push(Line::raw(""));
        }

        let mut field = |name: &str, value: String| {
            lines.push(Line::from(vec![
                Span::styled(format!("{name:<11}"), label),
                Span::raw(value),
            ]));
        };
        field("ISBN", book.isbn.clone());
        field("Category", book.category.clone());
        if let Some(language) = &book.language {
            field("Language", language.clone());
        }
        if let Some(publisher) = &book.publisher {
            field("Publisher", publisher.clone());
        }
        if let Some(year) = book.publication_year {
            field("Published", year.to_string());
        }
        if let Some(pages) = book.page_count {
            field("Pages", pages.to_string());
        }
        if let Some(added) = book.created_at {
            field("Added", added.format("%Y-%m-%d").to_string());
        }

        lines
    }
}

pub struct DetailView;

impl StatefulWidget for DetailView {
    type State = DetailViewState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let popup = centered_fixed(POPUP_WIDTH, POPUP_HEIGHT, area);
        Clear.render(popup, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Book Details ")
            .title_bottom(Line::styled(
                " Esc close · ↑↓ similar · ⏎ open ",
                Style::default().fg(Color::DarkGray),
            ));
        let inner = block.inner(popup);
        block.render(popup, buf);

        let [left, right] =
            Layout::horizontal([Constraint::Length(COVER_WIDTH), Constraint::Min(20)])
                .spacing(2)
                .areas(inner);
        let [cover_area, availability_area] =
            Layout::vertical([Constraint::Min(4), Constraint::Length(3)]).areas(left);

        let tick = state.tick;
        state.cover.render(cover_area, buf, tick);
        render_availability(state, availability_area, buf);

        let similar_rows = if state.similar.is_empty() {
            0
        } else {
            u16::try_from(state.similar.len()).unwrap_or(0) + 2
        };
        let [info_area, similar_area] =
            Layout::vertical([Constraint::Min(4), Constraint::Length(similar_rows)]).areas(right);

        Paragraph::new(state.info_lines())
            .wrap(Wrap { trim: false })
            .render(info_area, buf);
        render_similar(state, similar_area, buf);
    }
}

fn render_availability(state: &DetailViewState, area: Rect, buf: &mut Buffer) {
    let book = &state.book;
    let available = state.is_available();
    let ratio = if book.total_copies == 0 {
        0.0
    } else {
        f64::from(book.available_copies.min(book.total_copies)) / f64::from(book.total_copies)
    };
    let color = if available { Color::Green } else { Color::Red };
    let label = if available {
        "Borrow Book"
    } else {
        "Not Available"
    };

    Gauge::default()
        .block(Block::default().title(format!(
            "{} / {} copies · {label}",
            book.available_copies, book.total_copies
        )))
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label("")
        .render(area, buf);
}

fn render_similar(state: &DetailViewState, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
        return;
    }
    let mut lines = vec![Line::styled(
        "Similar books",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (index, book) in state.similar.iter().enumerate() {
        let style = if index == state.similar_selected {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default()
        };
        lines.push(Line::styled(
            format!(" {} by {}", book.title, book.author),
            style,
        ));
    }
    Paragraph::new(lines).render(Rect::new(area.x, area.y + 1, area.width, area.height - 1), buf);
}
