//! Book card for the catalog grid.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, StatefulWidget, Widget},
};

use crate::domain::entities::Book;
use crate::presentation::cover::CoverSlot;

/// Card width in cells, borders included.
pub const CARD_WIDTH: u16 = 22;
/// Card height in rows, borders included.
pub const CARD_HEIGHT: u16 = 15;

const TEXT_ROWS: u16 = 4;

/// Five-star rating line; a star is filled for every whole point.
#[must_use]
pub fn star_line(rating: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let full = rating.clamp(0.0, 5.0).floor() as usize;
    format!("{}{}", "★".repeat(full), "☆".repeat(5 - full))
}

/// Shortens `text` to `width` characters, ending in an ellipsis when cut.
#[must_use]
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// One book in the grid: cover on top, text below.
pub struct BookCard<'a> {
    book: &'a Book,
    selected: bool,
    tick: u64,
}

impl<'a> BookCard<'a> {
    #[must_use]
    pub const fn new(book: &'a Book) -> Self {
        Self {
            book,
            selected: false,
            tick: 0,
        }
    }

    #[must_use]
    pub const fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    #[must_use]
    pub const fn tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    fn text_lines(&self, width: usize) -> Vec<Line<'static>> {
        let book = self.book;
        let rating = match book.average_rating {
            Some(avg) if book.rating_count > 0 => Line::from(vec![
                Span::styled(star_line(avg), Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!(" {avg:.1}"),
                    Style::default().fg(Color::DarkGray),
                ),
            ]),
            _ => Line::styled("No ratings", Style::default().fg(Color::DarkGray)),
        };
        let availability = if book.is_available() {
            Line::styled("● Available", Style::default().fg(Color::Green))
        } else {
            Line::styled("● Unavailable", Style::default().fg(Color::Red))
        };

        vec![
            Line::styled(
                truncate(&book.title, width),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Line::styled(
                truncate(&format!("by {}", book.author), width),
                Style::default().fg(Color::Gray),
            ),
            rating,
            availability,
        ]
    }
}

impl StatefulWidget for BookCard<'_> {
    type State = CoverSlot;

    fn render(self, area: Rect, buf: &mut Buffer, slot: &mut Self::State) {
        let border_style = if self.selected {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(if self.selected {
                BorderType::Thick
            } else {
                BorderType::Rounded
            })
            .border_style(border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        let [cover_area, text_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(TEXT_ROWS)]).areas(inner);

        slot.render(cover_area, buf, self.tick);
        Paragraph::new(self.text_lines(usize::from(text_area.width))).render(text_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CoverOptions, sample_book};
    use crate::domain::ports::mocks::ScriptedFetcher;
    use std::sync::Arc;
    use test_case::test_case;
    use tokio::sync::mpsc;

    #[test_case(0.0, "☆☆☆☆☆" ; "no stars")]
    #[test_case(3.7, "★★★☆☆" ; "partial rounds down")]
    #[test_case(5.0, "★★★★★" ; "full")]
    #[test_case(7.5, "★★★★★" ; "clamped")]
    fn test_star_line(rating: f64, expected: &str) {
        assert_eq!(star_line(rating), expected);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Dune", 10), "Dune");
        assert_eq!(truncate("The Left Hand of Darkness", 10), "The Left …");
    }

    #[tokio::test]
    async fn test_card_shows_title_and_availability() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut book = sample_book(1, "Dune", None);
        book.available_copies = 0;
        let mut slot = CoverSlot::for_book(
            &book,
            &CoverOptions::default(),
            Arc::new(ScriptedFetcher::new()),
            tx,
        );

        let area = Rect::new(0, 0, CARD_WIDTH, CARD_HEIGHT);
        let mut buf = Buffer::empty(area);
        BookCard::new(&book).selected(true).render(area, &mut buf, &mut slot);

        let rows: Vec<String> = (0..area.height)
            .map(|y| (0..area.width).map(|x| buf[(x, y)].symbol()).collect())
            .collect();
        assert!(rows.iter().any(|row| row.contains("Dune")));
        assert!(rows.iter().any(|row| row.contains("Unavailable")));
        assert_eq!(buf[(0, 0)].fg, Color::Cyan);
    }
}
