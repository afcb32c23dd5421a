//! Search bar with the advanced filter panel.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
};

use crate::application::services::{FilterField, SearchForm};
use crate::domain::entities::SearchFilters;
use crate::presentation::widgets::TextInput;

use super::utils::centered_fixed;

const POPUP_WIDTH: u16 = 70;

/// Distinct values offered by the select filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogMetadata {
    pub categories: Vec<String>,
    pub languages: Vec<String>,
    pub publishers: Vec<String>,
}

impl CatalogMetadata {
    fn options(&self, field: FilterField) -> &[String] {
        match field {
            FilterField::Category => &self.categories,
            FilterField::Language => &self.languages,
            FilterField::Publisher => &self.publishers,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchFocus {
    Query,
    Filter(FilterField),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    None,
    Submit { query: String, filters: SearchFilters },
    /// Everything was reset; the unfiltered catalog should come back.
    Cleared,
    Close,
}

pub struct SearchPanel {
    form: SearchForm,
    query_input: TextInput,
    filter_input: TextInput,
    focus: SearchFocus,
    metadata: CatalogMetadata,
}

impl SearchPanel {
    #[must_use]
    pub fn new() -> Self {
        let mut query_input =
            TextInput::new("Search").placeholder("Search books by title, author, ISBN...");
        query_input.set_focused(true);
        Self {
            form: SearchForm::new(),
            query_input,
            filter_input: TextInput::new("Filter"),
            focus: SearchFocus::Query,
            metadata: CatalogMetadata::default(),
        }
    }

    #[must_use]
    pub const fn form(&self) -> &SearchForm {
        &self.form
    }

    pub fn set_metadata(&mut self, metadata: CatalogMetadata) {
        self.metadata = metadata;
    }

    #[must_use]
    pub const fn metadata(&self) -> &CatalogMetadata {
        &self.metadata
    }

    /// One-line description of the active search for the catalog header.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        if !self.form.has_active_filters() {
            return None;
        }
        let (query, filters) = self.form.submission();
        let count = filters.active_count();
        let mut label = if query.is_empty() {
            "Search".to_string()
        } else {
            format!("Search: \"{query}\"")
        };
        if count > 0 {
            let plural = if count == 1 { "" } else { "s" };
            label.push_str(&format!(" · {count} filter{plural}"));
        }
        Some(label)
    }

    fn set_focus(&mut self, focus: SearchFocus) {
        self.query_input.set_focused(focus == SearchFocus::Query);
        self.focus = focus;
        if let SearchFocus::Filter(field) = focus {
            let mut input = TextInput::new(field.label()).with_value(self.form.value(field));
            input.set_focused(!field.is_select() && field != FilterField::AvailableOnly);
            self.filter_input = input;
        }
    }

    fn focus_next(&mut self) {
        let next = match self.focus {
            SearchFocus::Query if self.form.shows_filters() => {
                SearchFocus::Filter(FilterField::ALL[0])
            }
            SearchFocus::Query => SearchFocus::Query,
            SearchFocus::Filter(field) if field == FilterField::AvailableOnly => {
                SearchFocus::Query
            }
            SearchFocus::Filter(field) => SearchFocus::Filter(field.next()),
        };
        self.set_focus(next);
    }

    fn focus_previous(&mut self) {
        let previous = match self.focus {
            SearchFocus::Query if self.form.shows_filters() => {
                SearchFocus::Filter(FilterField::AvailableOnly)
            }
            SearchFocus::Query => SearchFocus::Query,
            SearchFocus::Filter(field) if field == FilterField::ALL[0] => SearchFocus::Query,
            SearchFocus::Filter(field) => SearchFocus::Filter(field.previous()),
        };
        self.set_focus(previous);
    }

    fn submit(&mut self) -> SearchAction {
        self.form.set_query(self.query_input.value());
        let (query, filters) = self.form.submission();
        SearchAction::Submit { query, filters }
    }

    fn clear(&mut self) -> SearchAction {
        self.form.clear();
        self.query_input.clear();
        self.set_focus(SearchFocus::Query);
        SearchAction::Cleared
    }

    /// Resets the form without leaving the catalog.
    pub fn reset(&mut self) {
        self.clear();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> SearchAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return SearchAction::Close,
            KeyCode::Enter => return self.submit(),
            KeyCode::Char('f') if ctrl => {
                self.form.toggle_filters();
                if !self.form.shows_filters() {
                    self.set_focus(SearchFocus::Query);
                }
            }
            KeyCode::Char('x') if ctrl => return self.clear(),
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_previous(),
            _ => match self.focus {
                SearchFocus::Query => {
                    self.query_input.handle_key(key);
                    self.form.set_query(self.query_input.value());
                }
                SearchFocus::Filter(field) => self.edit_filter(field, key),
            },
        }
        SearchAction::None
    }

    fn edit_filter(&mut self, field: FilterField, key: KeyEvent) {
        if field == FilterField::AvailableOnly {
            if matches!(key.code, KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right) {
                self.form.toggle_available_only();
            }
        } else if field.is_select() {
            let forward = match key.code {
                KeyCode::Right | KeyCode::Char(' ') => true,
                KeyCode::Left => false,
                _ => return,
            };
            let options = self.metadata.options(field).to_vec();
            self.form.cycle(field, &options, forward);
        } else if self.filter_input.handle_key(key) {
            self.form.update(field, self.filter_input.value());
            return;
        } else {
            return;
        }
        self.filter_input.set_value(self.form.value(field));
    }

    fn filter_line(&self, field: FilterField) -> Line<'static> {
        let focused = self.focus == SearchFocus::Filter(field);
        let marker = if focused { "▶ " } else { "  " };
        let label_style = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };

        let value = if focused && !field.is_select() && field != FilterField::AvailableOnly {
            format!("{}▏", self.filter_input.value())
        } else {
            match field {
                FilterField::AvailableOnly => {
                    if self.form.filters().available_only {
                        "[x]".to_string()
                    } else {
                        "[ ]".to_string()
                    }
                }
                _ => {
                    let value = self.form.value(field);
                    if value.is_empty() {
                        "any".to_string()
                    } else {
                        value
                    }
                }
            }
        };
        let hint = if focused && field.is_select() {
            "  ←/→"
        } else {
            ""
        };

        Line::from(vec![
            Span::styled(format!("{marker}{:<15}", field.label()), label_style),
            Span::raw(value),
            Span::styled(hint, Style::default().fg(Color::DarkGray)),
        ])
    }
}

impl Default for SearchPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for &SearchPanel {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let filter_rows = if self.form.shows_filters() {
            u16::try_from(FilterField::ALL.len()).unwrap_or(0) + 1
        } else {
            0
        };
        let popup = centered_fixed(POPUP_WIDTH, 3 + filter_rows + 4, area);
        Clear.render(popup, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Search ");
        let inner = block.inner(popup);
        block.render(popup, buf);

        let [query_area, filters_area, footer_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(filter_rows),
            Constraint::Min(1),
        ])
        .areas(inner);

        self.query_input.render(query_area, buf);

        if self.form.shows_filters() {
            let mut lines = vec![Line::styled(
                "Advanced Filters",
                Style::default().add_modifier(Modifier::BOLD),
            )];
            lines.extend(FilterField::ALL.iter().map(|f| self.filter_line(*f)));
            Paragraph::new(lines).render(filters_area, buf);
        }

        let hint = Style::default().fg(Color::DarkGray);
        let mut footer = vec![
            Span::styled("⏎ search · ", hint),
            Span::styled("Ctrl+F filters · ", hint),
        ];
        if self.form.has_active_filters() {
            footer.push(Span::styled("Ctrl+X clear all · ", Style::default().fg(Color::Yellow)));
        }
        footer.push(Span::styled("Esc close", hint));
        Paragraph::new(Line::from(footer)).render(
            Rect::new(footer_area.x, footer_area.bottom().saturating_sub(1), footer_area.width, 1),
            buf,
        );
    }
}
