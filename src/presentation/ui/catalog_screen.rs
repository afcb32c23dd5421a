//! Catalog screen: tabbed grid of book cards with lazily loaded covers.

use std::collections::HashMap;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, StatefulWidget, Tabs, Widget},
};
use ratatui_image::picker::Picker;
use tokio::sync::mpsc;
use tracing::debug;

use crate::application::services::{CoverMetrics, optimize_cover_url};
use crate::domain::entities::{Book, BookId, CoverOptions, Page};
use crate::domain::ports::CoverFetchPort;
use crate::presentation::cover::{CARD_COVER_WIDTH, CoverEvent, CoverSlot, CoverTransition};
use crate::presentation::widgets::{BookCard, CARD_HEIGHT, CARD_WIDTH, StatusBar, StatusLevel};

/// Book lists offered as tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CatalogTab {
    #[default]
    All,
    Trending,
    NewArrivals,
    ForYou,
}

impl CatalogTab {
    pub const ALL: [Self; 4] = [Self::All, Self::Trending, Self::NewArrivals, Self::ForYou];

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::All => "All Books",
            Self::Trending => "Trending",
            Self::NewArrivals => "New Arrivals",
            Self::ForYou => "For You",
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::All => 0,
            Self::Trending => 1,
            Self::NewArrivals => 2,
            Self::ForYou => 3,
        }
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    #[must_use]
    pub const fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Only the full catalog is paginated; the other lists are capped.
    #[must_use]
    pub const fn is_paged(self) -> bool {
        matches!(self, Self::All)
    }
}

/// Position of the shown page within a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub number: u32,
    pub total_pages: u32,
    pub total_elements: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> From<&Page<T>> for PageInfo {
    fn from(page: &Page<T>) -> Self {
        Self {
            number: page.number,
            total_pages: page.total_pages,
            total_elements: page.total_elements,
            has_next: page.has_next(),
            has_previous: page.has_previous(),
        }
    }
}

/// What the app should do after a key press on the grid.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogKeyResult {
    Consumed,
    Ignored,
    SwitchTab(CatalogTab),
    ChangePage(u32),
    OpenDetail(Book),
    OpenSearch,
    OpenAddBook,
    ClearSearch,
    Reload,
}

pub struct CatalogScreenState {
    tab: CatalogTab,
    books: Vec<Book>,
    page: Option<PageInfo>,
    selected: usize,
    first_row: u16,
    grid_area: Rect,
    covers: HashMap<BookId, CoverSlot>,
    cover_options: CoverOptions,
    fetcher: Arc<dyn CoverFetchPort>,
    cover_tx: mpsc::UnboundedSender<CoverEvent>,
    metrics: CoverMetrics,
    loading: bool,
    search_label: Option<String>,
    status: Option<(StatusLevel, String)>,
    tick: u64,
}

impl CatalogScreenState {
    #[must_use]
    pub fn new(
        cover_options: CoverOptions,
        fetcher: Arc<dyn CoverFetchPort>,
        cover_tx: mpsc::UnboundedSender<CoverEvent>,
    ) -> Self {
        Self {
            tab: CatalogTab::All,
            books: Vec::new(),
            page: None,
            selected: 0,
            first_row: 0,
            grid_area: Rect::default(),
            covers: HashMap::new(),
            cover_options,
            fetcher,
            cover_tx,
            metrics: CoverMetrics::new(),
            loading: true,
            search_label: None,
            status: None,
            tick: 0,
        }
    }

    #[must_use]
    pub const fn tab(&self) -> CatalogTab {
        self.tab
    }

    /// Switches tab and waits for its list.
    pub fn set_tab(&mut self, tab: CatalogTab) {
        self.tab = tab;
        self.loading = true;
        self.status = None;
    }

    #[must_use]
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    #[must_use]
    pub const fn page(&self) -> Option<PageInfo> {
        self.page
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    #[must_use]
    pub fn selected_book(&self) -> Option<&Book> {
        self.books.get(self.selected)
    }

    #[must_use]
    pub const fn metrics(&self) -> &CoverMetrics {
        &self.metrics
    }

    #[must_use]
    pub fn cover(&self, id: BookId) -> Option<&CoverSlot> {
        self.covers.get(&id)
    }

    /// Describes the active search, or `None` when browsing.
    pub fn set_search_label(&mut self, label: Option<String>) {
        self.search_label = label;
    }

    pub fn set_status(&mut self, level: StatusLevel, message: impl Into<String>) {
        self.status = Some((level, message.into()));
    }

    /// Shows a page for `tab`. Returns false if another tab is active.
    pub fn show_page(&mut self, tab: CatalogTab, page: Page<Book>) -> bool {
        if tab != self.tab {
            debug!(tab = tab.title(), "Dropping page for inactive tab");
            return false;
        }
        self.page = Some(PageInfo::from(&page));
        self.set_books(page.content);
        true
    }

    /// Shows an unpaged list for `tab`. Returns false if another tab is active.
    pub fn show_list(&mut self, tab: CatalogTab, books: Vec<Book>) -> bool {
        if tab != self.tab {
            debug!(tab = tab.title(), "Dropping list for inactive tab");
            return false;
        }
        self.page = None;
        self.set_books(books);
        true
    }

    /// Puts a freshly created book at the top of the grid.
    pub fn prepend_book(&mut self, book: Book) {
        self.covers.remove(&book.id);
        let slot = self.new_slot(&book);
        self.covers.insert(book.id, slot);
        self.books.insert(0, book);
        self.selected = 0;
        self.first_row = 0;
    }

    /// Applies a refreshed record to the card showing it.
    pub fn update_book(&mut self, book: &Book) {
        if let Some(existing) = self.books.iter_mut().find(|b| b.id == book.id) {
            existing.clone_from(book);
            if let Some(slot) = self.covers.get_mut(&book.id) {
                slot.update_book(book);
            }
        }
    }

    /// Replaces the shown books, keeping the loaders of books still listed.
    fn set_books(&mut self, books: Vec<Book>) {
        let mut covers = std::mem::take(&mut self.covers);
        for book in &books {
            let slot = match covers.remove(&book.id) {
                Some(mut slot) => {
                    slot.update_book(book);
                    slot
                }
                None => self.new_slot(book),
            };
            self.covers.insert(book.id, slot);
        }
        // Loaders for books no longer listed drop here and cancel their tasks.
        drop(covers);

        self.books = books;
        self.selected = 0;
        self.first_row = 0;
        self.loading = false;
    }

    fn new_slot(&self, book: &Book) -> CoverSlot {
        CoverSlot::for_card(
            book,
            &self.cover_options,
            Arc::clone(&self.fetcher),
            self.cover_tx.clone(),
        )
    }

    /// Cover URLs of the listed books as the cards request them, for preloading.
    #[must_use]
    pub fn cover_urls(&self) -> Vec<String> {
        self.books
            .iter()
            .filter_map(Book::cover_url)
            .map(|url| optimize_cover_url(url, Some(CARD_COVER_WIDTH)))
            .collect()
    }

    /// Routes a cover event to its loader and records the outcome.
    pub fn handle_cover_event(&mut self, event: CoverEvent) -> Option<CoverTransition> {
        let slot = self.covers.get_mut(&BookId(event.key.0))?;
        let transition = slot.handle_event(event)?;
        match transition {
            CoverTransition::Loaded { elapsed } => self.metrics.record_load(elapsed),
            CoverTransition::FailedFallback => self.metrics.record_error(),
            CoverTransition::Retrying { .. } => {}
        }
        Some(transition)
    }

    /// Advances the skeleton shimmer.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    fn columns(&self) -> u16 {
        columns_for(self.grid_area.width)
    }

    fn visible_rows(&self) -> u16 {
        (self.grid_area.height / CARD_HEIGHT).max(1)
    }

    /// The scrolled window over the grid, in grid coordinates.
    fn viewport(&self) -> Rect {
        Rect::new(
            0,
            self.first_row.saturating_mul(CARD_HEIGHT),
            self.columns().saturating_mul(CARD_WIDTH),
            self.grid_area.height,
        )
    }

    fn row_on_screen(&self, row: u16) -> bool {
        row >= self.first_row && row < self.first_row + self.visible_rows()
    }

    /// Feeds card positions to the cover loaders and prepares the images
    /// of cards on screen. Runs before each draw with the last layout.
    pub fn sync_covers(&mut self, picker: &Picker) {
        if self.grid_area.is_empty() {
            return;
        }

        let columns = self.columns();
        let viewport = self.viewport();
        for (index, book) in self.books.iter().enumerate() {
            let card = card_rect(index, columns);
            let on_screen = self.row_on_screen(card.y / CARD_HEIGHT);
            if let Some(slot) = self.covers.get_mut(&book.id) {
                slot.observe(card, viewport);
                if on_screen {
                    slot.sync_surface(picker);
                } else {
                    slot.release_surface();
                }
            }
        }
    }

    fn ensure_selected_visible(&mut self) {
        let columns = usize::from(self.columns());
        let row = u16::try_from(self.selected / columns).unwrap_or(u16::MAX);
        let visible = self.visible_rows();
        if row < self.first_row {
            self.first_row = row;
        } else if row >= self.first_row + visible {
            self.first_row = row + 1 - visible;
        }
    }

    fn move_selection(&mut self, delta: isize) {
        if self.books.is_empty() {
            return;
        }
        let last = self.books.len() - 1;
        self.selected = self.selected.saturating_add_signed(delta).min(last);
        self.ensure_selected_visible();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> CatalogKeyResult {
        #[allow(clippy::cast_possible_wrap)]
        let columns = usize::from(self.columns()) as isize;

        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.move_selection(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-columns),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(columns),
            KeyCode::Home => self.move_selection(isize::MIN),
            KeyCode::End => self.move_selection(isize::MAX),
            KeyCode::Enter => {
                return self
                    .selected_book()
                    .cloned()
                    .map_or(CatalogKeyResult::Consumed, CatalogKeyResult::OpenDetail);
            }
            KeyCode::Tab => return CatalogKeyResult::SwitchTab(self.tab.next()),
            KeyCode::BackTab => return CatalogKeyResult::SwitchTab(self.tab.previous()),
            KeyCode::Char(c @ '1'..='4') => {
                let index = usize::from(c as u8 - b'1');
                return CatalogKeyResult::SwitchTab(CatalogTab::ALL[index]);
            }
            KeyCode::Char('n') => {
                return match self.page {
                    Some(page) if page.has_next && !self.loading => {
                        CatalogKeyResult::ChangePage(page.number + 1)
                    }
                    _ => CatalogKeyResult::Consumed,
                };
            }
            KeyCode::Char('p') => {
                return match self.page {
                    Some(page) if page.has_previous && !self.loading => {
                        CatalogKeyResult::ChangePage(page.number - 1)
                    }
                    _ => CatalogKeyResult::Consumed,
                };
            }
            KeyCode::Char('/' | 's') => return CatalogKeyResult::OpenSearch,
            KeyCode::Char('a') => return CatalogKeyResult::OpenAddBook,
            KeyCode::Char('c') if self.search_label.is_some() => {
                return CatalogKeyResult::ClearSearch;
            }
            KeyCode::Char('r') => return CatalogKeyResult::Reload,
            _ => return CatalogKeyResult::Ignored,
        }
        CatalogKeyResult::Consumed
    }
}

/// Cards per grid row for a given width.
#[must_use]
pub fn columns_for(width: u16) -> u16 {
    (width / CARD_WIDTH).max(1)
}

/// Where card `index` sits in the unscrolled grid.
#[must_use]
pub fn card_rect(index: usize, columns: u16) -> Rect {
    let columns = usize::from(columns.max(1));
    let col = u16::try_from(index % columns).unwrap_or(u16::MAX);
    let row = u16::try_from(index / columns).unwrap_or(u16::MAX);
    Rect::new(
        col.saturating_mul(CARD_WIDTH),
        row.saturating_mul(CARD_HEIGHT),
        CARD_WIDTH,
        CARD_HEIGHT,
    )
}

pub struct CatalogScreen;

impl StatefulWidget for CatalogScreen {
    type State = CatalogScreenState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let search_rows = u16::from(state.search_label.is_some());
        let [tabs_area, search_area, grid_area, status_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(search_rows),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(area);

        render_tabs(state.tab, tabs_area, buf);
        if let Some(label) = &state.search_label {
            Paragraph::new(Line::from(vec![
                Span::styled(label.as_str(), Style::default().fg(Color::Yellow)),
                Span::styled("  (c to clear)", Style::default().fg(Color::DarkGray)),
            ]))
            .render(search_area, buf);
        }

        state.grid_area = grid_area;
        state.ensure_selected_visible();
        render_grid(state, grid_area, buf);
        render_status(state, status_area, buf);
    }
}

fn render_tabs(active: CatalogTab, area: Rect, buf: &mut Buffer) {
    let titles = CatalogTab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| format!("{} {}", i + 1, tab.title()));
    Tabs::new(titles)
        .select(active.index())
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
        .divider("│")
        .render(area, buf);
}

fn render_grid(state: &mut CatalogScreenState, area: Rect, buf: &mut Buffer) {
    if state.books.is_empty() {
        let message = if state.loading {
            "Loading books..."
        } else {
            "No books found"
        };
        let middle = Rect::new(area.x, area.y + area.height / 2, area.width, 1);
        Paragraph::new(Line::styled(message, Style::default().fg(Color::DarkGray)))
            .alignment(Alignment::Center)
            .render(middle, buf);
        return;
    }

    let columns = state.columns();
    let first_row = state.first_row;
    let visible_rows = state.visible_rows();
    let selected = state.selected;
    let tick = state.tick;

    let CatalogScreenState { books, covers, .. } = state;
    for (index, book) in books.iter().enumerate() {
        let card = card_rect(index, columns);
        let row = card.y / CARD_HEIGHT;
        if row < first_row || row >= first_row + visible_rows {
            continue;
        }
        let on_screen = Rect::new(
            area.x + card.x,
            area.y + (row - first_row) * CARD_HEIGHT,
            CARD_WIDTH,
            CARD_HEIGHT,
        )
        .intersection(area);
        if on_screen.is_empty() {
            continue;
        }
        if let Some(slot) = covers.get_mut(&book.id) {
            BookCard::new(book)
                .selected(index == selected)
                .tick(tick)
                .render(on_screen, buf, slot);
        }
    }
}

fn render_status(state: &CatalogScreenState, area: Rect, buf: &mut Buffer) {
    let summary = match state.page {
        Some(page) if page.total_pages > 1 => format!(
            "Page {} of {} · {} books",
            page.number + 1,
            page.total_pages,
            page.total_elements
        ),
        Some(page) => format!("{} books", page.total_elements),
        None => format!("{} books", state.books.len()),
    };

    let bar = match &state.status {
        Some((level, message)) => StatusBar::new().left(message.as_str()).level(*level),
        None if state.loading => StatusBar::info("Loading..."),
        None => StatusBar::info(summary),
    };
    let hints = if state.tab.is_paged() {
        "⏎ details · / search · a add · n/p page · q quit"
    } else {
        "⏎ details · / search · a add · q quit"
    };
    (&bar.center(state.metrics.to_string()).right(hints)).render(area, buf);
}
