//! Main application orchestrator.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind,
};
use futures_util::StreamExt;
use ratatui::{DefaultTerminal, Frame};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::domain::entities::{Book, BookId, CoverOptions, Page, PageRequest, SearchFilters};
use crate::domain::errors::ApiError;
use crate::domain::ports::{CatalogPort, CoverFetchPort, RecommendationPort};
use crate::infrastructure::image::{CoverPreloader, PreloadReport};
use crate::presentation::cover::CoverEvent;
use crate::presentation::events::EventHandler;
use crate::presentation::ui::{
    AddBookForm, CatalogKeyResult, CatalogMetadata, CatalogScreen, CatalogScreenState,
    CatalogTab, DetailAction, DetailView, DetailViewState, FormAction, SearchAction, SearchPanel,
};
use crate::presentation::widgets::{CoverRenderer, StatusLevel};

const TICK_RATE: Duration = Duration::from_millis(100);
const PRELOAD_DELAY: Duration = Duration::from_secs(1);
const LIST_LIMIT: u32 = 12;
const SIMILAR_LIMIT: u32 = 4;
const CREATE_FAILED_MESSAGE: &str = "Failed to create book. Please try again.";

#[derive(Debug)]
enum Action {
    PageLoaded {
        tab: CatalogTab,
        page: Page<Book>,
    },
    ListLoaded {
        tab: CatalogTab,
        books: Vec<Book>,
    },
    LoadFailed {
        tab: CatalogTab,
        error: ApiError,
    },
    MetadataLoaded(CatalogMetadata),
    BookCreated(Book),
    CreateFailed(ApiError),
    BookRefreshed(Book),
    AvailabilityChecked {
        id: BookId,
        available: bool,
    },
    SimilarLoaded {
        id: BookId,
        books: Vec<Book>,
    },
    Preloaded(PreloadReport),
}

enum Overlay {
    None,
    Search,
    AddBook(AddBookForm),
    Detail(Box<DetailViewState>),
}

/// Tunables the app is started with.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Books per page of the full catalog.
    pub page_size: u32,
    /// User the "For You" tab is computed for.
    pub user_id: u64,
    pub cover_options: CoverOptions,
    /// Warm the cover cache after each page load.
    pub preload: bool,
    pub preload_batch_size: usize,
    /// Translate wheel scrolling into grid movement.
    pub mouse: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            page_size: crate::domain::entities::DEFAULT_PAGE_SIZE,
            user_id: 1,
            cover_options: CoverOptions::default(),
            preload: true,
            preload_batch_size: 3,
            mouse: true,
        }
    }
}

pub struct App {
    running: bool,
    catalog: Arc<dyn CatalogPort>,
    recommendations: Arc<dyn RecommendationPort>,
    fetcher: Arc<dyn CoverFetchPort>,
    renderer: CoverRenderer,
    preloader: Arc<Mutex<CoverPreloader>>,
    preload_task: Option<JoinHandle<()>>,
    settings: AppSettings,
    screen: CatalogScreenState,
    search: SearchPanel,
    active_search: Option<(String, SearchFilters)>,
    overlay: Overlay,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    cover_tx: mpsc::UnboundedSender<CoverEvent>,
    cover_rx: mpsc::UnboundedReceiver<CoverEvent>,
}

impl App {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogPort>,
        recommendations: Arc<dyn RecommendationPort>,
        fetcher: Arc<dyn CoverFetchPort>,
        renderer: CoverRenderer,
        settings: AppSettings,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (cover_tx, cover_rx) = mpsc::unbounded_channel();
        let preloader = CoverPreloader::new(Arc::clone(&fetcher))
            .with_batch_size(settings.preload_batch_size);
        let screen = CatalogScreenState::new(
            settings.cover_options.clone(),
            Arc::clone(&fetcher),
            cover_tx.clone(),
        );

        Self {
            running: true,
            catalog,
            recommendations,
            fetcher,
            renderer,
            preloader: Arc::new(Mutex::new(preloader)),
            preload_task: None,
            settings,
            screen,
            search: SearchPanel::new(),
            active_search: None,
            overlay: Overlay::None,
            action_tx,
            action_rx,
            cover_tx,
            cover_rx,
        }
    }

    /// # Errors
    /// Returns error if drawing to the terminal fails.
    pub async fn run(mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        info!(
            protocol = ?self.renderer.protocol_type(),
            page_size = self.settings.page_size,
            "Starting catalog"
        );

        self.load_metadata();
        self.load_tab(0);

        self.run_event_loop(terminal).await?;

        if let Some(task) = self.preload_task.take() {
            task.abort();
        }
        info!("Application exiting normally");
        Ok(())
    }

    async fn run_event_loop(&mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        let mut terminal_events = EventStream::new();
        let mut tick_interval = interval(TICK_RATE);

        self.draw(terminal)?;

        while self.running {
            let terminal_event = terminal_events.next();

            tokio::select! {
                biased;

                Some(action) = self.action_rx.recv() => {
                    self.handle_action(action);
                    self.draw(terminal)?;
                }

                Some(event) = self.cover_rx.recv() => {
                    self.route_cover_event(event);
                    self.draw(terminal)?;
                }

                _ = tick_interval.tick() => {
                    self.tick();
                    self.draw(terminal)?;
                }

                Some(Ok(event)) = terminal_event => {
                    self.handle_terminal_event(event);
                    self.draw(terminal)?;
                }
            }
        }

        Ok(())
    }

    fn draw(&mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        self.sync_covers();
        terminal.draw(|frame| self.render(frame))?;
        Ok(())
    }

    /// Encodes decoded covers for cards on screen and drops the rest.
    fn sync_covers(&mut self) {
        let picker = self.renderer.picker();
        self.screen.sync_covers(picker);
        if let Overlay::Detail(detail) = &mut self.overlay {
            detail.sync_cover(picker);
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_stateful_widget(CatalogScreen, area, &mut self.screen);

        match &mut self.overlay {
            Overlay::None => {}
            Overlay::Search => frame.render_widget(&self.search, area),
            Overlay::AddBook(form) => frame.render_widget(&*form, area),
            Overlay::Detail(detail) => {
                frame.render_stateful_widget(DetailView, area, detail.as_mut());
            }
        }
    }

    fn tick(&mut self) {
        self.screen.tick();
        if let Overlay::Detail(detail) = &mut self.overlay {
            detail.tick();
        }
    }

    /// The detail popup and the grid share one channel; generations tell
    /// their loaders apart.
    fn route_cover_event(&mut self, event: CoverEvent) {
        if let Overlay::Detail(detail) = &mut self.overlay
            && detail.owns(&event)
        {
            detail.handle_cover_event(event);
            return;
        }
        self.screen.handle_cover_event(event);
    }

    fn handle_terminal_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if EventHandler::is_press(&key) => self.handle_key(key),
            Event::Mouse(mouse) if self.settings.mouse => self.handle_mouse(mouse),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if !matches!(self.overlay, Overlay::None) {
            return;
        }
        let code = match mouse.kind {
            MouseEventKind::ScrollDown => KeyCode::Down,
            MouseEventKind::ScrollUp => KeyCode::Up,
            _ => return,
        };
        self.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if EventHandler::is_force_quit(&key) {
            self.running = false;
            return;
        }

        match &mut self.overlay {
            Overlay::Search => {
                let action = self.search.handle_key(key);
                self.handle_search_action(action);
            }
            Overlay::AddBook(form) => {
                let action = form.handle_key(key);
                self.handle_form_action(action);
            }
            Overlay::Detail(detail) => {
                let action = detail.handle_key(key);
                self.handle_detail_action(action);
            }
            Overlay::None => {
                if EventHandler::is_quit_event(&key) {
                    self.running = false;
                    return;
                }
                let result = self.screen.handle_key(key);
                self.handle_catalog_result(result);
            }
        }
    }

    fn handle_catalog_result(&mut self, result: CatalogKeyResult) {
        match result {
            CatalogKeyResult::Consumed | CatalogKeyResult::Ignored => {}
            CatalogKeyResult::SwitchTab(tab) => {
                if tab != self.screen.tab() {
                    self.screen.set_tab(tab);
                    self.load_tab(0);
                }
            }
            CatalogKeyResult::ChangePage(page) => {
                self.screen.set_loading(true);
                self.load_tab(page);
            }
            CatalogKeyResult::OpenDetail(book) => self.open_detail(book),
            CatalogKeyResult::OpenSearch => self.overlay = Overlay::Search,
            CatalogKeyResult::OpenAddBook => self.overlay = Overlay::AddBook(AddBookForm::new()),
            CatalogKeyResult::ClearSearch => {
                self.search.reset();
                self.apply_search(None);
            }
            CatalogKeyResult::Reload => {
                let page = self.screen.page().map_or(0, |p| p.number);
                self.screen.set_loading(true);
                self.load_tab(page);
            }
        }
    }

    fn handle_search_action(&mut self, action: SearchAction) {
        match action {
            SearchAction::None => {}
            SearchAction::Close => self.overlay = Overlay::None,
            SearchAction::Submit { query, filters } => {
                self.overlay = Overlay::None;
                if query.trim().is_empty() && filters.is_empty() {
                    self.apply_search(None);
                } else {
                    self.apply_search(Some((query, filters)));
                }
            }
            SearchAction::Cleared => self.apply_search(None),
        }
    }

    /// Makes `search` the active query and reloads the first page of the
    /// full catalog with it.
    fn apply_search(&mut self, search: Option<(String, SearchFilters)>) {
        let label = search.as_ref().and_then(|_| self.search.summary());
        debug!(active = search.is_some(), "Applying search");
        self.active_search = search;
        self.screen.set_search_label(label);
        self.screen.set_tab(CatalogTab::All);
        self.load_tab(0);
    }

    fn handle_form_action(&mut self, action: FormAction) {
        match action {
            FormAction::None => {}
            FormAction::Cancel => self.overlay = Overlay::None,
            FormAction::Submit(book) => {
                info!(title = %book.title, "Creating book");
                let catalog = Arc::clone(&self.catalog);
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let action = match catalog.create_book(&book).await {
                        Ok(created) => Action::BookCreated(created),
                        Err(e) => Action::CreateFailed(e),
                    };
                    let _ = tx.send(action);
                });
            }
        }
    }

    fn handle_detail_action(&mut self, action: DetailAction) {
        match action {
            DetailAction::None => {}
            DetailAction::Close => self.overlay = Overlay::None,
            DetailAction::Open(id) => {
                let book = match &self.overlay {
                    Overlay::Detail(detail) => {
                        detail.similar().iter().find(|b| b.id == id).cloned()
                    }
                    _ => None,
                };
                if let Some(book) = book {
                    self.open_detail(book);
                }
            }
        }
    }

    /// Shows the popup right away and refreshes its record, live
    /// availability and similar books in the background.
    fn open_detail(&mut self, book: Book) {
        let id = book.id;
        debug!(book = %id, "Opening detail");
        let detail = DetailViewState::new(book, Arc::clone(&self.fetcher), self.cover_tx.clone());
        self.overlay = Overlay::Detail(Box::new(detail));

        let catalog = Arc::clone(&self.catalog);
        let recommendations = Arc::clone(&self.recommendations);
        let tx = self.action_tx.clone();

        tokio::spawn(async move {
            let (book, available, similar) = tokio::join!(
                catalog.get_book(id),
                catalog.check_availability(id),
                recommendations.similar(id, SIMILAR_LIMIT),
            );

            match book {
                Ok(book) => {
                    let _ = tx.send(Action::BookRefreshed(book));
                }
                Err(e) => warn!(book = %id, error = %e, "Failed to refresh book"),
            }
            match available {
                Ok(available) => {
                    let _ = tx.send(Action::AvailabilityChecked { id, available });
                }
                Err(e) => warn!(book = %id, error = %e, "Failed to check availability"),
            }
            match similar {
                Ok(books) => {
                    let _ = tx.send(Action::SimilarLoaded { id, books });
                }
                Err(e) => warn!(book = %id, error = %e, "Failed to load similar books"),
            }
        });
    }

    /// Fetches the active tab. `page` only matters for the full catalog.
    fn load_tab(&self, page: u32) {
        let tab = self.screen.tab();
        let tx = self.action_tx.clone();
        let catalog = Arc::clone(&self.catalog);
        let recommendations = Arc::clone(&self.recommendations);
        let request = PageRequest::new(page).with_size(self.settings.page_size);
        let search = self.active_search.clone();
        let user_id = self.settings.user_id;

        debug!(tab = tab.title(), page, "Loading books");

        tokio::spawn(async move {
            let action = match tab {
                CatalogTab::All => {
                    let result = match &search {
                        Some((query, filters)) => {
                            catalog.search_books(query, filters, &request).await
                        }
                        None => catalog.list_books(&request).await,
                    };
                    result.map(|page| Action::PageLoaded { tab, page })
                }
                CatalogTab::Trending => recommendations
                    .trending(LIST_LIMIT)
                    .await
                    .map(|books| Action::ListLoaded { tab, books }),
                CatalogTab::NewArrivals => recommendations
                    .new_arrivals(LIST_LIMIT)
                    .await
                    .map(|books| Action::ListLoaded { tab, books }),
                CatalogTab::ForYou => recommendations
                    .for_user(user_id, LIST_LIMIT)
                    .await
                    .map(|books| Action::ListLoaded { tab, books }),
            };
            let _ = tx.send(action.unwrap_or_else(|error| Action::LoadFailed { tab, error }));
        });
    }

    /// Loads the select options of the search filters.
    fn load_metadata(&self) {
        let catalog = Arc::clone(&self.catalog);
        let tx = self.action_tx.clone();

        tokio::spawn(async move {
            let (categories, languages, publishers) = tokio::join!(
                catalog.categories(),
                catalog.languages(),
                catalog.publishers(),
            );
            let or_empty = |result: Result<Vec<String>, ApiError>, what: &str| {
                result.unwrap_or_else(|e| {
                    warn!(error = %e, "Failed to load {what}");
                    Vec::new()
                })
            };
            let metadata = CatalogMetadata {
                categories: or_empty(categories, "categories"),
                languages: or_empty(languages, "languages"),
                publishers: or_empty(publishers, "publishers"),
            };
            let _ = tx.send(Action::MetadataLoaded(metadata));
        });
    }

    /// Warms the cover cache for the shown page after a short delay.
    /// A pending or running preload of the previous page is cancelled.
    fn schedule_preload(&mut self) {
        if let Some(task) = self.preload_task.take() {
            task.abort();
        }
        if !self.settings.preload {
            return;
        }
        let urls = self.screen.cover_urls();
        if urls.is_empty() {
            return;
        }
        let preloader = Arc::clone(&self.preloader);
        let tx = self.action_tx.clone();
        self.preload_task = Some(tokio::spawn(async move {
            tokio::time::sleep(PRELOAD_DELAY).await;
            let mut preloader = preloader.lock().await;
            let report = preloader.preload(urls).await;
            let _ = tx.send(Action::Preloaded(report));
        }));
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::PageLoaded { tab, page } => {
                info!(
                    tab = tab.title(),
                    page = page.number,
                    count = page.content.len(),
                    "Page loaded"
                );
                if self.screen.show_page(tab, page) {
                    self.schedule_preload();
                }
            }
            Action::ListLoaded { tab, books } => {
                info!(tab = tab.title(), count = books.len(), "List loaded");
                if self.screen.show_list(tab, books) {
                    self.schedule_preload();
                }
            }
            Action::LoadFailed { tab, error } => {
                error!(tab = tab.title(), error = %error, "Failed to load books");
                if tab == self.screen.tab() {
                    self.screen.set_loading(false);
                    self.screen.set_status(
                        StatusLevel::Error,
                        "Failed to load books. Press r to retry.",
                    );
                }
            }
            Action::MetadataLoaded(metadata) => {
                debug!(
                    categories = metadata.categories.len(),
                    languages = metadata.languages.len(),
                    publishers = metadata.publishers.len(),
                    "Filter options loaded"
                );
                self.search.set_metadata(metadata);
            }
            Action::BookCreated(book) => {
                info!(book = %book.id, title = %book.title, "Book created");
                if matches!(self.overlay, Overlay::AddBook(_)) {
                    self.overlay = Overlay::None;
                }
                let message = format!("Added \"{}\"", book.title);
                if self.screen.tab() == CatalogTab::All && self.active_search.is_none() {
                    self.screen.prepend_book(book);
                } else {
                    self.search.reset();
                    self.apply_search(None);
                }
                self.screen.set_status(StatusLevel::Success, message);
            }
            Action::CreateFailed(error) => {
                error!(error = %error, "Failed to create book");
                if let Overlay::AddBook(form) = &mut self.overlay {
                    form.set_submit_error(CREATE_FAILED_MESSAGE);
                }
            }
            Action::BookRefreshed(book) => {
                self.screen.update_book(&book);
                if let Overlay::Detail(detail) = &mut self.overlay {
                    detail.refresh(book);
                }
            }
            Action::AvailabilityChecked { id, available } => {
                if let Overlay::Detail(detail) = &mut self.overlay {
                    detail.set_availability(id, available);
                }
            }
            Action::SimilarLoaded { id, books } => {
                if let Overlay::Detail(detail) = &mut self.overlay {
                    detail.set_similar(id, books);
                }
            }
            Action::Preloaded(report) => {
                debug!(
                    attempted = report.attempted,
                    failed = report.failed,
                    skipped = report.skipped,
                    "Preload finished"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{LoadState, sample_book};
    use crate::domain::ports::mocks::{MockCatalog, MockRecommendations, ScriptedFetcher};
    use ratatui::{Terminal, backend::TestBackend};

    fn books(count: u64) -> Vec<Book> {
        (1..=count)
            .map(|i| sample_book(i, &format!("Book {i}"), Some(&format!("https://covers/{i}.jpg"))))
            .collect()
    }

    fn settings() -> AppSettings {
        AppSettings {
            page_size: 4,
            preload: false,
            ..AppSettings::default()
        }
    }

    fn app_with(catalog: MockCatalog, fetcher: Arc<ScriptedFetcher>, settings: AppSettings) -> App {
        App::new(
            Arc::new(catalog),
            Arc::new(MockRecommendations::new(books(6))),
            fetcher,
            CoverRenderer::halfblocks(),
            settings,
        )
    }

    fn app() -> App {
        app_with(
            MockCatalog::new(books(10)),
            Arc::new(ScriptedFetcher::new()),
            settings(),
        )
    }

    async fn pump(app: &mut App) {
        let action = app.action_rx.recv().await.unwrap();
        app.handle_action(action);
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn draw(app: &mut App) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(200, 40)).unwrap();
        app.sync_covers();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
    }

    #[tokio::test]
    async fn test_first_page_is_loaded() {
        let mut app = app();
        app.load_tab(0);
        pump(&mut app).await;

        assert_eq!(app.screen.books().len(), 4);
        let page = app.screen.page().unwrap();
        assert_eq!(page.total_pages, 3);
        assert!(!app.screen.is_loading());
    }

    #[tokio::test]
    async fn test_next_page_key() {
        let mut app = app();
        app.load_tab(0);
        pump(&mut app).await;

        app.handle_key(key(KeyCode::Char('n')));
        assert!(app.screen.is_loading());
        pump(&mut app).await;

        assert_eq!(app.screen.page().unwrap().number, 1);
        assert_eq!(app.screen.books()[0].title, "Book 5");
    }

    #[tokio::test]
    async fn test_switching_tabs_loads_lists() {
        let mut app = app();
        app.load_tab(0);
        pump(&mut app).await;

        app.handle_key(key(KeyCode::Char('3')));
        assert_eq!(app.screen.tab(), CatalogTab::NewArrivals);
        pump(&mut app).await;

        assert!(app.screen.page().is_none());
        assert_eq!(app.screen.books()[0].title, "Book 6");
    }

    #[tokio::test]
    async fn test_results_for_left_tab_are_dropped() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('2')));
        app.screen.set_tab(CatalogTab::ForYou);
        pump(&mut app).await;

        assert!(app.screen.books().is_empty());
        assert!(app.screen.is_loading());
    }

    #[tokio::test]
    async fn test_load_failure_sets_status() {
        let mut app = app_with(
            MockCatalog::failing(),
            Arc::new(ScriptedFetcher::new()),
            settings(),
        );
        app.load_tab(0);
        pump(&mut app).await;

        assert!(!app.screen.is_loading());
        let terminal = draw(&mut app);
        let content: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect();
        assert!(content.contains("Failed to load books"));
    }

    #[tokio::test]
    async fn test_search_submit_uses_query() {
        let mut app = app();
        app.load_tab(0);
        pump(&mut app).await;

        app.handle_key(key(KeyCode::Char('/')));
        assert!(matches!(app.overlay, Overlay::Search));
        type_text(&mut app, "Book 7");
        app.handle_key(key(KeyCode::Enter));

        assert!(matches!(app.overlay, Overlay::None));
        assert_eq!(app.active_search.as_ref().unwrap().0, "Book 7");
        pump(&mut app).await;

        assert_eq!(app.screen.books().len(), 1);
        assert_eq!(app.screen.books()[0].title, "Book 7");

        // 'c' drops the search and brings back the full catalog.
        app.handle_key(key(KeyCode::Char('c')));
        assert!(app.active_search.is_none());
        pump(&mut app).await;
        assert_eq!(app.screen.books().len(), 4);
    }

    #[tokio::test]
    async fn test_metadata_feeds_search_panel() {
        let mut app = app();
        app.load_metadata();
        pump(&mut app).await;

        assert_eq!(
            app.search.metadata().categories,
            vec!["Science Fiction".to_string()]
        );
    }

    fn fill_form(app: &mut App) {
        let Overlay::AddBook(form) = &mut app.overlay else {
            panic!("form not open");
        };
        form.set_value(crate::presentation::ui::BookField::Title, "Kindred");
        form.set_value(crate::presentation::ui::BookField::Author, "Octavia E. Butler");
        form.set_value(crate::presentation::ui::BookField::Isbn, "978-0807083697");
        form.set_value(crate::presentation::ui::BookField::Category, "Fiction");
        form.set_value(crate::presentation::ui::BookField::Publisher, "Beacon Press");
        form.set_value(crate::presentation::ui::BookField::PageCount, "264");
    }

    #[tokio::test]
    async fn test_created_book_is_prepended() {
        let mut app = app();
        app.load_tab(0);
        pump(&mut app).await;

        app.handle_key(key(KeyCode::Char('a')));
        fill_form(&mut app);
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        pump(&mut app).await;

        assert!(matches!(app.overlay, Overlay::None));
        assert_eq!(app.screen.books()[0].title, "Kindred");
        assert_eq!(app.screen.books().len(), 5);
    }

    #[tokio::test]
    async fn test_failed_create_keeps_form_open() {
        let mut app = app_with(
            MockCatalog::failing(),
            Arc::new(ScriptedFetcher::new()),
            settings(),
        );

        app.handle_key(key(KeyCode::Char('a')));
        fill_form(&mut app);
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        pump(&mut app).await;

        let Overlay::AddBook(form) = &app.overlay else {
            panic!("form closed");
        };
        assert_eq!(form.submit_error(), Some(CREATE_FAILED_MESSAGE));
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn test_detail_refreshes_in_background() {
        let mut app = app();
        app.load_tab(0);
        pump(&mut app).await;

        app.handle_key(key(KeyCode::Enter));
        assert!(matches!(app.overlay, Overlay::Detail(_)));

        // Refreshed record, availability, similar books.
        for _ in 0..3 {
            pump(&mut app).await;
        }

        let Overlay::Detail(detail) = &app.overlay else {
            panic!("detail closed");
        };
        assert_eq!(detail.book().id, BookId(1));
        assert!(detail.is_available());
        assert_eq!(detail.similar().len(), 3);
        assert!(detail.similar().iter().all(|b| b.id != BookId(1)));

        app.handle_key(key(KeyCode::Esc));
        assert!(matches!(app.overlay, Overlay::None));
        assert!(app.running);
    }

    #[tokio::test]
    async fn test_detail_cover_events_reach_the_popup() {
        let mut app = app();
        app.open_detail(sample_book(9, "Detail", Some("https://covers/9.jpg")));

        let event = app.cover_rx.recv().await.unwrap();
        app.route_cover_event(event);

        let Overlay::Detail(detail) = &app.overlay else {
            panic!("detail closed");
        };
        assert_eq!(detail.cover().loader().state(), LoadState::Loaded);
    }

    #[tokio::test]
    async fn test_grid_covers_start_after_render() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let mut app = app_with(MockCatalog::new(books(10)), Arc::clone(&fetcher), settings());
        app.load_tab(0);
        pump(&mut app).await;

        draw(&mut app);
        draw(&mut app);
        let event = app.cover_rx.recv().await.unwrap();
        app.route_cover_event(event);

        assert_eq!(app.screen.metrics().total_loaded(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_runs_after_page_load() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let settings = AppSettings {
            preload: true,
            ..settings()
        };
        let mut app = app_with(MockCatalog::new(books(10)), Arc::clone(&fetcher), settings);
        app.load_tab(0);
        pump(&mut app).await;

        let Action::Preloaded(report) = app.action_rx.recv().await.unwrap() else {
            panic!("expected preload report");
        };
        assert_eq!(report.attempted, 4);
        assert_eq!(fetcher.calls().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_change_cancels_running_preload() {
        let fetcher = Arc::new(ScriptedFetcher::new().with_latency(Duration::from_secs(1)));
        let settings = AppSettings {
            preload: true,
            ..settings()
        };
        let mut app = app_with(MockCatalog::new(books(10)), Arc::clone(&fetcher), settings);
        app.load_tab(0);
        pump(&mut app).await;

        // First batch of page 0 is in flight.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!fetcher.calls().is_empty());

        app.handle_key(key(KeyCode::Char('n')));
        pump(&mut app).await;
        assert_eq!(app.screen.page().unwrap().number, 1);

        let Action::Preloaded(report) = app.action_rx.recv().await.unwrap() else {
            panic!("expected preload report");
        };
        assert_eq!(report.attempted, 4);
        for i in 5..=8 {
            let url = format!("https://covers/{i}.jpg");
            assert_eq!(fetcher.calls_for(&url).len(), 1, "{url} not preloaded");
        }
        assert_eq!(fetcher.calls_for("https://covers/1.jpg").len(), 1);
    }

    #[test]
    fn test_quit_keys() {
        tokio_test::block_on(async {
            let mut browsing = app();
            browsing.handle_key(key(KeyCode::Char('q')));
            assert!(!browsing.running);

            let mut searching = app();
            searching.handle_key(key(KeyCode::Char('/')));
            searching.handle_key(key(KeyCode::Char('q')));
            assert!(searching.running, "typing q in the search box must not quit");
            searching.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
            assert!(!searching.running);
        });
    }
}
