//! A book's cover as a screen holds it: loader, image surface and placeholder.

use std::sync::Arc;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::StatefulWidget;
use ratatui_image::picker::Picker;
use tokio::sync::mpsc;

use crate::application::services::{CoverSize, PlaceholderCover, resolve_book_cover_sized};
use crate::domain::entities::{Book, CoverOptions};
use crate::domain::ports::CoverFetchPort;

use super::loader::{CoverEvent, CoverKey, CoverLoader, CoverTransition};
use super::view::{CoverSurface, CoverView};

/// Pixel width grid cards ask for; Open Library serves its medium rendition.
pub const CARD_COVER_WIDTH: u32 = 160;

pub struct CoverSlot {
    loader: CoverLoader,
    surface: CoverSurface,
    fallback: PlaceholderCover,
    width: Option<u32>,
}

impl std::fmt::Debug for CoverSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverSlot")
            .field("loader", &self.loader)
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

impl CoverSlot {
    /// Resolves the book's full-size cover and creates its loader.
    #[must_use]
    pub fn for_book(
        book: &Book,
        options: &CoverOptions,
        fetcher: Arc<dyn CoverFetchPort>,
        events_tx: mpsc::UnboundedSender<CoverEvent>,
    ) -> Self {
        Self::sized(book, None, options, fetcher, events_tx)
    }

    /// Same as [`for_book`](Self::for_book) with the rendition sized for a grid card.
    #[must_use]
    pub fn for_card(
        book: &Book,
        options: &CoverOptions,
        fetcher: Arc<dyn CoverFetchPort>,
        events_tx: mpsc::UnboundedSender<CoverEvent>,
    ) -> Self {
        Self::sized(book, Some(CARD_COVER_WIDTH), options, fetcher, events_tx)
    }

    fn sized(
        book: &Book,
        width: Option<u32>,
        options: &CoverOptions,
        fetcher: Arc<dyn CoverFetchPort>,
        events_tx: mpsc::UnboundedSender<CoverEvent>,
    ) -> Self {
        let request = resolve_book_cover_sized(book, options.retry_count, width);
        Self {
            loader: CoverLoader::new(CoverKey::from(book.id), request, options, fetcher, events_tx),
            surface: CoverSurface::new(),
            fallback: PlaceholderCover::new(&book.title, &book.author, CoverSize::Medium),
            width,
        }
    }

    #[must_use]
    pub const fn loader(&self) -> &CoverLoader {
        &self.loader
    }

    /// Picks up an edited record. Only a changed cover URL restarts loading.
    pub fn update_book(&mut self, book: &Book) -> bool {
        self.fallback = PlaceholderCover::new(&book.title, &book.author, CoverSize::Medium);
        let request =
            resolve_book_cover_sized(book, self.loader.request().max_attempts(), self.width);
        let replaced = self.loader.replace_request(request);
        if replaced {
            self.surface.clear();
        }
        replaced
    }

    pub fn observe(&mut self, container: Rect, viewport: Rect) {
        self.loader.observe(container, viewport);
    }

    pub fn reveal(&mut self) {
        self.loader.reveal();
    }

    pub fn handle_event(&mut self, event: CoverEvent) -> Option<CoverTransition> {
        self.loader.handle_event(event)
    }

    /// Encodes the loader's image for the terminal if it changed.
    pub fn sync_surface(&mut self, picker: &Picker) {
        self.surface.sync(self.loader.image(), picker);
    }

    /// Drops the encoded image; the decoded one stays with the loader.
    pub fn release_surface(&mut self) {
        self.surface.clear();
    }

    pub fn render(&mut self, area: Rect, buf: &mut Buffer, tick: u64) {
        CoverView::new(&self.loader, &self.fallback)
            .tick(tick)
            .render(area, buf, &mut self.surface);
    }
}
