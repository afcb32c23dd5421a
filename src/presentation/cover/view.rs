//! Cover rendering: placeholder block, shimmer skeleton, image, or a locally
//! drawn placeholder card.

use std::sync::Arc;

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, StatefulWidget, Widget, Wrap};
use ratatui_image::StatefulImage;
use ratatui_image::picker::Picker;
use ratatui_image::protocol::StatefulProtocol;

use crate::application::services::PlaceholderCover;
use crate::domain::entities::{LoadState, Placeholder};

use super::loader::CoverLoader;

const GRADIENT_TOP: (u8, u8, u8) = (219, 234, 254);
const GRADIENT_BOTTOM: (u8, u8, u8) = (199, 210, 254);
const ICON_COLOR: Color = Color::Rgb(99, 102, 241);
const BOOK_ICON: &str = "📖";

const SKELETON_BASE: Color = Color::Rgb(229, 231, 235);
const SKELETON_HIGHLIGHT: Color = Color::Rgb(249, 250, 251);

/// Terminal image protocol state for one cover.
///
/// Rebuilt only when the loader hands over a different image.
#[derive(Default)]
pub struct CoverSurface {
    protocol: Option<StatefulProtocol>,
    source: Option<Arc<image::DynamicImage>>,
}

impl std::fmt::Debug for CoverSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverSurface")
            .field("has_protocol", &self.protocol.is_some())
            .finish_non_exhaustive()
    }
}

impl CoverSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches the protocol to the loader's current image.
    pub fn sync(&mut self, image: Option<&Arc<image::DynamicImage>>, picker: &Picker) {
        match image {
            None => self.clear(),
            Some(img) => {
                let unchanged = self
                    .source
                    .as_ref()
                    .is_some_and(|current| Arc::ptr_eq(current, img));
                if !unchanged {
                    self.protocol = Some(picker.new_resize_protocol((**img).clone()));
                    self.source = Some(Arc::clone(img));
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.protocol = None;
        self.source = None;
    }

    #[must_use]
    pub const fn has_image(&self) -> bool {
        self.protocol.is_some()
    }
}

/// Draws whatever a cover loader currently has to show.
pub struct CoverView<'a> {
    loader: &'a CoverLoader,
    fallback: &'a PlaceholderCover,
    tick: u64,
}

impl<'a> CoverView<'a> {
    #[must_use]
    pub const fn new(loader: &'a CoverLoader, fallback: &'a PlaceholderCover) -> Self {
        Self {
            loader,
            fallback,
            tick: 0,
        }
    }

    /// Animation frame for the shimmer.
    #[must_use]
    pub const fn tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }
}

impl StatefulWidget for CoverView<'_> {
    type State = CoverSurface;

    fn render(self, area: Rect, buf: &mut Buffer, surface: &mut Self::State) {
        if area.is_empty() {
            return;
        }

        match self.loader.state() {
            LoadState::Pending => render_placeholder_block(self.loader.placeholder(), area, buf),
            LoadState::Loading | LoadState::Retrying => {
                let label = (self.loader.state() == LoadState::Retrying)
                    .then(|| format!("retry {}", self.loader.attempts()));
                render_skeleton(self.tick, label.as_deref(), area, buf);
            }
            LoadState::Loaded | LoadState::FailedFallback => {
                if let Some(protocol) = surface.protocol.as_mut() {
                    StatefulImage::default().render(area, buf, protocol);
                } else {
                    render_placeholder_card(self.fallback, area, buf);
                }
            }
        }
    }
}

fn lerp(from: u8, to: u8, num: u16, den: u16) -> u8 {
    let from = i32::from(from);
    let to = i32::from(to);
    let value = from + (to - from) * i32::from(num) / i32::from(den.max(1));
    u8::try_from(value.clamp(0, 255)).unwrap_or(u8::MAX)
}

fn gradient_row(row: u16, height: u16) -> Color {
    let last = height.saturating_sub(1);
    Color::Rgb(
        lerp(GRADIENT_TOP.0, GRADIENT_BOTTOM.0, row, last),
        lerp(GRADIENT_TOP.1, GRADIENT_BOTTOM.1, row, last),
        lerp(GRADIENT_TOP.2, GRADIENT_BOTTOM.2, row, last),
    )
}

/// The block shown before the cover has been seen.
fn render_placeholder_block(placeholder: &Placeholder, area: Rect, buf: &mut Buffer) {
    for row in 0..area.height {
        let line = Rect::new(area.x, area.y + row, area.width, 1);
        buf.set_style(line, Style::default().bg(gradient_row(row, area.height)));
    }

    let middle = Rect::new(area.x, area.y + area.height / 2, area.width, 1);
    let content = match placeholder {
        Placeholder::Icon => Line::styled(BOOK_ICON, Style::default().fg(ICON_COLOR)),
        Placeholder::Text(text) => Line::styled(text.as_str(), Style::default().fg(ICON_COLOR)),
    };
    Paragraph::new(content)
        .alignment(Alignment::Center)
        .render(middle, buf);
}

/// Columns highlighted by the shimmer band at `tick`.
#[allow(clippy::cast_possible_truncation)]
fn shimmer_columns(tick: u64, width: u16) -> std::ops::Range<u16> {
    let band = (width / 3).max(2);
    let cycle = u64::from(width.saturating_add(band));
    let offset = (tick % cycle) as u16;
    offset.saturating_sub(band)..offset.min(width)
}

/// The skeleton shown while a fetch or retry is in progress.
fn render_skeleton(tick: u64, label: Option<&str>, area: Rect, buf: &mut Buffer) {
    buf.set_style(area, Style::default().bg(SKELETON_BASE));

    let band = shimmer_columns(tick, area.width);
    if !band.is_empty() {
        let highlight = Rect::new(area.x + band.start, area.y, band.end - band.start, area.height);
        buf.set_style(highlight, Style::default().bg(SKELETON_HIGHLIGHT));
    }

    if let Some(label) = label {
        let bottom = Rect::new(area.x, area.bottom() - 1, area.width, 1);
        Paragraph::new(Line::styled(
            label,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(bottom, buf);
    }
}

/// The generated placeholder, drawn from its colour and text without any image.
fn render_placeholder_card(cover: &PlaceholderCover, area: Rect, buf: &mut Buffer) {
    let (r, g, b) = cover.background_rgb();
    let text_style = Style::default().fg(Color::White).bg(Color::Rgb(r, g, b));
    buf.set_style(area, text_style);

    let lines = vec![
        Line::styled(cover.title.as_str(), text_style.add_modifier(Modifier::BOLD)),
        Line::raw(""),
        Line::styled(cover.author.as_str(), text_style),
    ];
    let top = area.y + area.height.saturating_sub(3) / 2;
    let text_area = Rect::new(area.x, top, area.width, area.bottom() - top);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(text_area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::CoverSize;
    use crate::domain::entities::{CoverOptions, ImageRequest, Placeholder};
    use crate::domain::ports::mocks::ScriptedFetcher;
    use crate::presentation::cover::loader::{CoverEvent, CoverKey};
    use tokio::sync::mpsc;

    const URL: &str = "https://covers.example.org/dune.jpg";
    const AREA: Rect = Rect {
        x: 0,
        y: 0,
        width: 12,
        height: 8,
    };

    fn loader(lazy: bool, fetcher: ScriptedFetcher) -> (CoverLoader, mpsc::UnboundedReceiver<CoverEvent>) {
        loader_with(CoverOptions::default().with_lazy(lazy).with_retry_count(0), fetcher)
    }

    fn loader_with(
        options: CoverOptions,
        fetcher: ScriptedFetcher,
    ) -> (CoverLoader, mpsc::UnboundedReceiver<CoverEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let placeholder = PlaceholderCover::new("Dune", "Frank Herbert", CoverSize::Medium);
        let loader = CoverLoader::new(
            CoverKey(1),
            ImageRequest::new(URL, placeholder.url(), 0),
            &options,
            Arc::new(fetcher),
            tx,
        );
        (loader, rx)
    }

    fn draw(loader: &CoverLoader, tick: u64) -> Buffer {
        let fallback = PlaceholderCover::new("Dune", "Frank Herbert", CoverSize::Medium);
        let mut buf = Buffer::empty(AREA);
        let mut surface = CoverSurface::new();
        CoverView::new(loader, &fallback)
            .tick(tick)
            .render(AREA, &mut buf, &mut surface);
        buf
    }

    #[test]
    fn test_shimmer_band_sweeps_across() {
        assert_eq!(shimmer_columns(0, 12), 0..0);
        assert_eq!(shimmer_columns(2, 12), 0..2);
        assert_eq!(shimmer_columns(8, 12), 4..8);
        assert_eq!(shimmer_columns(15, 12), 11..12);
        // Cycle is width + band.
        assert_eq!(shimmer_columns(16, 12), shimmer_columns(0, 12));
    }

    #[test]
    fn test_gradient_endpoints() {
        assert_eq!(gradient_row(0, 8), Color::Rgb(219, 234, 254));
        assert_eq!(gradient_row(7, 8), Color::Rgb(199, 210, 254));
        assert_eq!(gradient_row(0, 1), Color::Rgb(219, 234, 254));
    }

    #[tokio::test]
    async fn test_pending_cover_shows_icon_block() {
        let (loader, _rx) = loader(true, ScriptedFetcher::new());
        let buf = draw(&loader, 0);

        assert_eq!(buf[(0, 0)].bg, Color::Rgb(219, 234, 254));
        let middle: String = (0..AREA.width).map(|x| buf[(x, 4)].symbol()).collect();
        assert!(middle.contains(BOOK_ICON));
    }

    #[tokio::test]
    async fn test_pending_cover_shows_custom_text() {
        let options = CoverOptions::default().with_placeholder(Placeholder::Text("Soon".into()));
        let (loader, _rx) = loader_with(options, ScriptedFetcher::new());
        assert_eq!(loader.state(), LoadState::Pending);

        let buf = draw(&loader, 0);
        assert_eq!(buf[(0, 0)].bg, Color::Rgb(219, 234, 254));
        let middle: String = (0..AREA.width).map(|x| buf[(x, 4)].symbol()).collect();
        assert_eq!(middle.trim(), "Soon");
        assert!(!middle.contains(BOOK_ICON));
    }

    #[tokio::test]
    async fn test_loading_cover_shows_skeleton() {
        let (loader, _rx) = loader(false, ScriptedFetcher::new());
        assert_eq!(loader.state(), LoadState::Loading);

        let buf = draw(&loader, 6);
        assert_eq!(buf[(0, 0)].bg, SKELETON_BASE);
        assert_eq!(buf[(3, 0)].bg, SKELETON_HIGHLIGHT);
    }

    #[tokio::test]
    async fn test_failed_cover_draws_placeholder_card() {
        let (mut loader, mut rx) = loader(false, ScriptedFetcher::new().fail_always(URL));
        let event = rx.recv().await.unwrap();
        loader.handle_event(event);
        assert_eq!(loader.state(), LoadState::FailedFallback);

        let buf = draw(&loader, 0);
        // "Dune" has 4 characters: palette entry 4.
        assert_eq!(buf[(0, 0)].bg, Color::Rgb(0xFF, 0xD2, 0x3F));
        let text: String = (0..AREA.height)
            .flat_map(|y| (0..AREA.width).map(move |x| (x, y)))
            .map(|pos| buf[pos].symbol().to_string())
            .collect();
        assert!(text.contains("Dune"));
        assert!(text.contains("Frank"));
    }
}
