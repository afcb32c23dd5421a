//! Cover URL resolution.
//!
//! Decides which URL a cover loader should try first and builds the
//! deterministic placeholder used when that fails. Everything here is pure.

use std::sync::OnceLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;

use crate::domain::entities::{Book, ImageRequest};

/// Background colours for generated placeholders, picked by title length.
pub const PALETTE: [&str; 15] = [
    "FF6B6B", "FF8E53", "FF6B35", "F7931E", "FFD23F", "06FFA5", "1DD1A1", "00D2D3", "0395E3",
    "3742FA", "5F27CD", "A55EEA", "C44569", "F8B500", "F0932B",
];

/// Text colour for generated placeholders.
pub const PLACEHOLDER_TEXT_COLOR: &str = "FFFFFF";

const PLACEHOLDER_BASE_URL: &str = "https://via.placeholder.com";
const OPEN_LIBRARY_HOST: &str = "covers.openlibrary.org";
const TITLE_LIMIT: usize = 20;
const AUTHOR_LIMIT: usize = 15;

/// Placeholder image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl CoverSize {
    #[must_use]
    pub const fn dimensions(self) -> &'static str {
        match self {
            Self::Small => "200x300",
            Self::Medium => "300x400",
            Self::Large => "400x600",
        }
    }
}

/// A generated placeholder cover in structured form.
///
/// The terminal draws this directly when no image can be shown, so the same
/// colour and text appear whether or not the placeholder URL ever loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderCover {
    pub background: &'static str,
    pub text_color: &'static str,
    pub title: String,
    pub author: String,
    pub size: CoverSize,
}

impl PlaceholderCover {
    #[must_use]
    pub fn new(title: &str, author: &str, size: CoverSize) -> Self {
        Self {
            background: PALETTE[palette_index(title)],
            text_color: PLACEHOLDER_TEXT_COLOR,
            title: title.chars().take(TITLE_LIMIT).collect(),
            author: author.chars().take(AUTHOR_LIMIT).collect(),
            size,
        }
    }

    /// Placeholder service URL encoding the title and author as two lines.
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "{PLACEHOLDER_BASE_URL}/{}/{}/{}?text={}%0A{}",
            self.size.dimensions(),
            self.background,
            self.text_color,
            encode_uri_component(&self.title),
            encode_uri_component(&self.author),
        )
    }

    /// Background colour as RGB components.
    #[must_use]
    pub fn background_rgb(&self) -> (u8, u8, u8) {
        hex_to_rgb(self.background)
    }
}

/// Index into [`PALETTE`] for a title: character count modulo palette size.
#[must_use]
pub fn palette_index(title: &str) -> usize {
    title.chars().count() % PALETTE.len()
}

/// Builds the medium placeholder URL for a book.
#[must_use]
pub fn generate_placeholder_cover(title: &str, author: &str) -> String {
    PlaceholderCover::new(title, author, CoverSize::Medium).url()
}

/// Resolves the primary and fallback URLs for a book's cover.
///
/// A blank or missing cover URL makes the placeholder the primary URL too.
#[must_use]
pub fn resolve_cover(
    title: &str,
    author: &str,
    cover_url: Option<&str>,
    max_attempts: u32,
) -> ImageRequest {
    let fallback = generate_placeholder_cover(title, author);
    let primary = cover_url
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map_or_else(|| fallback.clone(), String::from);

    ImageRequest::new(primary, fallback, max_attempts)
}

/// Resolves the cover request for a catalog book.
#[must_use]
pub fn resolve_book_cover(book: &Book, max_attempts: u32) -> ImageRequest {
    resolve_cover(&book.title, &book.author, book.cover_url(), max_attempts)
}

/// Resolves the cover request for a book drawn `width` pixels wide.
///
/// Only the primary URL is narrowed; the placeholder keeps its size.
#[must_use]
pub fn resolve_book_cover_sized(book: &Book, max_attempts: u32, width: Option<u32>) -> ImageRequest {
    let request = resolve_book_cover(book, max_attempts);
    if width.is_none() || request.is_placeholder_only() {
        return request;
    }
    ImageRequest::new(
        optimize_cover_url(request.primary_url(), width),
        request.fallback_url(),
        max_attempts,
    )
}

/// Guesses a cover URL for a book that has none on record.
///
/// Uses Open Library when an ISBN is known, otherwise a Google Books
/// front-cover lookup by title and author.
#[must_use]
pub fn cover_url_for_isbn(title: &str, author: &str, isbn: Option<&str>) -> String {
    static ISBN_SEPARATORS: OnceLock<Regex> = OnceLock::new();

    if let Some(isbn) = isbn.map(str::trim).filter(|isbn| !isbn.is_empty()) {
        let re = ISBN_SEPARATORS.get_or_init(|| Regex::new(r"[-\s]").expect("Invalid regex"));
        let clean = re.replace_all(isbn, "");
        return format!("https://{OPEN_LIBRARY_HOST}/b/isbn/{clean}-L.jpg");
    }

    let query = encode_uri_component(&format!("{title} {author}"));
    format!(
        "https://books.google.com/books/content?id=placeholder&printsec=frontcover&img=1&zoom=1&source=gbs_api&q={query}"
    )
}

/// Picks a smaller Open Library rendition for narrow targets.
///
/// Other hosts do not expose size variants and are returned unchanged.
#[must_use]
pub fn optimize_cover_url(url: &str, width: Option<u32>) -> String {
    if !url.contains(OPEN_LIBRARY_HOST) || !url.ends_with("-L.jpg") {
        return url.to_string();
    }

    match width {
        Some(w) if w <= 100 => url.replace("-L.jpg", "-S.jpg"),
        Some(w) if w <= 200 => url.replace("-L.jpg", "-M.jpg"),
        _ => url.to_string(),
    }
}

/// Characters `encodeURIComponent` escapes: all but alphanumerics and `-_.!~*'()`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode_uri_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

fn hex_to_rgb(hex: &str) -> (u8, u8, u8) {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or(0)
    };
    (channel(0..2), channel(2..4), channel(4..6))
}
