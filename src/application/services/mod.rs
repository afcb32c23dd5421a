pub mod book_draft;
pub mod cover_metrics;
pub mod cover_resolver;
pub mod search_form;

pub use book_draft::{BookDraft, CATEGORIES, LANGUAGES};
pub use cover_metrics::CoverMetrics;
pub use cover_resolver::{
    CoverSize, PlaceholderCover, cover_url_for_isbn, generate_placeholder_cover,
    optimize_cover_url, resolve_book_cover, resolve_book_cover_sized, resolve_cover,
};
pub use search_form::{FilterField, SearchForm};
