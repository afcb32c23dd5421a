//! Domain entity definitions.

mod book;
mod cover;
mod filters;
mod page;

pub use book::{Book, BookId, FieldErrors, NewBook, RecommendationDashboard};
pub use cover::{
    CoverOptions, DEFAULT_RETRY_COUNT, DEFAULT_VISIBILITY_MARGIN, DEFAULT_VISIBILITY_THRESHOLD,
    ImageId, ImageRequest, LoadState, Placeholder,
};
pub use filters::SearchFilters;
pub use page::{DEFAULT_PAGE_SIZE, Page, PageRequest, SortDirection};

#[cfg(test)]
pub(crate) use book::sample_book;
