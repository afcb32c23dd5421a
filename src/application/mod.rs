//! Application layer with catalog services.

/// Stateless and form services.
pub mod services;

pub use services::{BookDraft, CoverMetrics, PlaceholderCover, SearchForm};
