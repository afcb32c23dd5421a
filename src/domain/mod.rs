//! Domain layer with core catalog entities and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{Book, BookId, ImageRequest, LoadState};
pub use errors::{ApiError, CoverError};
pub use ports::{CatalogPort, CoverFetchPort, RecommendationPort};
