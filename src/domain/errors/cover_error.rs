//! Cover image error types.

/// Result type for cover fetch and cache operations.
pub type CoverResult<T> = std::result::Result<T, CoverError>;

/// Errors that can occur while fetching a cover image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoverError {
    /// The URL could not be used for a request.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Failed to decode image.
    #[error("Decode error: {0}")]
    DecodeError(String),
    /// Network error during download.
    #[error("Network error: {0}")]
    NetworkError(String),
}
