//! Catalog API error types.

use thiserror::Error;

/// Errors returned by the catalog and recommendation API.
#[derive(Debug, Clone, Error)]
#[allow(missing_docs)]
pub enum ApiError {
    #[error("not found: {resource}")]
    NotFound { resource: String },

    #[error("request rejected: {message}")]
    BadRequest { message: String },

    #[error("catalog server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("failed to decode response: {message}")]
    Decode { message: String },

    #[error("unexpected API error: {message}")]
    Unexpected { message: String },
}

impl ApiError {
    /// Creates not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates unexpected error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Returns whether retrying the same request may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Server { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable() {
        assert!(ApiError::network("down").is_recoverable());
        assert!(ApiError::server(503, "busy").is_recoverable());
        assert!(!ApiError::not_found("book 3").is_recoverable());
        assert!(!ApiError::decode("bad json").is_recoverable());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ApiError::server(500, "boom").to_string(),
            "catalog server error (500): boom"
        );
    }
}
