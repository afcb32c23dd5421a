//! Wire types that only exist at the HTTP boundary.

use serde::Deserialize;

/// Error body returned by the catalog server.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    /// Human readable explanation.
    #[serde(default)]
    pub message: Option<String>,
    /// Short status phrase.
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorResponse {
    /// The most specific text available.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .or(self.error.as_deref())
    }
}
