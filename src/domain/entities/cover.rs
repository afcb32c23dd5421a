//! Domain types for cover image loading.

/// Default number of retries after the first failed attempt.
pub const DEFAULT_RETRY_COUNT: u32 = 2;

/// Fraction of a cover that must be on screen before it is fetched.
pub const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.1;

/// Rows the viewport is grown by when testing cover visibility.
pub const DEFAULT_VISIBILITY_MARGIN: u16 = 2;

/// Unique identifier for a cached image.
/// Generated from a hash of the URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageId(pub String);

impl ImageId {
    /// Creates a new `ImageId` from any string-like input.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates an `ImageId` from a URL by hashing it.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let result = hasher.finalize();
        Self(hex::encode(&result[..16]))
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The URLs a cover loader works with for one book.
///
/// Immutable once issued. A new request replaces the old one whenever the
/// primary URL changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    primary_url: String,
    fallback_url: String,
    max_attempts: u32,
}

impl ImageRequest {
    #[must_use]
    pub fn new(
        primary_url: impl Into<String>,
        fallback_url: impl Into<String>,
        max_attempts: u32,
    ) -> Self {
        Self {
            primary_url: primary_url.into(),
            fallback_url: fallback_url.into(),
            max_attempts,
        }
    }

    #[must_use]
    pub fn primary_url(&self) -> &str {
        &self.primary_url
    }

    #[must_use]
    pub fn fallback_url(&self) -> &str {
        &self.fallback_url
    }

    /// Retries allowed after the first attempt.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns true if the primary URL already is the placeholder.
    #[must_use]
    pub fn is_placeholder_only(&self) -> bool {
        self.primary_url == self.fallback_url
    }
}

/// Where a cover loader is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Container has not been seen yet; nothing requested.
    #[default]
    Pending,
    /// A fetch of the current URL is in flight.
    Loading,
    /// The last fetch failed; waiting out the backoff delay.
    Retrying,
    /// The primary image is ready. Terminal.
    Loaded,
    /// Attempts exhausted; the fallback URL is in use. Terminal.
    FailedFallback,
}

impl LoadState {
    /// Returns true once no further primary attempts will be made.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Loaded | Self::FailedFallback)
    }

    /// Returns true while the cover is visible but not settled.
    #[must_use]
    pub const fn is_in_progress(self) -> bool {
        matches!(self, Self::Loading | Self::Retrying)
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Loading => write!(f, "loading"),
            Self::Retrying => write!(f, "retrying"),
            Self::Loaded => write!(f, "loaded"),
            Self::FailedFallback => write!(f, "fallback"),
        }
    }
}

/// What to show before a cover's container has become visible.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Placeholder {
    /// Book icon on a gradient block.
    #[default]
    Icon,
    /// Custom text centred in the block.
    Text(String),
}

/// Caller-supplied knobs for a cover loader.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverOptions {
    /// Defer the first fetch until the container is visible.
    pub lazy: bool,
    /// Retries after the first failed attempt.
    pub retry_count: u32,
    pub placeholder: Placeholder,
    /// Visible fraction that counts as seen. Clamped to `0.0..=1.0`.
    pub threshold: f32,
    pub margin: u16,
}

impl CoverOptions {
    #[must_use]
    pub const fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    #[must_use]
    pub const fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub const fn with_margin(mut self, margin: u16) -> Self {
        self.margin = margin;
        self
    }
}

impl Default for CoverOptions {
    fn default() -> Self {
        Self {
            lazy: true,
            retry_count: DEFAULT_RETRY_COUNT,
            placeholder: Placeholder::default(),
            threshold: DEFAULT_VISIBILITY_THRESHOLD,
            margin: DEFAULT_VISIBILITY_MARGIN,
        }
    }
}
