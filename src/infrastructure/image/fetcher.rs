//! HTTP cover fetcher backed by the in-memory cover cache.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Url;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::domain::entities::ImageId;
use crate::domain::errors::{CoverError, CoverResult};
use crate::domain::ports::{CoverFetchPort, ImageCachePort};
use crate::infrastructure::config::CoversConfig;

use super::memory_cache::CoverCache;

/// Covers wider than this are scaled down after decoding.
const MAX_COVER_WIDTH: u32 = 400;
const MAX_COVER_HEIGHT: u32 = 600;

/// Configuration for the cover fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Maximum covers in memory cache.
    pub memory_cache_size: usize,
    /// Maximum concurrent downloads.
    pub max_concurrent_downloads: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            memory_cache_size: super::memory_cache::DEFAULT_CACHE_SIZE,
            max_concurrent_downloads: 4,
            timeout_secs: 30,
        }
    }
}

impl From<&CoversConfig> for FetcherConfig {
    fn from(config: &CoversConfig) -> Self {
        Self {
            memory_cache_size: config.memory_cache_size,
            timeout_secs: config.timeout_secs,
            ..Self::default()
        }
    }
}

/// Downloads covers over HTTP, decodes them off the async runtime, and
/// remembers the decoded result.
///
/// A URL already in the cache is served without touching the network, so
/// covers warmed by the preloader appear immediately.
pub struct HttpCoverFetcher {
    cache: Arc<CoverCache>,
    http_client: reqwest::Client,
    downloads: Semaphore,
    config: FetcherConfig,
}

impl std::fmt::Debug for HttpCoverFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCoverFetcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpCoverFetcher {
    /// Creates a fetcher with its own cache.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: FetcherConfig) -> CoverResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CoverError::NetworkError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            cache: Arc::new(CoverCache::new(config.memory_cache_size)),
            http_client,
            downloads: Semaphore::new(config.max_concurrent_downloads.max(1)),
            config,
        })
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<CoverCache> {
        &self.cache
    }

    async fn download(&self, url: Url) -> CoverResult<Bytes> {
        let _permit = self
            .downloads
            .acquire()
            .await
            .map_err(|e| CoverError::NetworkError(format!("Download queue closed: {e}")))?;

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| CoverError::NetworkError(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CoverError::NetworkError(format!(
                "HTTP {}: {}",
                response.status(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| CoverError::NetworkError(format!("Failed to read body: {e}")))
    }
}

#[async_trait::async_trait]
impl CoverFetchPort for HttpCoverFetcher {
    async fn fetch(&self, url: &str) -> CoverResult<Arc<image::DynamicImage>> {
        let parsed = parse_cover_url(url)?;

        let id = ImageId::from_url(url);
        if let Some(img) = self.cache.get(&id).await {
            return Ok(img);
        }

        debug!(id = %id, url = %url, "Downloading cover");
        let bytes = self.download(parsed).await.inspect_err(|e| {
            warn!(url = %url, error = %e, "Cover download failed");
        })?;

        let decoded = tokio::task::spawn_blocking(move || decode_cover(&bytes))
            .await
            .map_err(|e| CoverError::DecodeError(format!("Decode task panicked: {e}")))??;

        let img = Arc::new(decoded);
        self.cache.put(id.clone(), img.clone()).await;
        debug!(id = %id, width = img.width(), height = img.height(), "Cover decoded");

        Ok(img)
    }
}

/// Accepts absolute http(s) URLs with a host.
fn parse_cover_url(url: &str) -> CoverResult<Url> {
    let parsed = Url::parse(url.trim()).map_err(|_| CoverError::InvalidUrl(url.to_string()))?;
    if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() {
        Ok(parsed)
    } else {
        Err(CoverError::InvalidUrl(url.to_string()))
    }
}

fn decode_cover(bytes: &[u8]) -> CoverResult<image::DynamicImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| CoverError::DecodeError(format!("Failed to decode image: {e}")))?;

    if img.width() > MAX_COVER_WIDTH {
        Ok(img.resize(
            MAX_COVER_WIDTH,
            MAX_COVER_HEIGHT,
            image::imageops::FilterType::Lanczos3,
        ))
    } else {
        Ok(img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use test_case::test_case;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(width, height)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_keeps_small_covers() {
        let img = decode_cover(&png_bytes(200, 300)).unwrap();
        assert_eq!((img.width(), img.height()), (200, 300));
    }

    #[test]
    fn test_decode_scales_wide_covers() {
        let img = decode_cover(&png_bytes(800, 1200)).unwrap();
        assert_eq!((img.width(), img.height()), (400, 600));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_cover(b"<html>not found</html>").unwrap_err();
        assert!(matches!(err, CoverError::DecodeError(_)));
    }

    #[tokio::test]
    async fn test_invalid_url_fails_without_request() {
        let fetcher = HttpCoverFetcher::new(FetcherConfig::default()).unwrap();
        let err = fetcher.fetch("covers/dune.jpg").await.unwrap_err();
        assert_eq!(err, CoverError::InvalidUrl("covers/dune.jpg".to_string()));
    }

    #[test_case("https://" ; "missing host")]
    #[test_case("ftp://covers.example.org/dune.jpg" ; "ftp")]
    #[test_case("data:image/png;base64,AAAA" ; "data uri")]
    #[test_case("https://covers example.org/dune.jpg" ; "space in host")]
    fn test_unusable_urls_rejected(url: &str) {
        assert_eq!(
            parse_cover_url(url).unwrap_err(),
            CoverError::InvalidUrl(url.to_string())
        );
    }

    #[test]
    fn test_cover_url_is_trimmed() {
        let url = parse_cover_url(" https://covers.openlibrary.org/b/isbn/1-M.jpg ").unwrap();
        assert_eq!(url.host_str(), Some("covers.openlibrary.org"));
    }

    #[tokio::test]
    async fn test_cached_cover_served_without_network() {
        let fetcher = HttpCoverFetcher::new(FetcherConfig::default()).unwrap();
        // Unroutable host: only the cache can answer.
        let url = "http://covers.invalid/dune.jpg";
        fetcher
            .cache()
            .put(
                ImageId::from_url(url),
                Arc::new(image::DynamicImage::new_rgb8(3, 5)),
            )
            .await;

        let img = fetcher.fetch(url).await.unwrap();
        assert_eq!(img.width(), 3);
    }
}
