//! Port definition for fetching cover images.

use std::sync::Arc;

use crate::domain::errors::CoverResult;

/// Port for downloading and decoding a cover image.
/// Implementations must be thread-safe.
#[async_trait::async_trait]
pub trait CoverFetchPort: Send + Sync {
    /// Fetches and decodes the image at `url`.
    async fn fetch(&self, url: &str) -> CoverResult<Arc<image::DynamicImage>>;
}

#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;
    use std::time::Duration;

    use parking_lot::Mutex;
    use tokio::time::Instant;

    use super::*;
    use crate::domain::errors::CoverError;

    /// A recorded fetch.
    #[derive(Debug, Clone)]
    pub struct FetchCall {
        pub url: String,
        pub at: Instant,
    }

    /// Fetcher whose per-URL outcome is scripted up front.
    /// URLs without a script always succeed.
    #[derive(Default)]
    pub struct ScriptedFetcher {
        remaining_failures: Mutex<HashMap<String, u32>>,
        calls: Mutex<Vec<FetchCall>>,
        latency: Option<Duration>,
    }

    impl ScriptedFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every fetch of `url` fails.
        pub fn fail_always(self, url: &str) -> Self {
            self.fail_times(url, u32::MAX)
        }

        /// The first `times` fetches of `url` fail.
        pub fn fail_times(self, url: &str, times: u32) -> Self {
            self.remaining_failures.lock().insert(url.to_string(), times);
            self
        }

        /// Each fetch takes `latency` before completing.
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        pub fn calls(&self) -> Vec<FetchCall> {
            self.calls.lock().clone()
        }

        pub fn calls_for(&self, url: &str) -> Vec<FetchCall> {
            self.calls
                .lock()
                .iter()
                .filter(|call| call.url == url)
                .cloned()
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl CoverFetchPort for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> CoverResult<Arc<image::DynamicImage>> {
            self.calls.lock().push(FetchCall {
                url: url.to_string(),
                at: Instant::now(),
            });

            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }

            let should_fail = {
                let mut failures = self.remaining_failures.lock();
                match failures.get_mut(url) {
                    Some(0) | None => false,
                    Some(remaining) => {
                        if *remaining != u32::MAX {
                            *remaining -= 1;
                        }
                        true
                    }
                }
            };

            if should_fail {
                Err(CoverError::NetworkError(format!("scripted failure for {url}")))
            } else {
                Ok(Arc::new(image::DynamicImage::new_rgb8(4, 6)))
            }
        }
    }
}
