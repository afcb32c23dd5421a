//! Batch cover preloading.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, info};

use crate::domain::ports::CoverFetchPort;

/// Covers fetched concurrently per batch.
pub const DEFAULT_BATCH_SIZE: usize = 3;

/// Pause after each batch.
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_millis(100);

/// URLs already preloaded during this session.
#[derive(Debug, Default)]
pub struct PreloadCache {
    seen: HashSet<String>,
}

impl PreloadCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Marks `url` as preloaded. Returns false if it already was.
    pub fn insert(&mut self, url: &str) -> bool {
        self.seen.insert(url.to_string())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Outcome of one preload run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Warms the cover cache with every cover of a page, a few at a time.
pub struct CoverPreloader {
    fetcher: Arc<dyn CoverFetchPort>,
    cache: PreloadCache,
    batch_size: usize,
    pause: Duration,
}

impl CoverPreloader {
    #[must_use]
    pub fn new(fetcher: Arc<dyn CoverFetchPort>) -> Self {
        Self {
            fetcher,
            cache: PreloadCache::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            pause: DEFAULT_BATCH_PAUSE,
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub const fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    #[must_use]
    pub const fn cache(&self) -> &PreloadCache {
        &self.cache
    }

    /// Fetches every URL not preloaded before.
    ///
    /// Each batch is awaited until all of its fetches settle; a failed fetch
    /// does not affect its siblings. A URL is remembered once its batch
    /// starts, whatever the outcome, so a cancelled run leaves later batches
    /// to the next one.
    pub async fn preload<I, S>(&mut self, urls: I) -> PreloadReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = PreloadReport::default();
        let mut pending = Vec::new();

        for url in urls {
            let url = url.as_ref().trim();
            if url.is_empty() {
                continue;
            }
            if self.cache.contains(url) || pending.iter().any(|p| p == url) {
                report.skipped += 1;
            } else {
                pending.push(url.to_string());
            }
        }

        for batch in pending.chunks(self.batch_size) {
            for url in batch {
                self.cache.insert(url);
            }
            let results = join_all(batch.iter().map(|url| self.fetcher.fetch(url))).await;

            for (url, result) in batch.iter().zip(results) {
                report.attempted += 1;
                match result {
                    Ok(_) => report.succeeded += 1,
                    Err(e) => {
                        report.failed += 1;
                        debug!(url = %url, error = %e, "Preload failed");
                    }
                }
            }

            tokio::time::sleep(self.pause).await;
        }

        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                succeeded = report.succeeded,
                failed = report.failed,
                skipped = report.skipped,
                "Preloaded covers"
            );
        }

        report
    }
}
