//! In-memory LRU cache of decoded covers.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::domain::entities::ImageId;
use crate::domain::ports::ImageCachePort;

/// Default maximum number of covers kept in memory.
pub const DEFAULT_CACHE_SIZE: usize = 50;

/// LRU cache for decoded covers, shared between the loaders and the preloader.
pub struct CoverCache {
    cache: RwLock<LruCache<ImageId, Arc<image::DynamicImage>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CoverCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RwLock::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        CacheStats {
            hits,
            misses,
            size: self.len(),
        }
    }

    /// Looks up a cover without promoting it in the LRU order.
    pub async fn peek(&self, id: &ImageId) -> Option<Arc<image::DynamicImage>> {
        self.cache.read().await.peek(id).cloned()
    }

    pub async fn contains(&self, id: &ImageId) -> bool {
        self.cache.read().await.contains(id)
    }
}

impl Default for CoverCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

/// Hit and miss counters for the cover cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl CacheStats {
    /// Hit rate as a percentage.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} covers, {:.1}% hit rate",
            self.size,
            self.hit_rate()
        )
    }
}

#[async_trait::async_trait]
impl ImageCachePort for CoverCache {
    async fn get(&self, id: &ImageId) -> Option<Arc<image::DynamicImage>> {
        let mut cache = self.cache.write().await;
        if let Some(img) = cache.get(id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(id = %id, "Cover cache hit");
            Some(img.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(id = %id, "Cover cache miss");
            None
        }
    }

    async fn put(&self, id: ImageId, image: Arc<image::DynamicImage>) {
        let mut cache = self.cache.write().await;
        if let Some((evicted, _)) = cache.push(id, image) {
            trace!(id = %evicted, "Cover pushed out of cache");
        }
    }

    async fn evict(&self, id: &ImageId) {
        if self.cache.write().await.pop(id).is_some() {
            debug!(id = %id, "Evicted cover from cache");
        }
    }

    fn len(&self) -> usize {
        // Skipped while a writer holds the lock.
        self.cache.try_read().map(|c| c.len()).unwrap_or(0)
    }

    async fn clear(&self) {
        self.cache.write().await.clear();
        debug!("Cleared cover cache");
    }
}
