//! Port definition for the decoded cover cache.

use std::sync::Arc;

use crate::domain::entities::ImageId;

/// Cache of decoded cover images keyed by URL hash.
/// Implementations must be thread-safe.
#[async_trait::async_trait]
pub trait ImageCachePort: Send + Sync {
    /// Returns the cached image, if any, marking it recently used.
    async fn get(&self, id: &ImageId) -> Option<Arc<image::DynamicImage>>;

    async fn put(&self, id: ImageId, image: Arc<image::DynamicImage>);

    async fn evict(&self, id: &ImageId);

    /// Best-effort count of cached images.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn clear(&self);
}
