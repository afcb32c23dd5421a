mod catalog_port;
mod cover_fetch_port;
mod image_cache_port;
mod recommendation_port;

pub use catalog_port::CatalogPort;
pub use cover_fetch_port::CoverFetchPort;
pub use image_cache_port::ImageCachePort;
pub use recommendation_port::RecommendationPort;
