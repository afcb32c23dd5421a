//! Cover image infrastructure.
//!
//! This module provides:
//! - Memory caching with LRU eviction
//! - HTTP download and off-runtime decoding
//! - Batched preloading of a page's covers

pub mod fetcher;
pub mod memory_cache;
pub mod preloader;

pub use fetcher::{FetcherConfig, HttpCoverFetcher};
pub use memory_cache::{CacheStats, CoverCache};
pub use preloader::{CoverPreloader, PreloadCache, PreloadReport};
