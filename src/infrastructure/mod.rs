//! Infrastructure layer with external service adapters.

/// Catalog REST API client.
pub mod api;
/// Application configuration.
pub mod config;
/// Cover fetching, caching and preloading.
pub mod image;

pub use api::CatalogClient;
pub use config::{AppConfig, CliArgs, LogLevel, StorageManager};
pub use image::{CoverCache, CoverPreloader, FetcherConfig, HttpCoverFetcher};
