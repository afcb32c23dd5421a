//! Catalog REST API adapter.

pub mod client;
pub mod dto;

pub use client::CatalogClient;
