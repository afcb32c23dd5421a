//! Recommendation API port definition.

use async_trait::async_trait;

use crate::domain::entities::{Book, BookId, RecommendationDashboard};
use crate::domain::errors::ApiError;

/// Port for the remote recommendation engine.
#[async_trait]
pub trait RecommendationPort: Send + Sync {
    /// Personal recommendations for a user.
    async fn for_user(&self, user_id: u64, limit: u32) -> Result<Vec<Book>, ApiError>;

    /// Books similar to the given one.
    async fn similar(&self, book_id: BookId, limit: u32) -> Result<Vec<Book>, ApiError>;

    /// Currently trending books.
    async fn trending(&self, limit: u32) -> Result<Vec<Book>, ApiError>;

    /// Most recently added books.
    async fn new_arrivals(&self, limit: u32) -> Result<Vec<Book>, ApiError>;

    /// Most popular books in a category.
    async fn popular_in_category(&self, category: &str, limit: u32)
    -> Result<Vec<Book>, ApiError>;

    /// Everything above for one user in a single call.
    async fn dashboard(&self, user_id: u64) -> Result<RecommendationDashboard, ApiError>;
}
