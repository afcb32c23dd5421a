//! Catalog REST API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::dto::ErrorResponse;
use crate::domain::entities::{
    Book, BookId, NewBook, Page, PageRequest, RecommendationDashboard, SearchFilters,
};
use crate::domain::errors::ApiError;
use crate::domain::ports::{CatalogPort, RecommendationPort};
use crate::infrastructure::config::ApiConfig;

const USER_AGENT: &str = concat!("libris/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the book and recommendation endpoints.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: Url,
}

impl CatalogClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// # Errors
    /// Returns error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::unexpected(format!("invalid API base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::unexpected(format!(
                "API base URL cannot have paths: {base_url}"
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::unexpected(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Creates a client from the `[api]` configuration section.
    ///
    /// # Errors
    /// Returns error if the configured base URL is invalid.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Catalog request failed");
            if e.is_timeout() {
                ApiError::network("request timed out")
            } else if e.is_connect() {
                ApiError::network("failed to connect to the catalog server")
            } else {
                ApiError::network(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(Self::error_from_response(status, response).await)
        }
    }

    async fn error_from_response(status: StatusCode, response: reqwest::Response) -> ApiError {
        let resource = response.url().path().to_string();
        let detail = match response.json::<ErrorResponse>().await {
            Ok(body) => body.detail().map(str::to_string),
            Err(_) => None,
        };
        let message = detail.unwrap_or_else(|| format!("HTTP {status}"));

        match status {
            StatusCode::NOT_FOUND => ApiError::not_found(resource),
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::bad_request(message)
            }
            s if s.is_server_error() => ApiError::server(s.as_u16(), message),
            _ => ApiError::unexpected(format!("unexpected response: {status} - {message}")),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments);
        debug!(url = %url, "GET");
        let response = self.send(self.client.get(url).query(query)).await?;
        decode(response).await
    }

    async fn get_page(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Page<Book>, ApiError> {
        let page: Page<Book> = self.get_json(segments, query).await?;
        debug!(
            page = page.number,
            total = page.total_elements,
            count = page.content.len(),
            "Received page of books"
        );
        Ok(page)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    response.json::<T>().await.map_err(|e| {
        warn!(error = %e, "Failed to parse catalog response");
        ApiError::decode(e.to_string())
    })
}

fn limit_query(limit: u32) -> [(&'static str, String); 1] {
    [("limit", limit.to_string())]
}

#[async_trait]
impl CatalogPort for CatalogClient {
    async fn list_books(&self, request: &PageRequest) -> Result<Page<Book>, ApiError> {
        self.get_page(&["books"], &request.to_query_pairs()).await
    }

    async fn get_book(&self, id: BookId) -> Result<Book, ApiError> {
        self.get_json(&["books", &id.to_string()], &[]).await
    }

    async fn search_books(
        &self,
        query: &str,
        filters: &SearchFilters,
        request: &PageRequest,
    ) -> Result<Page<Book>, ApiError> {
        let mut params = request.to_query_pairs();
        let query = query.trim();
        if !query.is_empty() {
            params.push(("q", query.to_string()));
        }
        params.extend(filters.to_query_pairs());

        debug!(query = %query, filters = filters.active_count(), "Searching catalog");
        self.get_page(&["books", "search"], &params).await
    }

    async fn available_books(&self, request: &PageRequest) -> Result<Page<Book>, ApiError> {
        let params = [
            ("page", request.page.to_string()),
            ("size", request.size.to_string()),
        ];
        self.get_page(&["books", "available"], &params).await
    }

    async fn top_rated_books(&self, request: &PageRequest) -> Result<Page<Book>, ApiError> {
        let params = [
            ("page", request.page.to_string()),
            ("size", request.size.to_string()),
        ];
        self.get_page(&["books", "top-rated"], &params).await
    }

    async fn categories(&self) -> Result<Vec<String>, ApiError> {
        self.get_json(&["books", "categories"], &[]).await
    }

    async fn languages(&self) -> Result<Vec<String>, ApiError> {
        self.get_json(&["books", "languages"], &[]).await
    }

    async fn publishers(&self) -> Result<Vec<String>, ApiError> {
        self.get_json(&["books", "publishers"], &[]).await
    }

    async fn books_by_category(&self, category: &str) -> Result<Vec<Book>, ApiError> {
        self.get_json(&["books", "category", category], &[]).await
    }

    async fn check_availability(&self, id: BookId) -> Result<bool, ApiError> {
        self.get_json(&["books", &id.to_string(), "availability"], &[])
            .await
    }

    async fn create_book(&self, book: &NewBook) -> Result<Book, ApiError> {
        let url = self.endpoint(&["books"]);
        debug!(title = %book.title, "Creating book");
        let response = self.send(self.client.post(url).json(book)).await?;
        let created: Book = decode(response).await?;
        debug!(id = %created.id, "Book created");
        Ok(created)
    }

    async fn update_book(&self, id: BookId, book: &NewBook) -> Result<Book, ApiError> {
        let url = self.endpoint(&["books", &id.to_string()]);
        let response = self.send(self.client.put(url).json(book)).await?;
        decode(response).await
    }

    async fn delete_book(&self, id: BookId) -> Result<(), ApiError> {
        let url = self.endpoint(&["books", &id.to_string()]);
        self.send(self.client.delete(url)).await?;
        debug!(id = %id, "Book deleted");
        Ok(())
    }
}

#[async_trait]
impl RecommendationPort for CatalogClient {
    async fn for_user(&self, user_id: u64, limit: u32) -> Result<Vec<Book>, ApiError> {
        self.get_json(
            &["recommendations", "user", &user_id.to_string()],
            &limit_query(limit),
        )
        .await
    }

    async fn similar(&self, book_id: BookId, limit: u32) -> Result<Vec<Book>, ApiError> {
        self.get_json(
            &["recommendations", "similar", &book_id.to_string()],
            &limit_query(limit),
        )
        .await
    }

    async fn trending(&self, limit: u32) -> Result<Vec<Book>, ApiError> {
        self.get_json(&["recommendations", "trending"], &limit_query(limit))
            .await
    }

    async fn new_arrivals(&self, limit: u32) -> Result<Vec<Book>, ApiError> {
        self.get_json(&["recommendations", "new-arrivals"], &limit_query(limit))
            .await
    }

    async fn popular_in_category(
        &self,
        category: &str,
        limit: u32,
    ) -> Result<Vec<Book>, ApiError> {
        self.get_json(
            &["recommendations", "popular", category],
            &limit_query(limit),
        )
        .await
    }

    async fn dashboard(&self, user_id: u64) -> Result<RecommendationDashboard, ApiError> {
        self.get_json(&["recommendations", "dashboard", &user_id.to_string()], &[])
            .await
    }
}
