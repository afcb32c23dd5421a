//! Catalog API port definition.

use async_trait::async_trait;

use crate::domain::entities::{Book, BookId, NewBook, Page, PageRequest, SearchFilters};
use crate::domain::errors::ApiError;

/// Port for the remote book catalog.
#[async_trait]
pub trait CatalogPort: Send + Sync {
    /// Lists all books, paged and sorted.
    async fn list_books(&self, request: &PageRequest) -> Result<Page<Book>, ApiError>;

    /// Fetches a single book.
    async fn get_book(&self, id: BookId) -> Result<Book, ApiError>;

    /// Full-text search narrowed by filters. An empty query matches everything.
    async fn search_books(
        &self,
        query: &str,
        filters: &SearchFilters,
        request: &PageRequest,
    ) -> Result<Page<Book>, ApiError>;

    /// Books with at least one copy available.
    async fn available_books(&self, request: &PageRequest) -> Result<Page<Book>, ApiError>;

    /// Books ordered by average rating.
    async fn top_rated_books(&self, request: &PageRequest) -> Result<Page<Book>, ApiError>;

    /// Distinct categories in the catalog.
    async fn categories(&self) -> Result<Vec<String>, ApiError>;

    /// Distinct languages in the catalog.
    async fn languages(&self) -> Result<Vec<String>, ApiError>;

    /// Distinct publishers in the catalog.
    async fn publishers(&self) -> Result<Vec<String>, ApiError>;

    /// Every book in a category.
    async fn books_by_category(&self, category: &str) -> Result<Vec<Book>, ApiError>;

    /// Whether a copy of the book can be borrowed right now.
    async fn check_availability(&self, id: BookId) -> Result<bool, ApiError>;

    /// Creates a book and returns it with server-assigned fields.
    async fn create_book(&self, book: &NewBook) -> Result<Book, ApiError>;

    /// Replaces a book's editable fields.
    async fn update_book(&self, id: BookId, book: &NewBook) -> Result<Book, ApiError>;

    /// Deletes a book.
    async fn delete_book(&self, id: BookId) -> Result<(), ApiError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;

    /// In-memory catalog for testing.
    pub struct MockCatalog {
        books: Mutex<Vec<Book>>,
        fail: bool,
    }

    impl MockCatalog {
        /// Creates mock holding the given books.
        pub fn new(books: Vec<Book>) -> Self {
            Self {
                books: Mutex::new(books),
                fail: false,
            }
        }

        /// Creates mock whose every call fails with a network error.
        pub fn failing() -> Self {
            Self {
                books: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn check(&self) -> Result<(), ApiError> {
            if self.fail {
                Err(ApiError::network("mock catalog offline"))
            } else {
                Ok(())
            }
        }

        fn paged(books: Vec<Book>, request: &PageRequest) -> Page<Book> {
            let size = request.size.max(1) as usize;
            let total = books.len();
            let start = (request.page as usize * size).min(total);
            let end = (start + size).min(total);
            #[allow(clippy::cast_possible_truncation)]
            let total_pages = total.div_ceil(size) as u32;
            let content: Vec<Book> = books[start..end].to_vec();
            #[allow(clippy::cast_possible_truncation)]
            let number_of_elements = content.len() as u32;

            Page {
                content,
                total_elements: total as u64,
                total_pages,
                number: request.page,
                size: request.size,
                number_of_elements,
                first: request.page == 0,
                last: request.page + 1 >= total_pages,
            }
        }
    }

    #[async_trait]
    impl CatalogPort for MockCatalog {
        async fn list_books(&self, request: &PageRequest) -> Result<Page<Book>, ApiError> {
            self.check()?;
            Ok(Self::paged(self.books.lock().clone(), request))
        }

        async fn get_book(&self, id: BookId) -> Result<Book, ApiError> {
            self.check()?;
            self.books
                .lock()
                .iter()
                .find(|b| b.id == id)
                .cloned()
                .ok_or_else(|| ApiError::not_found(format!("book {id}")))
        }

        async fn search_books(
            &self,
            query: &str,
            filters: &SearchFilters,
            request: &PageRequest,
        ) -> Result<Page<Book>, ApiError> {
            self.check()?;
            let query = query.to_lowercase();
            let matches = self
                .books
                .lock()
                .iter()
                .filter(|b| {
                    query.is_empty()
                        || b.title.to_lowercase().contains(&query)
                        || b.author.to_lowercase().contains(&query)
                })
                .filter(|b| !filters.available_only || b.is_available())
                .cloned()
                .collect();
            Ok(Self::paged(matches, request))
        }

        async fn available_books(&self, request: &PageRequest) -> Result<Page<Book>, ApiError> {
            self.check()?;
            let available = self
                .books
                .lock()
                .iter()
                .filter(|b| b.is_available())
                .cloned()
                .collect();
            Ok(Self::paged(available, request))
        }

        async fn top_rated_books(&self, request: &PageRequest) -> Result<Page<Book>, ApiError> {
            self.check()?;
            let mut books = self.books.lock().clone();
            books.sort_by(|a, b| {
                b.average_rating
                    .unwrap_or(0.0)
                    .total_cmp(&a.average_rating.unwrap_or(0.0))
            });
            Ok(Self::paged(books, request))
        }

        async fn categories(&self) -> Result<Vec<String>, ApiError> {
            self.check()?;
            let mut categories: Vec<String> =
                self.books.lock().iter().map(|b| b.category.clone()).collect();
            categories.sort();
            categories.dedup();
            Ok(categories)
        }

        async fn languages(&self) -> Result<Vec<String>, ApiError> {
            self.check()?;
            Ok(vec!["English".to_string()])
        }

        async fn publishers(&self) -> Result<Vec<String>, ApiError> {
            self.check()?;
            Ok(Vec::new())
        }

        async fn books_by_category(&self, category: &str) -> Result<Vec<Book>, ApiError> {
            self.check()?;
            Ok(self
                .books
                .lock()
                .iter()
                .filter(|b| b.category == category)
                .cloned()
                .collect())
        }

        async fn check_availability(&self, id: BookId) -> Result<bool, ApiError> {
            Ok(self.get_book(id).await?.is_available())
        }

        async fn create_book(&self, book: &NewBook) -> Result<Book, ApiError> {
            self.check()?;
            let mut books = self.books.lock();
            let id = BookId(books.iter().map(|b| b.id.0).max().unwrap_or(0) + 1);
            let created = Book {
                id,
                title: book.title.clone(),
                author: book.author.clone(),
                isbn: book.isbn.clone(),
                description: book.description.clone(),
                category: book.category.clone(),
                publisher: book.publisher.clone(),
                publication_year: Some(book.publication_year),
                page_count: Some(book.page_count),
                language: Some(book.language.clone()),
                cover_image_url: book.cover_image_url.clone(),
                available_copies: book.available_copies,
                total_copies: book.total_copies,
                average_rating: None,
                rating_count: 0,
                created_at: None,
                updated_at: None,
            };
            books.push(created.clone());
            Ok(created)
        }

        async fn update_book(&self, id: BookId, book: &NewBook) -> Result<Book, ApiError> {
            self.check()?;
            let mut books = self.books.lock();
            let existing = books
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or_else(|| ApiError::not_found(format!("book {id}")))?;
            existing.title.clone_from(&book.title);
            existing.author.clone_from(&book.author);
            Ok(existing.clone())
        }

        async fn delete_book(&self, id: BookId) -> Result<(), ApiError> {
            self.check()?;
            self.books.lock().retain(|b| b.id != id);
            Ok(())
        }
    }
}
