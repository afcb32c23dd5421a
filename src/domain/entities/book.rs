//! Book catalog entities.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub u64);

impl BookId {
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BookId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A book record as served by the catalog API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub available_copies: u32,
    #[serde(default)]
    pub total_copies: u32,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub rating_count: u32,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl Book {
    /// Returns true if at least one copy can be borrowed.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Returns the cover URL if one is set and not blank.
    #[must_use]
    pub fn cover_url(&self) -> Option<&str> {
        self.cover_image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Formats the average rating, e.g. `4.2 (31)`.
    #[must_use]
    pub fn rating_label(&self) -> String {
        match self.average_rating {
            Some(rating) if self.rating_count > 0 => {
                format!("{rating:.1} ({})", self.rating_count)
            }
            _ => "No ratings".to_string(),
        }
    }

    /// Formats availability, e.g. `2/5 available`.
    #[must_use]
    pub fn availability_label(&self) -> String {
        format!("{}/{} available", self.available_copies, self.total_copies)
    }
}

/// Payload for creating a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    pub publication_year: i32,
    pub page_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    pub total_copies: u32,
    pub available_copies: u32,
    pub average_rating: f64,
    pub rating_count: u32,
}

/// Field-level validation failures keyed by form field name.
pub type FieldErrors = BTreeMap<&'static str, String>;

impl NewBook {
    /// Checks the payload against the catalog's creation rules.
    ///
    /// # Errors
    /// Returns one message per offending field.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        self.validate_for_year(chrono::Local::now().year())
    }

    /// Same as [`validate`](Self::validate) with an explicit current year.
    ///
    /// # Errors
    /// Returns one message per offending field.
    pub fn validate_for_year(&self, current_year: i32) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.title.trim().is_empty() {
            errors.insert("title", "Title is required".to_string());
        }
        if self.author.trim().is_empty() {
            errors.insert("author", "Author is required".to_string());
        }
        if self.isbn.trim().is_empty() {
            errors.insert("isbn", "ISBN is required".to_string());
        }
        if self.category.trim().is_empty() {
            errors.insert("category", "Category is required".to_string());
        }
        if self.publication_year < 1000 || self.publication_year > current_year {
            errors.insert(
                "publicationYear",
                "Please enter a valid publication year".to_string(),
            );
        }
        if self.page_count < 1 {
            errors.insert("pageCount", "Page count must be at least 1".to_string());
        }
        if self.total_copies < 1 {
            errors.insert("totalCopies", "Total copies must be at least 1".to_string());
        }
        if self.available_copies > self.total_copies {
            errors.insert(
                "availableCopies",
                "Available copies cannot exceed total copies".to_string(),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Personalized recommendation bundle for a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationDashboard {
    #[serde(default)]
    pub recommendations: Vec<Book>,
    #[serde(default)]
    pub trending: Vec<Book>,
    #[serde(default)]
    pub new_arrivals: Vec<Book>,
    #[serde(default)]
    pub category_recommendations: HashMap<String, Vec<Book>>,
}

#[cfg(test)]
pub(crate) fn sample_book(id: u64, title: &str, cover: Option<&str>) -> Book {
    Book {
        id: BookId(id),
        title: title.to_string(),
        author: "Frank Herbert".to_string(),
        isbn: "978-0441013593".to_string(),
        description: None,
        category: "Science Fiction".to_string(),
        publisher: None,
        publication_year: Some(1965),
        page_count: Some(412),
        language: Some("English".to_string()),
        cover_image_url: cover.map(String::from),
        available_copies: 2,
        total_copies: 3,
        average_rating: Some(4.5),
        rating_count: 10,
        created_at: None,
        updated_at: None,
    }
}
