//! Add-book form draft and its conversion into a create payload.

use chrono::Datelike;

use crate::domain::entities::{FieldErrors, NewBook};

/// Categories offered by the add-book form.
pub const CATEGORIES: [&str; 18] = [
    "Fiction",
    "Non-Fiction",
    "Science Fiction",
    "Fantasy",
    "Mystery",
    "Romance",
    "Thriller",
    "Biography",
    "History",
    "Science",
    "Technology",
    "Business",
    "Self-Help",
    "Health",
    "Travel",
    "Children",
    "Young Adult",
    "Poetry",
];

/// Languages offered by the add-book form.
pub const LANGUAGES: [&str; 12] = [
    "English",
    "Spanish",
    "French",
    "German",
    "Italian",
    "Portuguese",
    "Russian",
    "Chinese",
    "Japanese",
    "Korean",
    "Hindi",
    "Arabic",
];

/// Raw text of every add-book field, exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub language: String,
    pub publisher: String,
    pub publication_year: String,
    pub page_count: String,
    pub description: String,
    pub cover_image_url: String,
    pub total_copies: String,
    pub available_copies: String,
}

impl BookDraft {
    /// Empty draft with the form's starting values.
    #[must_use]
    pub fn new(current_year: i32) -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            isbn: String::new(),
            category: String::new(),
            language: LANGUAGES[0].to_string(),
            publisher: String::new(),
            publication_year: current_year.to_string(),
            page_count: "0".to_string(),
            description: String::new(),
            cover_image_url: String::new(),
            total_copies: "1".to_string(),
            available_copies: "1".to_string(),
        }
    }

    /// Parses and validates the draft.
    ///
    /// # Errors
    /// Returns per-field messages for unparsable numbers and rule violations.
    pub fn to_new_book(&self) -> Result<NewBook, FieldErrors> {
        self.to_new_book_for_year(chrono::Local::now().year())
    }

    /// Same as [`to_new_book`](Self::to_new_book) with an explicit current year.
    ///
    /// # Errors
    /// Returns per-field messages for unparsable numbers and rule violations.
    pub fn to_new_book_for_year(&self, current_year: i32) -> Result<NewBook, FieldErrors> {
        let mut errors = FieldErrors::new();

        let publication_year = parse_number(
            &self.publication_year,
            "publicationYear",
            "Please enter a valid publication year",
            &mut errors,
        );
        let page_count = parse_number(
            &self.page_count,
            "pageCount",
            "Page count must be at least 1",
            &mut errors,
        );
        let total_copies = parse_number(
            &self.total_copies,
            "totalCopies",
            "Total copies must be at least 1",
            &mut errors,
        );
        let available_copies = parse_number(
            &self.available_copies,
            "availableCopies",
            "Available copies must be a number",
            &mut errors,
        );

        let book = NewBook {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            isbn: self.isbn.trim().to_string(),
            category: self.category.trim().to_string(),
            language: self.language.trim().to_string(),
            publisher: non_blank(&self.publisher),
            publication_year: publication_year.unwrap_or_default(),
            page_count: page_count.unwrap_or_default(),
            description: non_blank(&self.description),
            cover_image_url: non_blank(&self.cover_image_url),
            total_copies: total_copies.unwrap_or_default(),
            available_copies: available_copies.unwrap_or_default(),
            average_rating: 0.0,
            rating_count: 0,
        };

        if let Err(rule_errors) = book.validate_for_year(current_year) {
            for (field, message) in rule_errors {
                errors.entry(field).or_insert(message);
            }
        }

        if errors.is_empty() {
            Ok(book)
        } else {
            Err(errors)
        }
    }
}

fn parse_number<T: std::str::FromStr>(
    raw: &str,
    field: &'static str,
    message: &str,
    errors: &mut FieldErrors,
) -> Option<T> {
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        errors.insert(field, message.to_string());
    }
    parsed
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> BookDraft {
        BookDraft {
            title: " Dune ".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: "9780441013593".to_string(),
            category: "Science Fiction".to_string(),
            page_count: "412".to_string(),
            publication_year: "1965".to_string(),
            ..BookDraft::new(2026)
        }
    }

    #[test]
    fn test_new_draft_defaults() {
        let draft = BookDraft::new(2026);
        assert_eq!(draft.language, "English");
        assert_eq!(draft.publication_year, "2026");
        assert_eq!(draft.total_copies, "1");
    }

    #[test]
    fn test_valid_draft_converts() {
        let book = filled().to_new_book_for_year(2026).unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.page_count, 412);
        assert_eq!(book.publisher, None);
        assert_eq!(book.total_copies, 1);
    }

    #[test]
    fn test_empty_draft_reports_required_fields() {
        let errors = BookDraft::new(2026).to_new_book_for_year(2026).unwrap_err();
        for field in ["title", "author", "isbn", "category", "pageCount"] {
            assert!(errors.contains_key(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_unparsable_numbers() {
        let mut draft = filled();
        draft.total_copies = "many".to_string();
        draft.publication_year = "MCMLXV".to_string();

        let errors = draft.to_new_book_for_year(2026).unwrap_err();
        assert_eq!(
            errors.get("totalCopies").map(String::as_str),
            Some("Total copies must be at least 1")
        );
        assert!(errors.contains_key("publicationYear"));
    }
}
