//! Advanced search filters.

use serde::{Deserialize, Serialize};

/// Optional constraints applied on top of a free-text search.
///
/// Unset fields are omitted from the query string entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rating: Option<u8>,
    #[serde(default)]
    pub available_only: bool,
}

impl SearchFilters {
    /// Returns true if no filter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Number of filters currently set.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.to_query_pairs().len()
    }

    /// Converts the set filters into API query parameters.
    ///
    /// Blank strings, zero values and a false availability flag are skipped,
    /// matching how the catalog API treats absent parameters.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        let text_fields = [
            ("title", &self.title),
            ("author", &self.author),
            ("category", &self.category),
            ("language", &self.language),
            ("isbn", &self.isbn),
            ("publisher", &self.publisher),
        ];
        for (key, value) in text_fields {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((key, v.to_string()));
            }
        }

        for (key, value) in [("minYear", self.min_year), ("maxYear", self.max_year)] {
            if let Some(v) = value.filter(|v| *v != 0) {
                pairs.push((key, v.to_string()));
            }
        }

        for (key, value) in [("minRating", self.min_rating), ("maxRating", self.max_rating)] {
            if let Some(v) = value.filter(|v| *v != 0) {
                pairs.push((key, v.to_string()));
            }
        }

        if self.available_only {
            pairs.push(("availableOnly", "true".to_string()));
        }

        pairs
    }
}
