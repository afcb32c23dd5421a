//! Paging types shared by catalog queries.

use serde::{Deserialize, Serialize};

/// Default number of books per page.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// One page of a paginated API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    /// Zero-based page index.
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub number_of_elements: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
}

impl<T> Page<T> {
    /// Builds a single page holding every item.
    #[must_use]
    pub fn single(content: Vec<T>) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let len = content.len() as u32;
        Self {
            content,
            total_elements: u64::from(len),
            total_pages: u32::from(len > 0),
            number: 0,
            size: len,
            number_of_elements: len,
            first: true,
            last: true,
        }
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        !self.last && self.number + 1 < self.total_pages
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 0
    }
}

/// Sort direction accepted by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paging and sorting parameters for list queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort_by: String,
    pub sort_dir: SortDirection,
}

impl PageRequest {
    #[must_use]
    pub fn new(page: u32) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn sorted_by(mut self, field: impl Into<String>, dir: SortDirection) -> Self {
        self.sort_by = field.into();
        self.sort_dir = dir;
        self
    }

    /// Query parameters in the order the API documents them.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.to_string()),
            ("size", self.size.to_string()),
            ("sortBy", self.sort_by.clone()),
            ("sortDir", self.sort_dir.to_string()),
        ]
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort_by: "title".to_string(),
            sort_dir: SortDirection::Asc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_spring_page() {
        let json = r#"{
            "content": [1, 2, 3],
            "pageable": {"pageNumber": 1, "pageSize": 3},
            "totalElements": 9,
            "totalPages": 3,
            "number": 1,
            "size": 3,
            "numberOfElements": 3,
            "first": false,
            "last": false,
            "sort": {"sorted": true, "unsorted": false}
        }"#;

        let page: Page<u32> = serde_json::from_str(json).unwrap();
        assert_eq!(page.content, vec![1, 2, 3]);
        assert!(page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn test_single_page() {
        let page = Page::single(vec!["a", "b"]);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next());
        assert!(!page.has_previous());

        let empty: Page<u8> = Page::single(Vec::new());
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_page_request_defaults() {
        let pairs = PageRequest::new(2).to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("page", "2".to_string()),
                ("size", "12".to_string()),
                ("sortBy", "title".to_string()),
                ("sortDir", "asc".to_string()),
            ]
        );
    }
}
