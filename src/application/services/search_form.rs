//! Search bar and advanced filter form state.

use crate::domain::entities::SearchFilters;

/// Lowest publication year offered by the year filters.
pub const MIN_FILTER_YEAR: i32 = 1800;

/// Star ratings offered by the rating filter.
pub const RATING_OPTIONS: [u8; 5] = [1, 2, 3, 4, 5];

/// Editable fields of the advanced filter panel, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Title,
    Author,
    Category,
    Language,
    Publisher,
    MinYear,
    MaxYear,
    MinRating,
    Isbn,
    AvailableOnly,
}

impl FilterField {
    pub const ALL: [Self; 10] = [
        Self::Title,
        Self::Author,
        Self::Category,
        Self::Language,
        Self::Publisher,
        Self::MinYear,
        Self::MaxYear,
        Self::MinRating,
        Self::Isbn,
        Self::AvailableOnly,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Author => "Author",
            Self::Category => "Category",
            Self::Language => "Language",
            Self::Publisher => "Publisher",
            Self::MinYear => "Min Year",
            Self::MaxYear => "Max Year",
            Self::MinRating => "Min Rating",
            Self::Isbn => "ISBN",
            Self::AvailableOnly => "Available only",
        }
    }

    /// Fields whose value is chosen from a list rather than typed.
    #[must_use]
    pub const fn is_select(self) -> bool {
        matches!(
            self,
            Self::Category | Self::Language | Self::Publisher | Self::MinRating
        )
    }

    #[must_use]
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    #[must_use]
    pub fn previous(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Query text plus the advanced filters, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchForm {
    query: String,
    filters: SearchFilters,
    show_filters: bool,
}

impl SearchForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    #[must_use]
    pub const fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    #[must_use]
    pub const fn shows_filters(&self) -> bool {
        self.show_filters
    }

    pub fn toggle_filters(&mut self) {
        self.show_filters = !self.show_filters;
    }

    /// Returns true if either the query or any filter is set.
    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        !self.filters.is_empty() || !self.query.is_empty()
    }

    /// Resets the query and every filter.
    pub fn clear(&mut self) {
        self.query.clear();
        self.filters = SearchFilters::default();
    }

    /// Current value of a field as display text. Unset fields are empty.
    #[must_use]
    pub fn value(&self, field: FilterField) -> String {
        let f = &self.filters;
        match field {
            FilterField::Title => f.title.clone().unwrap_or_default(),
            FilterField::Author => f.author.clone().unwrap_or_default(),
            FilterField::Category => f.category.clone().unwrap_or_default(),
            FilterField::Language => f.language.clone().unwrap_or_default(),
            FilterField::Publisher => f.publisher.clone().unwrap_or_default(),
            FilterField::Isbn => f.isbn.clone().unwrap_or_default(),
            FilterField::MinYear => f.min_year.map(|y| y.to_string()).unwrap_or_default(),
            FilterField::MaxYear => f.max_year.map(|y| y.to_string()).unwrap_or_default(),
            FilterField::MinRating => f
                .min_rating
                .map(|r| format!("{r}+ Stars"))
                .unwrap_or_default(),
            FilterField::AvailableOnly => {
                String::from(if f.available_only { "yes" } else { "no" })
            }
        }
    }

    /// Sets a field from raw text. Empty or unparsable input unsets it.
    pub fn update(&mut self, field: FilterField, raw: &str) {
        let raw = raw.trim();
        let text = (!raw.is_empty()).then(|| raw.to_string());
        let f = &mut self.filters;
        match field {
            FilterField::Title => f.title = text,
            FilterField::Author => f.author = text,
            FilterField::Category => f.category = text,
            FilterField::Language => f.language = text,
            FilterField::Publisher => f.publisher = text,
            FilterField::Isbn => f.isbn = text,
            FilterField::MinYear => f.min_year = raw.parse().ok(),
            FilterField::MaxYear => f.max_year = raw.parse().ok(),
            FilterField::MinRating => {
                f.min_rating = raw
                    .trim_end_matches("+ Stars")
                    .parse()
                    .ok()
                    .filter(|r| RATING_OPTIONS.contains(r));
            }
            FilterField::AvailableOnly => {
                f.available_only = matches!(raw, "yes" | "true" | "1");
            }
        }
    }

    /// Flips the availability checkbox.
    pub fn toggle_available_only(&mut self) {
        self.filters.available_only = !self.filters.available_only;
    }

    /// Steps a select field through `options`, wrapping through "unset".
    pub fn cycle(&mut self, field: FilterField, options: &[String], forward: bool) {
        let owned_ratings: Vec<String>;
        let options = if field == FilterField::MinRating {
            owned_ratings = RATING_OPTIONS.iter().map(u8::to_string).collect();
            owned_ratings.as_slice()
        } else {
            options
        };

        let current = match field {
            FilterField::MinRating => self.filters.min_rating.map(|r| r.to_string()),
            _ => Some(self.value(field)).filter(|v| !v.is_empty()),
        };

        // Position 0 is "unset"; options occupy 1..=len.
        let slots = options.len() + 1;
        let pos = current
            .and_then(|c| options.iter().position(|o| *o == c))
            .map_or(0, |i| i + 1);
        let next = if forward {
            (pos + 1) % slots
        } else {
            (pos + slots - 1) % slots
        };

        let value = if next == 0 { "" } else { options[next - 1].as_str() };
        self.update(field, value);
    }

    /// Snapshot of what a search should be run with.
    #[must_use]
    pub fn submission(&self) -> (String, SearchFilters) {
        (self.query.trim().to_string(), self.filters.clone())
    }
}

/// Publication years offered by the year filters, newest first.
#[must_use]
pub fn year_options(current_year: i32) -> Vec<i32> {
    (MIN_FILTER_YEAR..=current_year).rev().collect()
}
