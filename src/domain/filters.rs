//! Discover page filter state.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{GenreId, Locale, MediaType, ParseEnumError};
use crate::constants::limits::{MAX_RATING, MAX_SEARCH_TERMS, MIN_YEAR, RATING_STEP};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaTypeFilter {
    #[default]
    All,
    Movie,
    Tv,
}

impl MediaTypeFilter {
    #[must_use]
    pub const fn media_type(&self) -> Option<MediaType> {
        match self {
            Self::All => None,
            Self::Movie => Some(MediaType::Movie),
            Self::Tv => Some(MediaType::Tv),
        }
    }
}

impl FromStr for MediaTypeFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            other => other.parse::<MediaType>().map(|t| match t {
                MediaType::Movie => Self::Movie,
                MediaType::Tv => Self::Tv,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    #[default]
    Rating,
    Views,
    Newest,
    Oldest,
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Rating => "rating",
            Self::Views => "views",
            Self::Newest => "newest",
            Self::Oldest => "oldest",
        };
        f.write_str(s)
    }
}

impl FromStr for SortOption {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "rating" => Ok(Self::Rating),
            "views" => Ok(Self::Views),
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            _ => Err(ParseEnumError {
                kind: "sort option",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverFilters {
    pub search: String,
    pub media_type: MediaTypeFilter,
    pub genres: Vec<GenreId>,
    pub year_from: i32,
    pub year_to: i32,
    pub min_rating: f64,
    pub sort: SortOption,
    pub locale: Locale,
}

impl Default for DiscoverFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            media_type: MediaTypeFilter::All,
            genres: Vec::new(),
            year_from: MIN_YEAR,
            year_to: current_year(),
            min_rating: 0.0,
            sort: SortOption::Rating,
            locale: Locale::En,
        }
    }
}

impl DiscoverFilters {
    /// Lower-cased, whitespace separated search terms.
    #[must_use]
    pub fn search_terms(&self) -> Vec<String> {
        self.search
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Returns a description of the first invalid field, if any.
    #[must_use]
    pub fn invalid_reason(&self) -> Option<String> {
        if self.year_from > self.year_to {
            return Some(format!(
                "year_from ({}) must not be after year_to ({})",
                self.year_from, self.year_to
            ));
        }

        if !(0.0..=MAX_RATING).contains(&self.min_rating) {
            return Some(format!(
                "min_rating must be between 0 and {MAX_RATING}, got {}",
                self.min_rating
            ));
        }

        if (self.min_rating / RATING_STEP).fract() != 0.0 {
            return Some(format!(
                "min_rating must be a multiple of {RATING_STEP}, got {}",
                self.min_rating
            ));
        }

        let terms = self.search_terms().len();
        if terms > MAX_SEARCH_TERMS {
            return Some(format!(
                "search accepts at most {MAX_SEARCH_TERMS} words, got {terms}"
            ));
        }

        None
    }
}

#[must_use]
pub fn current_year() -> i32 {
    chrono::Utc::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_full_year_range() {
        let filters = DiscoverFilters::default();
        assert_eq!(filters.year_from, 1900);
        assert_eq!(filters.year_to, current_year());
        assert_eq!(filters.sort, SortOption::Rating);
        assert_eq!(filters.media_type, MediaTypeFilter::All);
        assert!(filters.invalid_reason().is_none());
    }

    #[test]
    fn search_terms_are_lowercased_and_split() {
        let filters = DiscoverFilters {
            search: "  The  MATRIX ".to_string(),
            ..DiscoverFilters::default()
        };
        assert_eq!(filters.search_terms(), vec!["the", "matrix"]);
    }

    #[test]
    fn rejects_inverted_years_and_odd_ratings() {
        let filters = DiscoverFilters {
            year_from: 2010,
            year_to: 2000,
            ..DiscoverFilters::default()
        };
        assert!(filters.invalid_reason().is_some());

        let filters = DiscoverFilters {
            min_rating: 3.3,
            ..DiscoverFilters::default()
        };
        assert!(filters.invalid_reason().is_some());

        let filters = DiscoverFilters {
            min_rating: 5.5,
            ..DiscoverFilters::default()
        };
        assert!(filters.invalid_reason().is_some());

        let filters = DiscoverFilters {
            min_rating: 3.5,
            ..DiscoverFilters::default()
        };
        assert!(filters.invalid_reason().is_none());
    }

    #[test]
    fn rejects_more_search_words_than_the_query_carries() {
        let words = |n: usize| vec!["war"; n].join(" ");

        let filters = DiscoverFilters {
            search: words(MAX_SEARCH_TERMS),
            ..DiscoverFilters::default()
        };
        assert!(filters.invalid_reason().is_none());

        let filters = DiscoverFilters {
            search: words(MAX_SEARCH_TERMS + 1),
            ..DiscoverFilters::default()
        };
        let reason = filters.invalid_reason().unwrap();
        assert!(reason.contains("at most"), "{reason}");
    }

    #[test]
    fn parse_type_and_sort() {
        assert_eq!("".parse::<MediaTypeFilter>().unwrap(), MediaTypeFilter::All);
        assert_eq!("tv".parse::<MediaTypeFilter>().unwrap(), MediaTypeFilter::Tv);
        assert!("music".parse::<MediaTypeFilter>().is_err());
        assert_eq!("Views".parse::<SortOption>().unwrap(), SortOption::Views);
        assert!("popular".parse::<SortOption>().is_err());
    }
}
