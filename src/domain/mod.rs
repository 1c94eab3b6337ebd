//! Domain types for the catalog with strong typing.
//!
//! Identifiers coming back from the backend are opaque: depending on the table
//! they are UUIDs or integers, so every ID newtype stores the canonical string
//! form and accepts either JSON representation.

pub mod filters;

pub use filters::{DiscoverFilters, MediaTypeFilter, SortOption};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                match RawId::deserialize(deserializer)? {
                    RawId::Text(s) => Ok(Self(s)),
                    RawId::Number(n) => Ok(Self(n.to_string())),
                }
            }
        }
    };
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

opaque_id!(
    /// Identifier of a row in `media_items`.
    MediaId
);
opaque_id!(
    /// Identifier of an authenticated user (also the `profiles` primary key).
    UserId
);
opaque_id!(GenreId);
opaque_id!(PersonId);
opaque_id!(CommentId);

/// Parse error for the string-backed enums below.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Movie,
    Tv,
}

impl MediaType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "tv" => Ok(Self::Tv),
            _ => Err(ParseEnumError::new("media type", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonRole {
    Actor,
    Director,
}

impl PersonRole {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Actor => "actor",
            Self::Director => "director",
        }
    }
}

/// Per-user tracking state of a media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    Watching,
    PlanToWatch,
    Completed,
}

impl WatchStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Watching => "watching",
            Self::PlanToWatch => "plan_to_watch",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "watching" => Ok(Self::Watching),
            "plan_to_watch" => Ok(Self::PlanToWatch),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseEnumError::new("watch status", s)),
        }
    }
}

/// Kind of entry written to `user_activities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Rating,
    Comment,
    Status,
    Watch,
}

impl ActivityKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::Comment => "comment",
            Self::Status => "status",
            Self::Watch => "watch",
        }
    }
}

/// Display language. Only affects which genre name column is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl FromStr for Locale {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lang = s.trim().to_ascii_lowercase();
        // Accept full tags like "ru-RU".
        match lang.split(['-', '_']).next().unwrap_or_default() {
            "en" | "" => Ok(Self::En),
            "ru" => Ok(Self::Ru),
            _ => Err(ParseEnumError::new("locale", s)),
        }
    }
}

impl Locale {
    /// Picks the localized name, falling back to the default one when the
    /// translation is missing.
    #[must_use]
    pub fn pick<'a>(&self, name: &'a str, name_ru: Option<&'a str>) -> &'a str {
        match (self, name_ru) {
            (Self::Ru, Some(ru)) if !ru.trim().is_empty() => ru,
            _ => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_accept_numbers_and_strings() {
        let id: GenreId = serde_json::from_str("7").unwrap();
        assert_eq!(id.as_str(), "7");

        let id: MediaId = serde_json::from_str("\"4f1c\"").unwrap();
        assert_eq!(id.to_string(), "4f1c");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"4f1c\"");
    }

    #[test]
    fn watch_status_round_trips_through_wire_names() {
        assert_eq!(
            "plan_to_watch".parse::<WatchStatus>().unwrap(),
            WatchStatus::PlanToWatch
        );
        assert_eq!(
            serde_json::to_string(&WatchStatus::PlanToWatch).unwrap(),
            "\"plan_to_watch\""
        );
        assert!("dropped".parse::<WatchStatus>().is_err());
    }

    #[test]
    fn locale_parsing_and_pick() {
        assert_eq!("ru-RU".parse::<Locale>().unwrap(), Locale::Ru);
        assert_eq!("".parse::<Locale>().unwrap(), Locale::En);
        assert!("de".parse::<Locale>().is_err());

        assert_eq!(Locale::Ru.pick("Drama", Some("Драма")), "Драма");
        assert_eq!(Locale::Ru.pick("Drama", Some(" ")), "Drama");
        assert_eq!(Locale::Ru.pick("Drama", None), "Drama");
        assert_eq!(Locale::En.pick("Drama", Some("Драма")), "Drama");
    }

    #[test]
    fn media_type_parse() {
        assert_eq!("TV".parse::<MediaType>().unwrap(), MediaType::Tv);
        assert!("anime".parse::<MediaType>().is_err());
    }
}
