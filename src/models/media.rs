use serde::{Deserialize, Serialize};

use super::engagement::{CommentRow, RatingRow};
use super::null_as_default;
use super::people::PersonRow;
use crate::domain::{GenreId, MediaId, MediaType, PersonRole};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub id: MediaId,
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub duration: Option<i32>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A media item together with whatever relations the query embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaRow {
    #[serde(flatten)]
    pub item: MediaItem,
    #[serde(default, deserialize_with = "null_as_default")]
    pub media_genres: Vec<MediaGenreRow>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ratings: Vec<RatingRow>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub media_persons: Vec<MediaPersonRow>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub media_views: Vec<ViewCountRow>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<CommentRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreRow {
    pub id: GenreId,
    pub name: String,
    #[serde(default)]
    pub name_ru: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaGenreRow {
    #[serde(default)]
    pub genres: Option<GenreRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaPersonRow {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub character_name: Option<String>,
    #[serde(default)]
    pub persons: Option<PersonRow>,
}

impl MediaPersonRow {
    #[must_use]
    pub fn has_role(&self, role: PersonRole) -> bool {
        self.role.as_deref() == Some(role.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ViewCountRow {
    #[serde(default)]
    pub count: i64,
}

/// Compact media shape embedded in watchlist rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaSummary {
    pub id: MediaId,
    pub title: String,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    #[serde(default)]
    pub year: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_row_tolerates_null_and_missing_embeds() {
        let json = serde_json::json!({
            "id": "m1",
            "title": "Heat",
            "type": "movie",
            "year": 1995,
            "media_genres": null,
            "ratings": [{ "rating": 4, "user_id": "u1" }],
            "media_persons": [
                { "role": "director", "character_name": null, "persons": { "id": 3, "name": "Michael Mann", "photo_url": null } }
            ]
        });

        let row: MediaRow = serde_json::from_value(json).unwrap();
        assert_eq!(row.item.title, "Heat");
        assert_eq!(row.item.media_type, MediaType::Movie);
        assert!(row.media_genres.is_empty());
        assert!(row.media_views.is_empty());
        assert_eq!(row.ratings.len(), 1);
        assert!(row.media_persons[0].has_role(PersonRole::Director));
        assert!(!row.media_persons[0].has_role(PersonRole::Actor));
    }
}
