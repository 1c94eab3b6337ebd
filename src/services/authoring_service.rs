//! Domain service for creating and editing media entries from the admin form.
//!
//! A save is a sequence of independent backend writes with no transaction:
//! files are uploaded first, then the media row is written, then its genre
//! links and finally the cast and crew. When a later step fails the rows
//! already written stay in place and the error names the media id and the
//! stage that failed.

use std::fmt;

use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::api::types::MediaSavedDto;
use crate::clients::bunny::BunnyError;
use crate::clients::postgrest::PostgrestError;
use crate::clients::storage::StorageError;
use crate::domain::{GenreId, MediaId, PersonId, PersonRole};
use crate::services::media_form::{CastMember, MediaDraft, MediaFiles, MediaFormValues, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthoringStage {
    PosterUpload,
    VideoUpload,
    MediaInsert,
    MediaUpdate,
    Genres,
    PhotoUpload,
    Persons,
}

impl AuthoringStage {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PosterUpload => "poster_upload",
            Self::VideoUpload => "video_upload",
            Self::MediaInsert => "media_insert",
            Self::MediaUpdate => "media_update",
            Self::Genres => "genres",
            Self::PhotoUpload => "photo_upload",
            Self::Persons => "persons",
        }
    }
}

impl fmt::Display for AuthoringStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying failure of one authoring step.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Video(#[from] BunnyError),

    #[error(transparent)]
    Backend(#[from] PostgrestError),

    #[error("{0} returned no row")]
    MissingRow(&'static str),
}

#[derive(Debug, Error)]
pub enum AuthoringError {
    #[error("Invalid media form: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Media not found: {0}")]
    NotFound(MediaId),

    /// Nothing was written.
    #[error("Failed at {stage}: {source}")]
    Failed {
        stage: AuthoringStage,
        #[source]
        source: StageError,
    },

    /// The media row exists but a later step failed.
    #[error("Media {media_id} saved incompletely, failed at {stage}: {source}")]
    Partial {
        media_id: MediaId,
        stage: AuthoringStage,
        #[source]
        source: StageError,
    },
}

impl AuthoringError {
    pub(crate) fn failed(stage: AuthoringStage, source: impl Into<StageError>) -> Self {
        Self::Failed {
            stage,
            source: source.into(),
        }
    }

    pub(crate) fn partial(
        media_id: &MediaId,
        stage: AuthoringStage,
        source: impl Into<StageError>,
    ) -> Self {
        Self::Partial {
            media_id: media_id.clone(),
            stage,
            source: source.into(),
        }
    }
}

#[async_trait::async_trait]
pub trait AuthoringService: Send + Sync {
    /// Creates a media item with its genres, cast and crew.
    ///
    /// # Errors
    ///
    /// - [`AuthoringError::Validation`] before any backend call
    /// - [`AuthoringError::Failed`] when an upload or the media insert fails
    /// - [`AuthoringError::Partial`] when a relation write fails afterwards
    async fn create_media(
        &self,
        values: MediaFormValues,
        files: MediaFiles,
    ) -> Result<MediaSavedDto, AuthoringError>;

    /// Updates a media item. Poster and video are replaced only when new
    /// files are attached; genres, cast and crew are replaced as a whole.
    async fn update_media(
        &self,
        id: &MediaId,
        values: MediaFormValues,
        files: MediaFiles,
    ) -> Result<MediaSavedDto, AuthoringError>;
}

/// Column values of `media_items` for a save. URLs are left out when `None`
/// so an edit keeps the stored files.
#[must_use]
pub fn media_payload(draft: &MediaDraft, poster_url: Option<&str>, video_url: Option<&str>) -> Value {
    let mut payload = Map::new();
    payload.insert("title".into(), json!(draft.title));
    payload.insert("original_title".into(), json!(draft.original_title));
    payload.insert("type".into(), json!(draft.media_type));
    payload.insert("description".into(), json!(draft.description));
    payload.insert("year".into(), json!(draft.year));
    payload.insert("duration".into(), json!(draft.duration));
    if let Some(url) = poster_url {
        payload.insert("poster_url".into(), json!(url));
    }
    if let Some(url) = video_url {
        payload.insert("video_url".into(), json!(url));
    }
    Value::Object(payload)
}

#[must_use]
pub fn genre_link_payload(media_id: &MediaId, genre_id: &GenreId) -> Value {
    json!({ "media_id": media_id, "genre_id": genre_id })
}

#[must_use]
pub fn person_payload(member: &CastMember, photo_url: Option<&str>) -> Value {
    json!({ "name": member.name, "photo_url": photo_url })
}

#[must_use]
pub fn person_link_payload(
    media_id: &MediaId,
    person_id: &PersonId,
    role: PersonRole,
    character_name: Option<&str>,
) -> Value {
    json!({
        "media_id": media_id,
        "person_id": person_id,
        "role": role.as_str(),
        "character_name": character_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MediaType;

    fn draft() -> MediaDraft {
        MediaDraft {
            title: "Solaris".to_string(),
            original_title: None,
            media_type: MediaType::Movie,
            description: "A psychologist is sent to a station orbiting Solaris.".to_string(),
            year: 1972,
            duration: 167,
            genres: vec![GenreId::new("5")],
            poster: None,
            video: None,
            actors: Vec::new(),
            directors: Vec::new(),
        }
    }

    #[test]
    fn create_payload_carries_urls() {
        let payload = media_payload(&draft(), Some("https://p"), Some("https://v"));
        assert_eq!(payload["type"], "movie");
        assert_eq!(payload["year"], 1972);
        assert_eq!(payload["poster_url"], "https://p");
        assert_eq!(payload["video_url"], "https://v");
        assert!(payload["original_title"].is_null());
    }

    #[test]
    fn edit_payload_keeps_stored_files() {
        let payload = media_payload(&draft(), None, None);
        assert!(payload.get("poster_url").is_none());
        assert!(payload.get("video_url").is_none());
    }

    #[test]
    fn person_link_has_role_and_character() {
        let payload = person_link_payload(
            &MediaId::new("m1"),
            &PersonId::new("7"),
            PersonRole::Actor,
            Some("Kris Kelvin"),
        );
        assert_eq!(payload["role"], "actor");
        assert_eq!(payload["person_id"], "7");
        assert_eq!(payload["character_name"], "Kris Kelvin");
    }

    #[test]
    fn partial_error_names_media_and_stage() {
        let err = AuthoringError::partial(
            &MediaId::new("m9"),
            AuthoringStage::Genres,
            StageError::MissingRow("media_genres"),
        );
        let message = err.to_string();
        assert!(message.contains("m9"));
        assert!(message.contains("genres"));
    }
}
