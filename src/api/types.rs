use serde::{Deserialize, Serialize};

use crate::domain::{CommentId, GenreId, MediaId, MediaType, PersonId, UserId, WatchStatus};
use crate::models::{MediaSummary, ProfileRow};
use crate::services::media_form::FieldError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Per-field problems of a rejected form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            fields: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            fields: None,
        }
    }

    pub fn field_errors(message: impl Into<String>, fields: Vec<FieldError>) -> Self {
        Self {
            fields: Some(fields),
            ..Self::error(message)
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct GenreDto {
    pub id: GenreId,
    pub name: String,
}

/// Genre as offered in the discover filter, with the locale-specific label.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct GenreOptionDto {
    pub id: GenreId,
    pub name: String,
    pub name_ru: Option<String>,
    pub display_name: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PersonDto {
    pub id: Option<PersonId>,
    pub name: String,
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
}

/// Discover card view model.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DiscoverItemDto {
    pub id: MediaId,
    pub title: String,
    pub original_title: Option<String>,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub duration: Option<i32>,
    pub poster_url: Option<String>,
    pub genres: Vec<GenreDto>,
    pub average_rating: f64,
    pub rating_count: usize,
    pub view_count: i64,
    pub actors: Vec<PersonDto>,
    pub directors: Vec<PersonDto>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CommentAuthorDto {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CommentDto {
    pub id: CommentId,
    pub content: String,
    pub created_at: String,
    pub user_id: UserId,
    pub author: Option<CommentAuthorDto>,
}

/// Watch page view model.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MediaDetailDto {
    pub id: MediaId,
    pub title: String,
    pub original_title: Option<String>,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub duration: Option<i32>,
    pub poster_url: Option<String>,
    pub embed_url: String,
    pub genres: Vec<GenreDto>,
    pub average_rating: f64,
    pub rating_count: usize,
    pub actors: Vec<PersonDto>,
    pub directors: Vec<PersonDto>,
    pub comments: Vec<CommentDto>,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct WatchlistDto {
    pub watching: Vec<MediaSummary>,
    pub plan_to_watch: Vec<MediaSummary>,
    pub completed: Vec<MediaSummary>,
}

#[derive(Debug, Serialize, Clone)]
pub struct CurrentUserDto {
    pub id: UserId,
    pub email: Option<String>,
    pub profile: Option<ProfileRow>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AdminMediaDto {
    pub id: MediaId,
    pub title: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct AdminStatsDto {
    pub total_users: usize,
    pub total_media: usize,
    pub admin_users: usize,
}

#[derive(Debug, Serialize, Clone)]
pub struct AdminOverviewDto {
    pub users: Vec<ProfileRow>,
    pub media: Vec<AdminMediaDto>,
    pub stats: AdminStatsDto,
}

/// Result of a create or edit through the media form.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MediaSavedDto {
    pub id: MediaId,
    pub title: String,
    pub poster_url: Option<String>,
    pub video_url: Option<String>,
    pub genres: usize,
    pub actors: usize,
    pub directors: usize,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: i32,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: WatchStatus,
}

#[derive(Debug, Deserialize)]
pub struct SetAdminRequest {
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
