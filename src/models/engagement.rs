use serde::{Deserialize, Serialize};

use super::media::MediaSummary;
use crate::domain::{CommentId, MediaId, UserId, WatchStatus};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingRow {
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentRow {
    pub id: CommentId,
    pub content: String,
    pub created_at: String,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusRow {
    pub status: WatchStatus,
    #[serde(default)]
    pub media_items: Option<MediaSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityRow {
    pub user_id: UserId,
    #[serde(default)]
    pub media_id: Option<MediaId>,
    pub activity_type: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}
