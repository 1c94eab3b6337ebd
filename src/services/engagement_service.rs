//! Domain service for per-user interactions with a media item: ratings,
//! comments, watch status and the watchlist built from it.

use thiserror::Error;

use crate::api::types::{CommentDto, WatchlistDto};
use crate::clients::postgrest::PostgrestError;
use crate::constants::limits::{MAX_COMMENT_LENGTH, MAX_RATING};
use crate::domain::{MediaId, UserId, WatchStatus};
use crate::models::{ActivityRow, StatusRow};

#[derive(Debug, Error)]
pub enum EngagementError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Backend error: {0}")]
    Backend(#[from] PostgrestError),

    #[error("{0} insert returned no row")]
    MissingRow(&'static str),
}

#[async_trait::async_trait]
pub trait EngagementService: Send + Sync {
    /// Stores the user's rating, replacing any previous one for the item.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::Validation`] unless `rating` is within 1..=5.
    async fn rate(&self, user: &UserId, media: &MediaId, rating: i32) -> Result<(), EngagementError>;

    /// Posts a comment. The content is trimmed before it is stored.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::Validation`] for blank or oversized content.
    async fn add_comment(
        &self,
        user: &UserId,
        media: &MediaId,
        content: &str,
    ) -> Result<CommentDto, EngagementError>;

    async fn set_status(
        &self,
        user: &UserId,
        media: &MediaId,
        status: WatchStatus,
    ) -> Result<(), EngagementError>;

    async fn clear_status(&self, user: &UserId, media: &MediaId) -> Result<(), EngagementError>;

    async fn watchlist(&self, user: &UserId) -> Result<WatchlistDto, EngagementError>;

    async fn record_watch(&self, user: &UserId, media: &MediaId) -> Result<(), EngagementError>;

    async fn recent_activity(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<ActivityRow>, EngagementError>;
}

/// Accepts whole stars from 1 to 5.
pub fn validate_rating(rating: i32) -> Result<i32, EngagementError> {
    #[allow(clippy::cast_possible_truncation)]
    let max = MAX_RATING as i32;
    if (1..=max).contains(&rating) {
        Ok(rating)
    } else {
        Err(EngagementError::Validation(format!(
            "rating must be between 1 and {max}, got {rating}"
        )))
    }
}

pub fn normalize_comment(content: &str) -> Result<String, EngagementError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(EngagementError::Validation(
            "comment must not be empty".to_string(),
        ));
    }

    let length = trimmed.chars().count();
    if length > MAX_COMMENT_LENGTH {
        return Err(EngagementError::Validation(format!(
            "comment is too long ({length} > {MAX_COMMENT_LENGTH} characters)"
        )));
    }

    Ok(trimmed.to_string())
}

/// Groups tracked items by status. Rows whose media item is gone are skipped.
#[must_use]
pub fn partition_watchlist(rows: Vec<StatusRow>) -> WatchlistDto {
    let mut watchlist = WatchlistDto::default();

    for row in rows {
        let Some(media) = row.media_items else {
            continue;
        };
        match row.status {
            WatchStatus::Watching => watchlist.watching.push(media),
            WatchStatus::PlanToWatch => watchlist.plan_to_watch.push(media),
            WatchStatus::Completed => watchlist.completed.push(media),
        }
    }

    watchlist
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rating_bounds() {
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
        assert_eq!(validate_rating(1).unwrap(), 1);
        assert_eq!(validate_rating(5).unwrap(), 5);
    }

    #[test]
    fn comment_is_trimmed() {
        assert_eq!(normalize_comment("  great film \n").unwrap(), "great film");
    }

    #[test]
    fn blank_comment_is_rejected() {
        assert!(matches!(
            normalize_comment("   \t"),
            Err(EngagementError::Validation(_))
        ));
    }

    #[test]
    fn oversized_comment_is_rejected() {
        let long = "ы".repeat(MAX_COMMENT_LENGTH + 1);
        assert!(normalize_comment(&long).is_err());
        let fits = "ы".repeat(MAX_COMMENT_LENGTH);
        assert!(normalize_comment(&fits).is_ok());
    }

    #[test]
    fn watchlist_is_partitioned_by_status() {
        let rows: Vec<StatusRow> = serde_json::from_value(json!([
            { "status": "watching", "media_items": { "id": "a", "title": "A", "type": "tv" } },
            { "status": "completed", "media_items": { "id": "b", "title": "B", "type": "movie", "year": 1999 } },
            { "status": "plan_to_watch", "media_items": { "id": "c", "title": "C", "type": "movie" } },
            { "status": "completed", "media_items": null }
        ]))
        .unwrap();

        let watchlist = partition_watchlist(rows);
        assert_eq!(watchlist.watching.len(), 1);
        assert_eq!(watchlist.plan_to_watch[0].title, "C");
        assert_eq!(watchlist.completed.len(), 1);
        assert_eq!(watchlist.completed[0].year, Some(1999));
    }
}
