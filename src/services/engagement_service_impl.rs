//! PostgREST implementation of the [`EngagementService`] trait.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::info;

use crate::api::types::{CommentDto, WatchlistDto};
use crate::clients::postgrest::{Query, RestClient, decode_rows, fetch};
use crate::constants::tables;
use crate::domain::{ActivityKind, MediaId, UserId, WatchStatus};
use crate::models::{ActivityRow, CommentRow, StatusRow};
use crate::services::activity::ActivityRecorder;
use crate::services::engagement_service::{
    EngagementError, EngagementService, normalize_comment, partition_watchlist, validate_rating,
};

const RATING_CONFLICT: &str = "media_id,user_id";
const STATUS_CONFLICT: &str = "user_id,media_id";

pub struct SupabaseEngagementService {
    rest: Arc<dyn RestClient>,
    activity: ActivityRecorder,
}

impl SupabaseEngagementService {
    #[must_use]
    pub fn new(rest: Arc<dyn RestClient>, activity: ActivityRecorder) -> Self {
        Self { rest, activity }
    }
}

#[async_trait::async_trait]
impl EngagementService for SupabaseEngagementService {
    async fn rate(&self, user: &UserId, media: &MediaId, rating: i32) -> Result<(), EngagementError> {
        let rating = validate_rating(rating)?;

        self.rest
            .upsert(
                tables::RATINGS,
                json!({ "media_id": media, "user_id": user, "rating": rating }),
                RATING_CONFLICT,
            )
            .await?;
        info!(media_id = %media, user_id = %user, rating, "Rating saved");

        self.activity
            .record(user, Some(media), ActivityKind::Rating, json!({ "rating": rating }))
            .await;
        Ok(())
    }

    async fn add_comment(
        &self,
        user: &UserId,
        media: &MediaId,
        content: &str,
    ) -> Result<CommentDto, EngagementError> {
        let content = normalize_comment(content)?;

        let rows = self
            .rest
            .insert(
                tables::COMMENTS,
                json!({ "media_id": media, "user_id": user, "content": content }),
            )
            .await?;
        let comment: CommentRow = decode_rows(tables::COMMENTS, rows)?
            .into_iter()
            .next()
            .ok_or(EngagementError::MissingRow(tables::COMMENTS))?;

        self.activity
            .record(
                user,
                Some(media),
                ActivityKind::Comment,
                json!({ "comment_id": comment.id }),
            )
            .await;

        Ok(CommentDto {
            id: comment.id,
            content: comment.content,
            created_at: comment.created_at,
            user_id: comment.user_id,
            author: None,
        })
    }

    async fn set_status(
        &self,
        user: &UserId,
        media: &MediaId,
        status: WatchStatus,
    ) -> Result<(), EngagementError> {
        self.rest
            .upsert(
                tables::USER_MEDIA_STATUSES,
                json!({ "user_id": user, "media_id": media, "status": status }),
                STATUS_CONFLICT,
            )
            .await?;

        self.activity
            .record(user, Some(media), ActivityKind::Status, json!({ "status": status }))
            .await;
        Ok(())
    }

    async fn clear_status(&self, user: &UserId, media: &MediaId) -> Result<(), EngagementError> {
        let query = Query::from(tables::USER_MEDIA_STATUSES)
            .eq("user_id", user)
            .eq("media_id", media);
        self.rest.delete(&query).await?;
        Ok(())
    }

    async fn watchlist(&self, user: &UserId) -> Result<WatchlistDto, EngagementError> {
        let query = Query::from(tables::USER_MEDIA_STATUSES)
            .select("status, media_items!inner(id, title, poster_url, type, year)")
            .eq("user_id", user);
        let rows: Vec<StatusRow> = fetch(self.rest.as_ref(), &query).await?;
        Ok(partition_watchlist(rows))
    }

    async fn record_watch(&self, user: &UserId, media: &MediaId) -> Result<(), EngagementError> {
        self.activity
            .record(user, Some(media), ActivityKind::Watch, Value::Null)
            .await;
        Ok(())
    }

    async fn recent_activity(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<ActivityRow>, EngagementError> {
        Ok(self.activity.recent(user, limit).await?)
    }
}
