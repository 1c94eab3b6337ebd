//! Audit trail of user actions in `user_activities`.
//!
//! Recording is best effort: the triggering operation has already succeeded
//! by the time an activity is written, so a failed insert is only logged.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::warn;

use crate::clients::postgrest::{PostgrestError, Query, RestClient, fetch};
use crate::constants::tables;
use crate::domain::{ActivityKind, MediaId, UserId};
use crate::models::ActivityRow;

#[derive(Clone)]
pub struct ActivityRecorder {
    rest: Arc<dyn RestClient>,
}

impl ActivityRecorder {
    #[must_use]
    pub fn new(rest: Arc<dyn RestClient>) -> Self {
        Self { rest }
    }

    pub async fn record(
        &self,
        user_id: &UserId,
        media_id: Option<&MediaId>,
        kind: ActivityKind,
        details: Value,
    ) {
        let payload = activity_payload(user_id, media_id, kind, details);

        if let Err(e) = self.rest.insert(tables::USER_ACTIVITIES, payload).await {
            warn!(
                user_id = %user_id,
                activity = kind.as_str(),
                error = %e,
                "Failed to record activity"
            );
            metrics::counter!("activity_record_failures_total", "activity" => kind.as_str())
                .increment(1);
        }
    }

    /// Newest-first activity of one user.
    pub async fn recent(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<ActivityRow>, PostgrestError> {
        let query = Query::from(tables::USER_ACTIVITIES)
            .select("user_id, media_id, activity_type, details, created_at")
            .eq("user_id", user_id)
            .order("created_at", false)
            .limit(limit);
        fetch(self.rest.as_ref(), &query).await
    }
}

#[must_use]
pub fn activity_payload(
    user_id: &UserId,
    media_id: Option<&MediaId>,
    kind: ActivityKind,
    details: Value,
) -> Value {
    json!({
        "user_id": user_id,
        "media_id": media_id,
        "activity_type": kind.as_str(),
        "details": details,
    })
}
