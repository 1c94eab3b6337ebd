use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::api::types::{AdminMediaDto, AdminOverviewDto};
use crate::clients::postgrest::{Query, RestClient, decode_rows, fetch};
use crate::constants::tables;
use crate::domain::{MediaId, UserId};
use crate::models::ProfileRow;
use crate::services::admin_service::{AdminError, AdminService, compute_stats};

pub struct SupabaseAdminService {
    rest: Arc<dyn RestClient>,
}

impl SupabaseAdminService {
    #[must_use]
    pub fn new(rest: Arc<dyn RestClient>) -> Self {
        Self { rest }
    }
}

#[async_trait::async_trait]
impl AdminService for SupabaseAdminService {
    async fn overview(&self) -> Result<AdminOverviewDto, AdminError> {
        let users_query = Query::from(tables::PROFILES)
            .select("id, username, avatar_url, is_admin")
            .order("username", true);
        let media_query = Query::from(tables::MEDIA_ITEMS)
            .select("id, title, type")
            .order("created_at", false);

        let (users, media) = tokio::join!(
            fetch::<ProfileRow>(self.rest.as_ref(), &users_query),
            fetch::<AdminMediaDto>(self.rest.as_ref(), &media_query),
        );
        let users = users?;
        let media = media?;

        let stats = compute_stats(&users, media.len());
        Ok(AdminOverviewDto {
            users,
            media,
            stats,
        })
    }

    async fn set_admin(&self, user: &UserId, is_admin: bool) -> Result<ProfileRow, AdminError> {
        let query = Query::from(tables::PROFILES)
            .select("id, username, avatar_url, is_admin")
            .eq("id", user);
        let rows = self
            .rest
            .update(&query, json!({ "is_admin": is_admin }))
            .await?;

        let profile = decode_rows::<ProfileRow>(tables::PROFILES, rows)?
            .into_iter()
            .next()
            .ok_or_else(|| AdminError::UserNotFound(user.clone()))?;

        info!(user_id = %user, is_admin, "Admin flag updated");
        Ok(profile)
    }

    async fn delete_media(&self, id: &MediaId) -> Result<(), AdminError> {
        let query = Query::from(tables::MEDIA_ITEMS).select("id").eq("id", id).limit(1);
        if self.rest.select(&query).await?.is_empty() {
            return Err(AdminError::MediaNotFound(id.clone()));
        }

        self.rest.delete(&Query::from(tables::MEDIA_ITEMS).eq("id", id)).await?;
        info!(media_id = %id, "Media deleted");
        Ok(())
    }
}
