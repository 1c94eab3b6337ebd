//! Domain service behind the admin dashboard.

use thiserror::Error;

use crate::api::types::{AdminOverviewDto, AdminStatsDto};
use crate::clients::postgrest::PostgrestError;
use crate::domain::{MediaId, UserId};
use crate::models::ProfileRow;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Media not found: {0}")]
    MediaNotFound(MediaId),

    #[error("Backend error: {0}")]
    Backend(#[from] PostgrestError),
}

#[async_trait::async_trait]
pub trait AdminService: Send + Sync {
    /// All profiles and media items with summary counts.
    async fn overview(&self) -> Result<AdminOverviewDto, AdminError>;

    /// Grants or revokes admin rights and returns the updated profile.
    async fn set_admin(&self, user: &UserId, is_admin: bool) -> Result<ProfileRow, AdminError>;

    /// Deletes a media item; its relations are removed by the backend.
    async fn delete_media(&self, id: &MediaId) -> Result<(), AdminError>;
}

#[must_use]
pub fn compute_stats(users: &[ProfileRow], total_media: usize) -> AdminStatsDto {
    AdminStatsDto {
        total_users: users.len(),
        total_media,
        admin_users: users.iter().filter(|u| u.is_admin).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str, is_admin: bool) -> ProfileRow {
        ProfileRow {
            id: UserId::new(id),
            username: Some(id.to_string()),
            avatar_url: None,
            is_admin,
        }
    }

    #[test]
    fn stats_count_admins() {
        let users = vec![profile("a", true), profile("b", false), profile("c", true)];
        assert_eq!(
            compute_stats(&users, 7),
            AdminStatsDto {
                total_users: 3,
                total_media: 7,
                admin_users: 2,
            }
        );
    }

    #[test]
    fn stats_of_empty_site() {
        assert_eq!(compute_stats(&[], 0).admin_users, 0);
    }
}
