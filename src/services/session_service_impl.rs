use std::sync::Arc;

use tracing::debug;

use crate::clients::auth::AuthProvider;
use crate::clients::postgrest::{Query, RestClient, fetch_optional};
use crate::constants::tables;
use crate::models::ProfileRow;
use crate::services::session_service::{CurrentUser, SessionError, SessionService};

pub struct SupabaseSessionService {
    auth: Arc<dyn AuthProvider>,
    rest: Arc<dyn RestClient>,
}

impl SupabaseSessionService {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthProvider>, rest: Arc<dyn RestClient>) -> Self {
        Self { auth, rest }
    }
}

#[async_trait::async_trait]
impl SessionService for SupabaseSessionService {
    async fn resolve_user(&self, access_token: &str) -> Result<CurrentUser, SessionError> {
        if access_token.trim().is_empty() {
            return Err(SessionError::Unauthorized);
        }

        let user = self.auth.get_user(access_token).await?;

        let query = Query::from(tables::PROFILES)
            .select("id, username, avatar_url, is_admin")
            .eq("id", &user.id)
            .limit(1);
        let profile: Option<ProfileRow> = fetch_optional(self.rest.as_ref(), &query).await?;
        if profile.is_none() {
            debug!(user_id = %user.id, "User has no profile row");
        }

        Ok(CurrentUser {
            id: user.id,
            email: user.email,
            profile,
        })
    }
}
