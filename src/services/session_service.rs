//! Resolves access tokens issued by the auth backend into users.

use serde::Serialize;
use thiserror::Error;

use crate::clients::auth::AuthError;
use crate::clients::postgrest::PostgrestError;
use crate::domain::UserId;
use crate::models::ProfileRow;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not authenticated")]
    Unauthorized,

    #[error("Auth service error: {0}")]
    Auth(AuthError),

    #[error("Backend error: {0}")]
    Backend(#[from] PostgrestError),
}

impl From<AuthError> for SessionError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken => Self::Unauthorized,
            other => Self::Auth(other),
        }
    }
}

/// The user behind a request, with their profile when one exists.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Option<String>,
    pub profile: Option<ProfileRow>,
}

impl CurrentUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.is_admin)
    }
}

#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SessionError::Unauthorized`] for a blank, expired or unknown token.
    async fn resolve_user(&self, access_token: &str) -> Result<CurrentUser, SessionError>;
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer   xyz "), Some("xyz"));
        assert_eq!(bearer_token("Basic dXNlcg=="), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("token"), None);
    }

    #[test]
    fn admin_flag_comes_from_profile() {
        let mut user = CurrentUser {
            id: UserId::new("u1"),
            email: None,
            profile: None,
        };
        assert!(!user.is_admin());

        user.profile = Some(ProfileRow {
            id: UserId::new("u1"),
            username: None,
            avatar_url: None,
            is_admin: true,
        });
        assert!(user.is_admin());
    }

    #[test]
    fn invalid_token_maps_to_unauthorized() {
        assert!(matches!(
            SessionError::from(AuthError::InvalidToken),
            SessionError::Unauthorized
        ));
    }
}
