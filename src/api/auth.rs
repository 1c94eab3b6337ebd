//! Request authentication.
//!
//! Callers present the access token issued by the auth backend as
//! `Authorization: Bearer <token>`. [`AuthUser`] resolves it for any signed-in
//! user, [`AdminUser`] additionally requires the profile's admin flag.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::services::CurrentUser;
use crate::services::session_service::bearer_token;

pub struct AuthUser(pub CurrentUser);

pub struct AdminUser(pub CurrentUser);

async fn resolve(parts: &Parts, state: &AppState) -> Result<CurrentUser, ApiError> {
    let token = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(ApiError::unauthorized)?;

    let user = state.shared.session.resolve_user(token).await?;
    tracing::Span::current().record("user_id", user.id.as_str());
    Ok(user)
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state).await.map(Self)
    }
}

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, "Admin route refused");
            return Err(ApiError::forbidden());
        }
        Ok(Self(user))
    }
}
