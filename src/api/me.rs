use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AuthUser;
use super::{ApiError, ApiResponse, AppState, CurrentUserDto, WatchlistDto};
use crate::api::validation::{validate_limit, validate_user_id};
use crate::constants::limits::DEFAULT_ACTIVITY_LIMIT;
use crate::models::ActivityRow;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
}

pub async fn get_me(AuthUser(user): AuthUser) -> Json<ApiResponse<CurrentUserDto>> {
    Json(ApiResponse::success(CurrentUserDto {
        id: user.id,
        email: user.email,
        profile: user.profile,
    }))
}

pub async fn my_watchlist(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<WatchlistDto>>, ApiError> {
    let watchlist = state.shared.engagement.watchlist(&user.id).await?;
    Ok(Json(ApiResponse::success(watchlist)))
}

/// Watchlist of another user, as shown on their profile page.
pub async fn user_watchlist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<WatchlistDto>>, ApiError> {
    let id = validate_user_id(&id)?;
    let watchlist = state.shared.engagement.watchlist(&id).await?;
    Ok(Json(ApiResponse::success(watchlist)))
}

pub async fn my_activity(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ApiResponse<Vec<ActivityRow>>>, ApiError> {
    let limit = validate_limit(query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT))?;
    let activity = state
        .shared
        .engagement
        .recent_activity(&user.id, limit)
        .await?;
    Ok(Json(ApiResponse::success(activity)))
}
