//! Watch page endpoints: detail, comments, rating, status and view tracking.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::auth::AuthUser;
use super::discover::LocaleQuery;
use super::{
    ApiError, ApiResponse, AppState, CommentAuthorDto, CommentDto, CommentRequest,
    MediaDetailDto, MessageResponse, RateRequest, StatusRequest,
};
use crate::api::validation::{parse_locale, validate_media_id};

pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<ApiResponse<MediaDetailDto>>, ApiError> {
    let id = validate_media_id(&id)?;
    let locale = parse_locale(query.locale.as_deref())?;

    let detail = state.shared.catalog.media_detail(&id, locale).await?;
    Ok(Json(ApiResponse::success(detail)))
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<CommentDto>>>, ApiError> {
    let id = validate_media_id(&id)?;
    let comments = state.shared.catalog.list_comments(&id).await?;
    Ok(Json(ApiResponse::success(comments)))
}

pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<ApiResponse<CommentDto>>, ApiError> {
    let id = validate_media_id(&id)?;

    let mut comment = state
        .shared
        .engagement
        .add_comment(&user.id, &id, &request.content)
        .await?;
    comment.author = user.profile.map(|p| CommentAuthorDto {
        username: p.username,
        avatar_url: p.avatar_url,
    });

    Ok(Json(ApiResponse::success(comment)))
}

pub async fn rate_media(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<RateRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_media_id(&id)?;
    state
        .shared
        .engagement
        .rate(&user.id, &id, request.rating)
        .await?;
    Ok(Json(ApiResponse::success(MessageResponse::new("Rating saved"))))
}

pub async fn record_watch(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_media_id(&id)?;
    state.shared.engagement.record_watch(&user.id, &id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new("View recorded"))))
}

pub async fn set_status(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_media_id(&id)?;
    state
        .shared
        .engagement
        .set_status(&user.id, &id, request.status)
        .await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Status set to {}",
        request.status
    )))))
}

pub async fn clear_status(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_media_id(&id)?;
    state.shared.engagement.clear_status(&user.id, &id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new("Status cleared"))))
}
