//! Admin dashboard endpoints. Every handler requires [`AdminUser`].

use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use std::sync::Arc;

use super::auth::AdminUser;
use super::{
    AdminOverviewDto, ApiError, ApiResponse, AppState, MediaSavedDto, MessageResponse,
    SetAdminRequest,
};
use crate::api::validation::{validate_media_id, validate_user_id};
use crate::models::ProfileRow;
use crate::services::{MediaFiles, MediaFormValues, UploadedFile};

const PAYLOAD_FIELD: &str = "payload";
const ACTOR_PHOTO_PREFIX: &str = "actor_photo_";
const DIRECTOR_PHOTO_PREFIX: &str = "director_photo_";

pub async fn overview(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<ApiResponse<AdminOverviewDto>>, ApiError> {
    let overview = state.shared.admin.overview().await?;
    Ok(Json(ApiResponse::success(overview)))
}

pub async fn set_admin(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(request): Json<SetAdminRequest>,
) -> Result<Json<ApiResponse<ProfileRow>>, ApiError> {
    let id = validate_user_id(&id)?;
    if id == admin.id && !request.is_admin {
        return Err(ApiError::validation("You cannot revoke your own admin rights"));
    }

    let profile = state.shared.admin.set_admin(&id, request.is_admin).await?;
    Ok(Json(ApiResponse::success(profile)))
}

pub async fn create_media(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    multipart: Multipart,
) -> Result<Json<ApiResponse<MediaSavedDto>>, ApiError> {
    let (values, files) = read_media_form(multipart).await?;
    tracing::info!(admin_id = %admin.id, title = %values.title, "Creating media");

    let saved = state.shared.authoring.create_media(values, files).await?;
    Ok(Json(ApiResponse::success(saved)))
}

pub async fn update_media(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<MediaSavedDto>>, ApiError> {
    let id = validate_media_id(&id)?;
    let (values, files) = read_media_form(multipart).await?;
    tracing::info!(admin_id = %admin.id, media_id = %id, "Updating media");

    let saved = state.shared.authoring.update_media(&id, values, files).await?;
    Ok(Json(ApiResponse::success(saved)))
}

pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_media_id(&id)?;
    state.shared.admin.delete_media(&id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Media {id} deleted"
    )))))
}

/// Where a multipart part goes in the form.
#[derive(Debug, PartialEq, Eq)]
enum FormPart {
    Payload,
    Poster,
    Video,
    ActorPhoto(usize),
    DirectorPhoto(usize),
    Unknown,
}

fn classify_part(name: &str) -> FormPart {
    let indexed = |prefix: &str| {
        name.strip_prefix(prefix)
            .and_then(|i| i.parse::<usize>().ok())
    };

    match name {
        PAYLOAD_FIELD => FormPart::Payload,
        "poster" => FormPart::Poster,
        "video" => FormPart::Video,
        _ => {
            if let Some(i) = indexed(ACTOR_PHOTO_PREFIX) {
                FormPart::ActorPhoto(i)
            } else if let Some(i) = indexed(DIRECTOR_PHOTO_PREFIX) {
                FormPart::DirectorPhoto(i)
            } else {
                FormPart::Unknown
            }
        }
    }
}

async fn read_media_form(
    mut multipart: Multipart,
) -> Result<(MediaFormValues, MediaFiles), ApiError> {
    let mut values = None;
    let mut files = MediaFiles::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let part = classify_part(&name);

        if part == FormPart::Payload {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::validation(format!("Failed to read payload: {e}")))?;
            values = Some(
                serde_json::from_str::<MediaFormValues>(&text)
                    .map_err(|e| ApiError::validation(format!("Invalid payload: {e}")))?,
            );
            continue;
        }

        if part == FormPart::Unknown {
            tracing::debug!(field = %name, "Ignoring unknown form field");
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Failed to read {name}: {e}")))?;
        let file = UploadedFile {
            file_name,
            content_type,
            bytes,
        };

        match part {
            FormPart::Poster => files.poster = Some(file),
            FormPart::Video => files.video = Some(file),
            FormPart::ActorPhoto(i) => {
                files.actor_photos.insert(i, file);
            }
            FormPart::DirectorPhoto(i) => {
                files.director_photos.insert(i, file);
            }
            FormPart::Payload | FormPart::Unknown => {}
        }
    }

    let values = values.ok_or_else(|| ApiError::validation("Missing payload part"))?;
    Ok((values, files))
}
