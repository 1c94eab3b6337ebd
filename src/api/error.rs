use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::clients::postgrest::PostgrestError;
use crate::services::media_form::FieldError;
use crate::services::{
    AdminError, AuthoringError, AuthoringStage, CatalogError, EngagementError, SessionError,
};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError(String),

    FormErrors(Vec<FieldError>),

    Unauthorized(String),

    Forbidden(String),

    Conflict(String),

    BackendError { service: String, message: String },

    PartialSave {
        media_id: String,
        stage: String,
        message: String,
    },

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            ApiError::FormErrors(fields) => write!(f, "Invalid form: {} field(s)", fields.len()),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            ApiError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            ApiError::BackendError { service, message } => {
                write!(f, "{service} error: {message}")
            }
            ApiError::PartialSave {
                media_id,
                stage,
                message,
            } => {
                write!(f, "Media {media_id} saved incompletely at {stage}: {message}")
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Response extension naming the backend service or authoring stage behind a
/// 502, picked up by the request logging middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFailure(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let failed_at = match &self {
            ApiError::BackendError { service, .. } => Some(service.to_ascii_lowercase()),
            ApiError::PartialSave { stage, .. } => Some(stage.clone()),
            _ => None,
        };

        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiResponse::<()>::error(msg)),
            ApiError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, ApiResponse::<()>::error(msg))
            }
            ApiError::FormErrors(fields) => (
                StatusCode::BAD_REQUEST,
                ApiResponse::<()>::field_errors("The media form has invalid fields", fields),
            ),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ApiResponse::<()>::error(msg))
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, ApiResponse::<()>::error(msg)),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, ApiResponse::<()>::error(msg)),
            ApiError::BackendError { service, message } => {
                tracing::warn!("{} error: {}", service, message);
                (
                    StatusCode::BAD_GATEWAY,
                    ApiResponse::<()>::error(format!("{service} service is unavailable")),
                )
            }
            ApiError::PartialSave {
                media_id,
                stage,
                message,
            } => {
                tracing::error!(%media_id, %stage, "Partial media save: {}", message);
                (
                    StatusCode::BAD_GATEWAY,
                    ApiResponse::<()>::error(format!(
                        "Media {media_id} was saved, but the {stage} step failed"
                    )),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::error("An internal error occurred"),
                )
            }
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(failed_at) = failed_at {
            response.extensions_mut().insert(UpstreamFailure(failed_at));
        }
        response
    }
}

impl From<PostgrestError> for ApiError {
    fn from(err: PostgrestError) -> Self {
        match &err {
            e if e.is_conflict() => ApiError::Conflict("The record already exists".to_string()),
            e if e.is_missing_reference() => {
                ApiError::NotFound("The referenced media or user does not exist".to_string())
            }
            // Malformed identifier in a filter.
            PostgrestError::Status { code: Some(code), .. } if code == "22P02" => {
                ApiError::ValidationError("Invalid identifier".to_string())
            }
            PostgrestError::Decode { .. } => ApiError::InternalError(err.to_string()),
            _ => ApiError::database(err.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => ApiError::not_found("Media", id),
            CatalogError::Validation(msg) => ApiError::validation(msg),
            CatalogError::Backend(e) => e.into(),
        }
    }
}

impl From<EngagementError> for ApiError {
    fn from(err: EngagementError) -> Self {
        match err {
            EngagementError::Validation(msg) => ApiError::validation(msg),
            EngagementError::Backend(e) => e.into(),
            EngagementError::MissingRow(table) => {
                ApiError::database(format!("{table} insert returned no row"))
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Unauthorized => ApiError::unauthorized(),
            SessionError::Auth(e) => ApiError::BackendError {
                service: "Auth".to_string(),
                message: e.to_string(),
            },
            SessionError::Backend(e) => e.into(),
        }
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::UserNotFound(id) => ApiError::not_found("User", id),
            AdminError::MediaNotFound(id) => ApiError::not_found("Media", id),
            AdminError::Backend(e) => e.into(),
        }
    }
}

impl From<AuthoringError> for ApiError {
    fn from(err: AuthoringError) -> Self {
        match err {
            AuthoringError::Validation(errors) => ApiError::FormErrors(errors.0),
            AuthoringError::NotFound(id) => ApiError::not_found("Media", id),
            AuthoringError::Failed { stage, source } => {
                let service = match stage {
                    AuthoringStage::PosterUpload | AuthoringStage::PhotoUpload => "Storage",
                    AuthoringStage::VideoUpload => "Video",
                    _ => "Database",
                };
                ApiError::BackendError {
                    service: service.to_string(),
                    message: format!("{stage}: {source}"),
                }
            }
            AuthoringError::Partial {
                media_id,
                stage,
                source,
            } => ApiError::PartialSave {
                media_id: media_id.to_string(),
                stage: stage.to_string(),
                message: source.to_string(),
            },
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{resource} {id} not found"))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Sign in to continue".to_string())
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden("Admin access required".to_string())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        ApiError::BackendError {
            service: "Database".to_string(),
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MediaId;
    use crate::services::authoring_service::StageError;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn domain_errors_map_to_status_codes() {
        assert_eq!(
            status_of(CatalogError::NotFound(MediaId::new("x")).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(SessionError::Unauthorized.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(ApiError::forbidden()), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(EngagementError::Validation("bad".into()).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn backend_conflict_is_409() {
        let err = PostgrestError::Status {
            table: "ratings".to_string(),
            status: 409,
            code: Some("23505".to_string()),
            message: "duplicate".to_string(),
        };
        assert_eq!(status_of(err.into()), StatusCode::CONFLICT);
    }

    #[test]
    fn missing_reference_is_404_not_conflict() {
        let err = PostgrestError::Status {
            table: "ratings".to_string(),
            status: 409,
            code: Some("23503".to_string()),
            message: "violates foreign key constraint".to_string(),
        };
        assert_eq!(status_of(err.into()), StatusCode::NOT_FOUND);

        let err = PostgrestError::Status {
            table: "comments".to_string(),
            status: 409,
            code: Some("23503".to_string()),
            message: "violates foreign key constraint".to_string(),
        };
        assert_eq!(
            status_of(EngagementError::Backend(err).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn comment_insert_without_row_is_bad_gateway() {
        assert_eq!(
            status_of(EngagementError::MissingRow("comments").into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn partial_save_is_bad_gateway() {
        let err = AuthoringError::Partial {
            media_id: MediaId::new("m1"),
            stage: AuthoringStage::Persons,
            source: StageError::MissingRow("persons"),
        };
        assert_eq!(status_of(err.into()), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn bad_gateway_responses_name_what_failed() {
        let partial: ApiError = AuthoringError::Partial {
            media_id: MediaId::new("m1"),
            stage: AuthoringStage::Genres,
            source: StageError::MissingRow("media_genres"),
        }
        .into();
        let response = partial.into_response();
        assert_eq!(
            response.extensions().get::<UpstreamFailure>(),
            Some(&UpstreamFailure("genres".to_string()))
        );

        let response = ApiError::database("down").into_response();
        assert_eq!(
            response.extensions().get::<UpstreamFailure>(),
            Some(&UpstreamFailure("database".to_string()))
        );

        let response = ApiError::forbidden().into_response();
        assert!(response.extensions().get::<UpstreamFailure>().is_none());
    }
}
