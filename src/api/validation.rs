use super::ApiError;
use crate::domain::{GenreId, Locale, MediaId, UserId};

const MAX_ID_LENGTH: usize = 64;

fn validate_identifier<'a>(kind: &str, id: &'a str) -> Result<&'a str, ApiError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::validation(format!("{kind} ID cannot be empty")));
    }

    if id.len() > MAX_ID_LENGTH
        || !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::validation(format!("Invalid {kind} ID: {id}")));
    }

    Ok(id)
}

pub fn validate_media_id(id: &str) -> Result<MediaId, ApiError> {
    validate_identifier("media", id).map(MediaId::from)
}

pub fn validate_user_id(id: &str) -> Result<UserId, ApiError> {
    validate_identifier("user", id).map(UserId::from)
}

/// Comma separated genre ids, e.g. `3,8`. Blank entries are ignored.
pub fn parse_genre_list(raw: Option<&str>) -> Result<Vec<GenreId>, ApiError> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| validate_identifier("genre", s).map(GenreId::from))
        .collect()
}

pub fn parse_locale(raw: Option<&str>) -> Result<Locale, ApiError> {
    raw.unwrap_or_default()
        .parse()
        .map_err(|e: crate::domain::ParseEnumError| ApiError::validation(e.to_string()))
}

pub fn validate_limit(limit: usize) -> Result<usize, ApiError> {
    const MAX_LIMIT: usize = 100;
    const MIN_LIMIT: usize = 1;

    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {limit}. Limit must be between {MIN_LIMIT} and {MAX_LIMIT}"
        )));
    }
    Ok(limit)
}
