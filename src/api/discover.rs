use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, DiscoverItemDto, GenreOptionDto};
use crate::api::validation::{parse_genre_list, parse_locale};
use crate::domain::filters::current_year;
use crate::domain::{DiscoverFilters, MediaTypeFilter, SortOption};
use crate::constants::limits::MIN_YEAR;

#[derive(Debug, Default, Deserialize)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

/// Raw discover query string. Every field is optional and falls back to the
/// default filter state.
#[derive(Debug, Default, Deserialize)]
pub struct DiscoverQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub genres: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub min_rating: Option<f64>,
    pub sort: Option<String>,
    pub locale: Option<String>,
}

impl DiscoverQuery {
    pub fn into_filters(self) -> Result<DiscoverFilters, ApiError> {
        let media_type = self
            .media_type
            .as_deref()
            .unwrap_or_default()
            .parse::<MediaTypeFilter>()
            .map_err(|e| ApiError::validation(e.to_string()))?;
        let sort = self
            .sort
            .as_deref()
            .unwrap_or_default()
            .parse::<SortOption>()
            .map_err(|e| ApiError::validation(e.to_string()))?;

        Ok(DiscoverFilters {
            search: self.search.unwrap_or_default().trim().to_string(),
            media_type,
            genres: parse_genre_list(self.genres.as_deref())?,
            year_from: self.year_from.unwrap_or(MIN_YEAR),
            year_to: self.year_to.unwrap_or_else(current_year),
            min_rating: self.min_rating.unwrap_or(0.0),
            sort,
            locale: parse_locale(self.locale.as_deref())?,
        })
    }
}

pub async fn list_genres(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<ApiResponse<Vec<GenreOptionDto>>>, ApiError> {
    let locale = parse_locale(query.locale.as_deref())?;
    let genres = state.shared.catalog.list_genres(locale).await?;
    Ok(Json(ApiResponse::success(genres)))
}

pub async fn discover(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DiscoverQuery>,
) -> Result<Json<ApiResponse<Vec<DiscoverItemDto>>>, ApiError> {
    let filters = query.into_filters()?;
    let items = state.shared.catalog.discover(&filters).await?;
    Ok(Json(ApiResponse::success(items)))
}
