//! PostgREST implementation of the [`CatalogService`] trait.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::api::types::{CommentDto, DiscoverItemDto, GenreOptionDto, MediaDetailDto};
use crate::clients::postgrest::{Query, RestClient, fetch, fetch_optional};
use crate::constants::tables;
use crate::domain::{DiscoverFilters, Locale, MediaId, UserId};
use crate::models::{CommentRow, GenreRow, MediaRow, ProfileRow};
use crate::services::catalog_service::{
    CatalogError, CatalogService, DETAIL_SELECT, aggregate_item, attach_profiles,
    build_discover_query, comment_author_ids, detail_from_row, filter_and_sort, genre_options,
    player_url,
};

pub struct SupabaseCatalogService {
    rest: Arc<dyn RestClient>,
    embed_base: String,
    library_id: String,
}

impl SupabaseCatalogService {
    /// `library_id` is empty when videos are served straight from storage.
    #[must_use]
    pub fn new(rest: Arc<dyn RestClient>, embed_base: &str, library_id: &str) -> Self {
        Self {
            rest,
            embed_base: embed_base.to_string(),
            library_id: library_id.to_string(),
        }
    }

    async fn profiles_for(&self, ids: &[UserId]) -> Result<Vec<ProfileRow>, CatalogError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = Query::from(tables::PROFILES)
            .select("id, username, avatar_url")
            .in_list("id", ids);
        Ok(fetch(self.rest.as_ref(), &query).await?)
    }
}

#[async_trait::async_trait]
impl CatalogService for SupabaseCatalogService {
    async fn list_genres(&self, locale: Locale) -> Result<Vec<GenreOptionDto>, CatalogError> {
        let query = Query::from(tables::GENRES)
            .select("id, name, name_ru")
            .order("name", true);
        let rows: Vec<GenreRow> = fetch(self.rest.as_ref(), &query).await?;
        Ok(genre_options(rows, locale))
    }

    #[instrument(skip(self), fields(search = %filters.search, sort = %filters.sort))]
    async fn discover(&self, filters: &DiscoverFilters) -> Result<Vec<DiscoverItemDto>, CatalogError> {
        if let Some(reason) = filters.invalid_reason() {
            return Err(CatalogError::Validation(reason));
        }

        let query = build_discover_query(filters);
        let rows: Vec<MediaRow> = fetch(self.rest.as_ref(), &query).await?;
        let fetched = rows.len();

        let items = rows
            .into_iter()
            .map(|row| aggregate_item(row, filters.locale))
            .collect();
        let items = filter_and_sort(items, filters.min_rating, filters.sort);

        debug!(fetched, returned = items.len(), "Discover query complete");
        Ok(items)
    }

    async fn media_detail(&self, id: &MediaId, locale: Locale) -> Result<MediaDetailDto, CatalogError> {
        let query = Query::from(tables::MEDIA_ITEMS)
            .select(DETAIL_SELECT)
            .eq("id", id)
            .limit(1);

        let row: MediaRow = fetch_optional(self.rest.as_ref(), &query)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;

        let profiles = self.profiles_for(&comment_author_ids(&row.comments)).await?;
        let embed_url = player_url(
            row.item.video_url.as_deref(),
            &self.embed_base,
            &self.library_id,
        );

        Ok(detail_from_row(row, &profiles, locale, embed_url))
    }

    async fn list_comments(&self, id: &MediaId) -> Result<Vec<CommentDto>, CatalogError> {
        let query = Query::from(tables::COMMENTS)
            .select("id, content, created_at, user_id")
            .eq("media_id", id)
            .order("created_at", false);
        let comments: Vec<CommentRow> = fetch(self.rest.as_ref(), &query).await?;

        let profiles = self.profiles_for(&comment_author_ids(&comments)).await?;
        Ok(attach_profiles(comments, &profiles))
    }
}
