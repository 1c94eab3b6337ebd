//! Domain service for browsing the catalog: the discover page, genre options
//! and the watch page.
//!
//! The backend returns media rows with their relations embedded; everything
//! derived from those relations (average rating, view count, cast split,
//! localized genre names) is computed here by pure functions so it can be
//! tested without a backend.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::api::types::{
    CommentAuthorDto, CommentDto, DiscoverItemDto, GenreDto, GenreOptionDto, MediaDetailDto,
    PersonDto,
};
use crate::clients::bunny::embed_url_from_stored;
use crate::clients::postgrest::{PostgrestError, Query, ilike_condition};
use crate::constants::tables;
use crate::domain::{DiscoverFilters, Locale, MediaId, PersonRole, SortOption, UserId};
use crate::models::{CommentRow, GenreRow, MediaGenreRow, MediaPersonRow, MediaRow, ProfileRow, RatingRow};

/// Relations embedded in every discover row.
pub const DISCOVER_SELECT: &str = "
    *,
    media_genres!left(genres(id, name, name_ru)),
    ratings!left(rating, user_id),
    media_persons!left(role, character_name, persons(id, name, photo_url)),
    media_views!left(count)
";

/// Inner-joined alias used only for filtering by genre, so the displayed
/// `media_genres` list stays complete.
pub const GENRE_FILTER_EMBED: &str = ", genre_filter:media_genres!inner(genre_id)";

pub const DETAIL_SELECT: &str = "
    *,
    media_genres!left(genres(id, name, name_ru)),
    media_persons!left(role, character_name, persons(id, name, photo_url)),
    ratings!left(rating, user_id),
    comments!left(id, content, created_at, user_id)
";

const SEARCH_COLUMNS: [&str; 3] = ["title", "original_title", "description"];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Media not found: {0}")]
    NotFound(MediaId),

    #[error("Invalid filters: {0}")]
    Validation(String),

    #[error("Backend error: {0}")]
    Backend(#[from] PostgrestError),
}

#[async_trait::async_trait]
pub trait CatalogService: Send + Sync {
    /// Lists every genre with a label for `locale`.
    async fn list_genres(&self, locale: Locale) -> Result<Vec<GenreOptionDto>, CatalogError>;

    /// Runs the discover query and returns filtered, sorted cards.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for an inverted year range or an
    /// out-of-range minimum rating.
    async fn discover(&self, filters: &DiscoverFilters) -> Result<Vec<DiscoverItemDto>, CatalogError>;

    /// Loads the watch page for one media item.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when no row matches `id`.
    async fn media_detail(&self, id: &MediaId, locale: Locale) -> Result<MediaDetailDto, CatalogError>;

    /// Comments of a media item with their authors, newest first.
    async fn list_comments(&self, id: &MediaId) -> Result<Vec<CommentDto>, CatalogError>;
}

/// Builds the `media_items` query for the discover page.
///
/// Each search term matches title, original title or description
/// case-insensitively and an item matches when any term does.
#[must_use]
pub fn build_discover_query(filters: &DiscoverFilters) -> Query {
    let mut select = DISCOVER_SELECT.to_string();
    if !filters.genres.is_empty() {
        select.push_str(GENRE_FILTER_EMBED);
    }

    let mut query = Query::from(tables::MEDIA_ITEMS).select(&select);

    let terms = filters.search_terms();
    if !terms.is_empty() {
        let groups = terms
            .iter()
            .map(|term| search_group(term))
            .collect::<Vec<_>>()
            .join(",");
        query = query.or(&groups);
    }

    if let Some(media_type) = filters.media_type.media_type() {
        query = query.eq("type", media_type);
    }

    if !filters.genres.is_empty() {
        query = query.in_list("genre_filter.genre_id", &filters.genres);
    }

    query
        .gte("year", filters.year_from)
        .lte("year", filters.year_to)
}

fn search_group(term: &str) -> String {
    let pattern = format!("*{term}*");
    let conditions = SEARCH_COLUMNS
        .iter()
        .map(|column| ilike_condition(column, &pattern))
        .collect::<Vec<_>>()
        .join(",");
    format!("or({conditions})")
}

/// Arithmetic mean of the rating rows; a row without a value counts as 0 and
/// an empty list averages to 0.
#[must_use]
pub fn average_rating(ratings: &[RatingRow]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }

    let sum: f64 = ratings.iter().map(|r| r.rating.unwrap_or(0.0)).sum();
    #[allow(clippy::cast_precision_loss)]
    let count = ratings.len() as f64;
    sum / count
}

#[must_use]
pub fn localized_genres(rows: &[MediaGenreRow], locale: Locale) -> Vec<GenreDto> {
    rows.iter()
        .filter_map(|mg| mg.genres.as_ref())
        .map(|g| GenreDto {
            id: g.id.clone(),
            name: locale.pick(&g.name, g.name_ru.as_deref()).to_string(),
        })
        .collect()
}

#[must_use]
pub fn genre_options(rows: Vec<GenreRow>, locale: Locale) -> Vec<GenreOptionDto> {
    rows.into_iter()
        .map(|g| GenreOptionDto {
            display_name: locale.pick(&g.name, g.name_ru.as_deref()).to_string(),
            id: g.id,
            name: g.name,
            name_ru: g.name_ru,
        })
        .collect()
}

/// People credited with `role`. Only actors carry a character name.
#[must_use]
pub fn people_with_role(rows: &[MediaPersonRow], role: PersonRole) -> Vec<PersonDto> {
    rows.iter()
        .filter(|mp| mp.has_role(role))
        .filter_map(|mp| {
            let person = mp.persons.as_ref()?;
            Some(PersonDto {
                id: Some(person.id.clone()),
                name: person.name.clone(),
                photo: person.photo_url.clone(),
                character: match role {
                    PersonRole::Actor => mp.character_name.clone(),
                    PersonRole::Director => None,
                },
            })
        })
        .collect()
}

#[must_use]
pub fn aggregate_item(row: MediaRow, locale: Locale) -> DiscoverItemDto {
    let view_count = row.media_views.first().map_or(0, |v| v.count);

    DiscoverItemDto {
        genres: localized_genres(&row.media_genres, locale),
        average_rating: average_rating(&row.ratings),
        rating_count: row.ratings.len(),
        view_count,
        actors: people_with_role(&row.media_persons, PersonRole::Actor),
        directors: people_with_role(&row.media_persons, PersonRole::Director),
        id: row.item.id,
        title: row.item.title,
        original_title: row.item.original_title,
        media_type: row.item.media_type,
        description: row.item.description,
        year: row.item.year,
        duration: row.item.duration,
        poster_url: row.item.poster_url,
    }
}

/// Drops items rated below `min_rating` and orders the rest. The sort is
/// stable, so ties keep the backend order. Items without a year go last.
#[must_use]
pub fn filter_and_sort(
    items: Vec<DiscoverItemDto>,
    min_rating: f64,
    sort: SortOption,
) -> Vec<DiscoverItemDto> {
    let mut items: Vec<_> = items
        .into_iter()
        .filter(|item| item.average_rating >= min_rating)
        .collect();

    match sort {
        SortOption::Rating => {
            items.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
        }
        SortOption::Views => items.sort_by(|a, b| b.view_count.cmp(&a.view_count)),
        SortOption::Newest => {
            items.sort_by_key(|item| std::cmp::Reverse(item.year.unwrap_or(i32::MIN)));
        }
        SortOption::Oldest => items.sort_by_key(|item| item.year.unwrap_or(i32::MAX)),
    }

    items
}

/// Distinct authors of `comments`, in a stable order.
#[must_use]
pub fn comment_author_ids(comments: &[CommentRow]) -> Vec<UserId> {
    comments
        .iter()
        .map(|c| c.user_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Joins comments with the separately fetched profiles, newest first.
#[must_use]
pub fn attach_profiles(mut comments: Vec<CommentRow>, profiles: &[ProfileRow]) -> Vec<CommentDto> {
    comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    comments
        .into_iter()
        .map(|c| {
            let author = profiles
                .iter()
                .find(|p| p.id == c.user_id)
                .map(|p| CommentAuthorDto {
                    username: p.username.clone(),
                    avatar_url: p.avatar_url.clone(),
                });
            CommentDto {
                id: c.id,
                content: c.content,
                created_at: c.created_at,
                user_id: c.user_id,
                author,
            }
        })
        .collect()
}

/// Where the player should point. With a configured video library the stored
/// URL is turned into a CDN embed, otherwise it is served as stored.
#[must_use]
pub fn player_url(video_url: Option<&str>, embed_base: &str, library_id: &str) -> String {
    let stored = video_url.unwrap_or_default();
    if library_id.is_empty() {
        stored.to_string()
    } else {
        embed_url_from_stored(stored, embed_base, library_id)
    }
}

#[must_use]
pub fn detail_from_row(
    row: MediaRow,
    profiles: &[ProfileRow],
    locale: Locale,
    embed_url: String,
) -> MediaDetailDto {
    MediaDetailDto {
        genres: localized_genres(&row.media_genres, locale),
        average_rating: average_rating(&row.ratings),
        rating_count: row.ratings.len(),
        actors: people_with_role(&row.media_persons, PersonRole::Actor),
        directors: people_with_role(&row.media_persons, PersonRole::Director),
        comments: attach_profiles(row.comments, profiles),
        embed_url,
        id: row.item.id,
        title: row.item.title,
        original_title: row.item.original_title,
        media_type: row.item.media_type,
        description: row.item.description,
        year: row.item.year,
        duration: row.item.duration,
        poster_url: row.item.poster_url,
    }
}
