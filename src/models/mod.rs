//! Row shapes of the tables consumed from the backend.
//!
//! Embedded relations are optional on every row: PostgREST omits them when
//! they are not selected and may return `null` for empty to-one joins.

pub mod engagement;
pub mod media;
pub mod people;

pub use engagement::{ActivityRow, CommentRow, RatingRow, StatusRow};
pub use media::{GenreRow, MediaGenreRow, MediaItem, MediaPersonRow, MediaRow, MediaSummary};
pub use people::{PersonRow, ProfileRow};

use serde::{Deserialize, Deserializer};

/// Treats an explicit JSON `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
