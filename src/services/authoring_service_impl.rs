//! Backend implementation of the [`AuthoringService`] trait.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::api::types::MediaSavedDto;
use crate::clients::bunny::VideoHost;
use crate::clients::postgrest::{Query, RestClient, decode_rows, fetch_optional};
use crate::clients::storage::ObjectStorage;
use crate::constants::{storage, tables};
use crate::domain::{MediaId, PersonRole};
use crate::models::{MediaItem, PersonRow};
use crate::services::authoring_service::{
    AuthoringError, AuthoringService, AuthoringStage, StageError, genre_link_payload,
    media_payload, person_link_payload, person_payload,
};
use crate::services::media_form::{
    CastMember, FormMode, MediaDraft, MediaFiles, MediaFormValues, UploadedFile, object_path,
    validate,
};

pub struct SupabaseAuthoringService {
    rest: Arc<dyn RestClient>,
    storage: Arc<dyn ObjectStorage>,
    video_host: Option<Arc<dyn VideoHost>>,
}

impl SupabaseAuthoringService {
    /// Videos go to `video_host` when one is given, otherwise to `storage`.
    #[must_use]
    pub fn new(
        rest: Arc<dyn RestClient>,
        storage: Arc<dyn ObjectStorage>,
        video_host: Option<Arc<dyn VideoHost>>,
    ) -> Self {
        Self {
            rest,
            storage,
            video_host,
        }
    }

    async fn upload_file(&self, prefix: &str, file: UploadedFile) -> Result<String, StageError> {
        let millis = chrono::Utc::now().timestamp_millis();
        let path = object_path(prefix, millis, &file.file_name);
        let content_type = file.mime_type();

        self.storage.upload(&path, file.bytes, &content_type).await?;
        debug!(%path, "File stored");
        Ok(self.storage.public_url(&path))
    }

    async fn upload_video(&self, title: &str, file: UploadedFile) -> Result<String, StageError> {
        match &self.video_host {
            Some(host) => Ok(host.upload_video(title, file.bytes).await?),
            None => self.upload_file(storage::VIDEOS_PREFIX, file).await,
        }
    }

    /// Uploads poster and video when present, in that order.
    async fn upload_media_files(
        &self,
        draft: &mut MediaDraft,
    ) -> Result<(Option<String>, Option<String>), AuthoringError> {
        let poster_url = match draft.poster.take() {
            Some(file) => Some(
                self.upload_file(storage::POSTERS_PREFIX, file)
                    .await
                    .map_err(|e| AuthoringError::failed(AuthoringStage::PosterUpload, e))?,
            ),
            None => None,
        };

        let video_url = match draft.video.take() {
            Some(file) => Some(
                self.upload_video(&draft.title, file)
                    .await
                    .map_err(|e| AuthoringError::failed(AuthoringStage::VideoUpload, e))?,
            ),
            None => None,
        };

        Ok((poster_url, video_url))
    }

    /// Links every genre concurrently; the first failure is reported once
    /// all inserts have settled.
    async fn link_genres(&self, media_id: &MediaId, draft: &MediaDraft) -> Result<(), AuthoringError> {
        let inserts = draft.genres.iter().map(|genre_id| {
            self.rest
                .insert(tables::MEDIA_GENRES, genre_link_payload(media_id, genre_id))
        });

        for result in join_all(inserts).await {
            result.map_err(|e| AuthoringError::partial(media_id, AuthoringStage::Genres, e))?;
        }
        Ok(())
    }

    async fn add_people(
        &self,
        media_id: &MediaId,
        members: Vec<CastMember>,
        role: PersonRole,
    ) -> Result<usize, AuthoringError> {
        let mut added = 0;

        for mut member in members {
            let photo_url = match member.photo.take() {
                Some(photo) => Some(
                    self.upload_file(storage::PERSONS_PREFIX, photo)
                        .await
                        .map_err(|e| AuthoringError::partial(media_id, AuthoringStage::PhotoUpload, e))?,
                ),
                None => None,
            };

            let person = self
                .insert_person(&member, photo_url.as_deref())
                .await
                .map_err(|e| AuthoringError::partial(media_id, AuthoringStage::Persons, e))?;

            self.rest
                .insert(
                    tables::MEDIA_PERSONS,
                    person_link_payload(media_id, &person.id, role, member.character.as_deref()),
                )
                .await
                .map_err(|e| AuthoringError::partial(media_id, AuthoringStage::Persons, e))?;

            added += 1;
        }

        Ok(added)
    }

    async fn insert_person(
        &self,
        member: &CastMember,
        photo_url: Option<&str>,
    ) -> Result<PersonRow, StageError> {
        let rows = self
            .rest
            .insert(tables::PERSONS, person_payload(member, photo_url))
            .await?;
        decode_rows::<PersonRow>(tables::PERSONS, rows)?
            .into_iter()
            .next()
            .ok_or(StageError::MissingRow(tables::PERSONS))
    }

    async fn write_relations(
        &self,
        media_id: &MediaId,
        draft: &mut MediaDraft,
    ) -> Result<(usize, usize), AuthoringError> {
        self.link_genres(media_id, draft).await?;

        let actors = self
            .add_people(media_id, std::mem::take(&mut draft.actors), PersonRole::Actor)
            .await?;
        let directors = self
            .add_people(media_id, std::mem::take(&mut draft.directors), PersonRole::Director)
            .await?;

        Ok((actors, directors))
    }
}

#[async_trait::async_trait]
impl AuthoringService for SupabaseAuthoringService {
    async fn create_media(
        &self,
        values: MediaFormValues,
        files: MediaFiles,
    ) -> Result<MediaSavedDto, AuthoringError> {
        let mut draft = validate(values, files, FormMode::Create)?;
        let (poster_url, video_url) = self.upload_media_files(&mut draft).await?;

        let rows = self
            .rest
            .insert(
                tables::MEDIA_ITEMS,
                media_payload(&draft, poster_url.as_deref(), video_url.as_deref()),
            )
            .await
            .map_err(|e| AuthoringError::failed(AuthoringStage::MediaInsert, e))?;
        let item = decode_rows::<MediaItem>(tables::MEDIA_ITEMS, rows)
            .map_err(|e| AuthoringError::failed(AuthoringStage::MediaInsert, e))?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AuthoringError::failed(
                    AuthoringStage::MediaInsert,
                    StageError::MissingRow(tables::MEDIA_ITEMS),
                )
            })?;
        info!(media_id = %item.id, title = %item.title, "Media item created");

        let (actors, directors) = self
            .write_relations(&item.id, &mut draft)
            .await
            .inspect_err(|e| warn!(media_id = %item.id, error = %e, "Media saved incompletely"))?;

        Ok(MediaSavedDto {
            genres: draft.genres.len(),
            actors,
            directors,
            id: item.id,
            title: item.title,
            poster_url: item.poster_url,
            video_url: item.video_url,
        })
    }

    async fn update_media(
        &self,
        id: &MediaId,
        values: MediaFormValues,
        files: MediaFiles,
    ) -> Result<MediaSavedDto, AuthoringError> {
        let mut draft = validate(values, files, FormMode::Edit)?;

        let existing_query = Query::from(tables::MEDIA_ITEMS).eq("id", id).limit(1);
        let existing: Option<MediaItem> = fetch_optional(self.rest.as_ref(), &existing_query)
            .await
            .map_err(|e| AuthoringError::failed(AuthoringStage::MediaUpdate, e))?;
        if existing.is_none() {
            return Err(AuthoringError::NotFound(id.clone()));
        }

        let (poster_url, video_url) = self.upload_media_files(&mut draft).await?;

        let rows = self
            .rest
            .update(
                &Query::from(tables::MEDIA_ITEMS).eq("id", id),
                media_payload(&draft, poster_url.as_deref(), video_url.as_deref()),
            )
            .await
            .map_err(|e| AuthoringError::failed(AuthoringStage::MediaUpdate, e))?;
        let item = decode_rows::<MediaItem>(tables::MEDIA_ITEMS, rows)
            .map_err(|e| AuthoringError::failed(AuthoringStage::MediaUpdate, e))?
            .into_iter()
            .next()
            .ok_or_else(|| AuthoringError::NotFound(id.clone()))?;

        self.rest
            .delete(&Query::from(tables::MEDIA_GENRES).eq("media_id", id))
            .await
            .map_err(|e| AuthoringError::partial(id, AuthoringStage::Genres, e))?;
        self.rest
            .delete(&Query::from(tables::MEDIA_PERSONS).eq("media_id", id))
            .await
            .map_err(|e| AuthoringError::partial(id, AuthoringStage::Persons, e))?;

        let (actors, directors) = self
            .write_relations(id, &mut draft)
            .await
            .inspect_err(|e| warn!(media_id = %id, error = %e, "Media updated incompletely"))?;
        info!(media_id = %id, "Media item updated");

        Ok(MediaSavedDto {
            genres: draft.genres.len(),
            actors,
            directors,
            id: item.id,
            title: item.title,
            poster_url: item.poster_url,
            video_url: item.video_url,
        })
    }
}
