use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum BunnyError {
    #[error("Bunny request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to initialize video upload ({status}): {message}")]
    CreateFailed { status: u16, message: String },

    #[error("Failed to upload video content ({status}): {message}")]
    UploadFailed { status: u16, message: String },
}

/// Hosts uploaded video files and hands back an embeddable player URL.
#[async_trait]
pub trait VideoHost: Send + Sync {
    async fn upload_video(&self, title: &str, bytes: Bytes) -> Result<String, BunnyError>;
}

#[derive(Serialize)]
struct CreateVideoRequest<'a> {
    title: &'a str,
}

#[derive(Deserialize)]
struct CreateVideoResponse {
    guid: String,
}

#[derive(Debug, Clone)]
pub struct BunnyClient {
    client: Client,
    api_base: String,
    embed_base: String,
    api_key: String,
    library_id: String,
}

impl BunnyClient {
    #[must_use]
    pub fn with_shared_client(client: Client, config: &crate::config::BunnyConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            embed_base: config.embed_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            library_id: config.library_id.clone(),
        }
    }

    fn videos_url(&self) -> String {
        format!("{}/library/{}/videos", self.api_base, self.library_id)
    }

    async fn create_video(&self, title: &str) -> Result<String, BunnyError> {
        let response = self
            .client
            .post(self.videos_url())
            .header("AccessKey", &self.api_key)
            .json(&CreateVideoRequest { title })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BunnyError::CreateFailed {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let created: CreateVideoResponse = response.json().await?;
        Ok(created.guid)
    }
}

#[async_trait]
impl VideoHost for BunnyClient {
    async fn upload_video(&self, title: &str, bytes: Bytes) -> Result<String, BunnyError> {
        let guid = self.create_video(title).await?;
        debug!(%guid, "Video initialized");

        let response = self
            .client
            .put(format!("{}/{}", self.videos_url(), guid))
            .header("AccessKey", &self.api_key)
            .body(bytes)
            .send()
            .await?;

        let outcome = if response.status().is_success() {
            "success"
        } else {
            "error"
        };
        metrics::counter!(
            "backend_requests_total",
            "service" => "bunny",
            "operation" => "upload",
            "outcome" => outcome
        )
        .increment(1);

        if !response.status().is_success() {
            return Err(BunnyError::UploadFailed {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        info!(%guid, title, "Video upload successful");
        Ok(embed_url(&self.embed_base, &self.library_id, &guid))
    }
}

#[must_use]
pub fn embed_url(embed_base: &str, library_id: &str, guid: &str) -> String {
    format!("{}/{library_id}/{guid}", embed_base.trim_end_matches('/'))
}

/// Player URL for a stored `video_url`.
///
/// The stored value may be a full embed URL, a storage URL or a bare GUID;
/// the video id is the last path segment without its extension.
#[must_use]
pub fn embed_url_from_stored(video_url: &str, embed_base: &str, library_id: &str) -> String {
    let trimmed = video_url.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let without_query = trimmed.split(['?', '#']).next().unwrap_or_default();
    let last = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let video_id = last.split('.').next().unwrap_or_default();

    embed_url(embed_base, library_id, video_id)
}
