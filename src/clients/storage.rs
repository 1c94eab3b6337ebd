use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload of {path} failed: {source}")]
    Http {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("upload of {path} rejected with {status}: {message}")]
    Rejected {
        path: String,
        status: u16,
        message: String,
    },
}

/// Object storage bucket used for posters, person photos and videos.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;

    fn public_url(&self, path: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

impl StorageClient {
    #[must_use]
    pub fn with_shared_client(client: Client, project_url: &str, api_key: &str, bucket: &str) -> Self {
        Self {
            client,
            base_url: format!("{}/storage/v1", project_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            bucket: bucket.to_string(),
        }
    }

    fn object_url(&self, prefix: &str, path: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url,
            prefix,
            urlencoding::encode(&self.bucket),
            encode_path(path)
        )
    }
}

/// Percent-encodes each segment while keeping the `/` separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl ObjectStorage for StorageClient {
    async fn upload(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let url = self.object_url("object", path);
        debug!(path, size = bytes.len(), "Uploading object");

        let result = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await;

        let outcome = match &result {
            Ok(r) if r.status().is_success() => "success",
            _ => "error",
        };
        metrics::counter!(
            "backend_requests_total",
            "service" => "storage",
            "operation" => "upload",
            "outcome" => outcome
        )
        .increment(1);

        let response = result.map_err(|source| StorageError::Http {
            path: path.to_string(),
            source,
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected {
                path: path.to_string(),
                status,
                message,
            });
        }

        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        self.object_url("object/public", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_encodes_segments() {
        let client = StorageClient::with_shared_client(
            Client::new(),
            "https://abc.supabase.co/",
            "key",
            "media",
        );
        assert_eq!(
            client.public_url("posters/1700000000000-my poster.jpg"),
            "https://abc.supabase.co/storage/v1/object/public/media/posters/1700000000000-my%20poster.jpg"
        );
    }
}
