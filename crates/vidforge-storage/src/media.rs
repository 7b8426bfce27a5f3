//! Re-hosting of provider output into owned storage.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use vidforge_models::{MediaId, ProviderKind, StoredMedia};

use crate::client::ObjectStoreClient;
use crate::error::{StorageError, StorageResult};

/// Timeout for fetching provider-hosted output. Providers serve finished
/// clips from a CDN, so this is much shorter than generation itself.
const SOURCE_FETCH_TIMEOUT_SECS: u64 = 120;

/// Persists generated media and its metadata record.
#[derive(Clone)]
pub struct MediaStore {
    store: ObjectStoreClient,
    http: reqwest::Client,
}

impl MediaStore {
    pub fn new(store: ObjectStoreClient) -> StorageResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(SOURCE_FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| StorageError::config_error(e.to_string()))?;
        Ok(Self { store, http })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        Self::new(ObjectStoreClient::from_env().await?)
    }

    fn video_key(owner_user_id: &str, media_id: &MediaId) -> String {
        format!("media/{}/{}.mp4", owner_user_id, media_id)
    }

    fn record_key(owner_user_id: &str, media_id: &MediaId) -> String {
        format!("media/{}/{}.json", owner_user_id, media_id)
    }

    /// Copy a provider-hosted video into the bucket and write its record.
    ///
    /// Returns the durable [`StoredMedia`]. Any failure here leaves no
    /// partial record: the video object may exist without a record, which
    /// the caller surfaces by logging the orphaned URL.
    pub async fn store(
        &self,
        owner_user_id: &str,
        prompt: &str,
        provider: ProviderKind,
        source_url: &str,
        thumbnail_url: Option<String>,
    ) -> StorageResult<StoredMedia> {
        debug!("Fetching provider output from {}", source_url);

        let response = self
            .http
            .get(source_url)
            .send()
            .await
            .map_err(|e| StorageError::source_fetch_failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(StorageError::source_fetch_failed(format!(
                "{} returned {}",
                source_url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::source_fetch_failed(e.to_string()))?
            .to_vec();
        let size_bytes = bytes.len() as u64;

        let media_id = MediaId::new();
        let video_key = Self::video_key(owner_user_id, &media_id);
        self.store.upload_bytes(bytes, &video_key, "video/mp4").await?;

        let media = StoredMedia {
            id: media_id.clone(),
            name: StoredMedia::name_from_prompt(prompt),
            owner_user_id: owner_user_id.to_string(),
            url: self.store.public_url(&video_key),
            thumbnail_url,
            source_prompt: prompt.to_string(),
            source_provider: provider,
            size_bytes,
            created_at: Utc::now(),
        };

        let record_key = Self::record_key(owner_user_id, &media_id);
        self.store.put_json(&record_key, &media).await?;

        info!(
            media_id = %media_id,
            size_bytes,
            "Persisted generated media to {}",
            video_key
        );
        Ok(media)
    }

    /// Load a media record.
    pub async fn get(
        &self,
        owner_user_id: &str,
        media_id: &MediaId,
    ) -> StorageResult<StoredMedia> {
        self.store
            .get_json(&Self::record_key(owner_user_id, media_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let media_id = MediaId::from_string("m-1");
        assert_eq!(MediaStore::video_key("u1", &media_id), "media/u1/m-1.mp4");
        assert_eq!(MediaStore::record_key("u1", &media_id), "media/u1/m-1.json");
    }
}
