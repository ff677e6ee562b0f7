use crate::traits::{ReelStore, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use reelcache_core::{ReelRecord, StorageKind};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const METADATA_FILE: &str = "metadata.json";
const VIDEO_FILE: &str = "video.mp4";

/// Local filesystem storage implementation
///
/// One directory per cache key under the configured root, holding the
/// metadata document and, when present, the video blob. A single-process
/// local cache has no concurrent-writer hazard to guard at this layer, so
/// there is no partial-write protocol beyond blob-then-metadata ordering.
#[derive(Clone)]
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    /// Create a new LocalStore rooted at `base_path`, creating it if needed.
    pub async fn new(base_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StoreError::ConfigError(format!(
                "Failed to create cache directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStore { base_path })
    }

    /// Resolve a cache key to its per-key directory, rejecting keys that
    /// could escape the cache root.
    fn reel_dir(&self, reel_id: &str) -> StoreResult<PathBuf> {
        if reel_id.is_empty()
            || reel_id.contains("..")
            || reel_id.contains('/')
            || reel_id.contains('\\')
        {
            return Err(StoreError::InvalidKey(format!(
                "Cache key contains invalid characters: {}",
                reel_id
            )));
        }
        Ok(self.base_path.join(reel_id))
    }

    fn metadata_path(&self, reel_id: &str) -> StoreResult<PathBuf> {
        Ok(self.reel_dir(reel_id)?.join(METADATA_FILE))
    }

    fn video_path(&self, reel_id: &str) -> StoreResult<PathBuf> {
        Ok(self.reel_dir(reel_id)?.join(VIDEO_FILE))
    }
}

#[async_trait]
impl ReelStore for LocalStore {
    async fn exists(&self, reel_id: &str) -> StoreResult<bool> {
        let path = self.metadata_path(reel_id)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn get_metadata(&self, reel_id: &str) -> StoreResult<Option<ReelRecord>> {
        let path = self.metadata_path(reel_id)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }

        let data = fs::read(&path).await.map_err(|e| {
            StoreError::ReadFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let record: ReelRecord = serde_json::from_slice(&data).map_err(|e| {
            StoreError::Corrupt(format!("Unreadable metadata for {}: {}", reel_id, e))
        })?;

        Ok(Some(record))
    }

    async fn save(
        &self,
        reel_id: &str,
        record: &ReelRecord,
        video_path: Option<&Path>,
    ) -> StoreResult<ReelRecord> {
        let dir = self.reel_dir(reel_id)?;
        let start = std::time::Instant::now();

        fs::create_dir_all(&dir).await.map_err(|e| {
            StoreError::WriteFailed(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        // Blob first, so the metadata document never references a file that
        // was not written. A save without a video fully replaces the entry,
        // including dropping any previously cached blob.
        let blob_dest = dir.join(VIDEO_FILE);
        let blob_ref = match video_path {
            Some(src) => {
                fs::copy(src, &blob_dest).await.map_err(|e| {
                    StoreError::UploadFailed(format!(
                        "Failed to copy {} to {}: {}",
                        src.display(),
                        blob_dest.display(),
                        e
                    ))
                })?;
                Some(blob_dest.display().to_string())
            }
            None => {
                if fs::try_exists(&blob_dest).await.unwrap_or(false) {
                    fs::remove_file(&blob_dest).await.map_err(|e| {
                        StoreError::WriteFailed(format!(
                            "Failed to remove stale blob {}: {}",
                            blob_dest.display(),
                            e
                        ))
                    })?;
                }
                None
            }
        };

        let mut stored = record.clone();
        stored.blob_ref = blob_ref;
        stored.from_cache = false;
        stored.cached_at = Some(Utc::now());

        let data = serde_json::to_vec_pretty(&stored)
            .map_err(|e| StoreError::WriteFailed(format!("Failed to serialize metadata: {}", e)))?;

        let path = dir.join(METADATA_FILE);
        let mut file = fs::File::create(&path).await.map_err(|e| {
            StoreError::WriteFailed(format!("Failed to create {}: {}", path.display(), e))
        })?;
        file.write_all(&data).await.map_err(|e| {
            StoreError::WriteFailed(format!("Failed to write {}: {}", path.display(), e))
        })?;
        file.sync_all().await.map_err(|e| {
            StoreError::WriteFailed(format!("Failed to sync {}: {}", path.display(), e))
        })?;

        tracing::info!(
            reel_id = %reel_id,
            path = %path.display(),
            has_blob = stored.blob_ref.is_some(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local cache save successful"
        );

        Ok(stored)
    }

    async fn get_video_url(&self, reel_id: &str) -> StoreResult<Option<String>> {
        let path = self.video_path(reel_id)?;
        if fs::try_exists(&path).await.unwrap_or(false) {
            // Filesystem path; the caller is responsible for serving it.
            Ok(Some(path.display().to_string()))
        } else {
            Ok(None)
        }
    }

    async fn delete(&self, reel_id: &str) -> StoreResult<bool> {
        let dir = self.reel_dir(reel_id)?;

        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(false);
        }

        fs::remove_dir_all(&dir).await.map_err(|e| {
            StoreError::DeleteFailed(format!("Failed to delete {}: {}", dir.display(), e))
        })?;

        tracing::info!(reel_id = %reel_id, "Local cache delete successful");

        Ok(true)
    }

    fn backend_kind(&self) -> StorageKind {
        StorageKind::Local
    }
}
