use crate::traits::{ReelStore, StoreError, StoreResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload, Result as ObjectResult};
use reelcache_core::{ReelRecord, StorageKind};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

/// Lifetime of signed blob URLs. Callers must not hold a signed URL past
/// this window; it is an access token, not a cache key.
const SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

const DB_MAX_CONNECTIONS: u32 = 10;

/// Hybrid cloud storage implementation
///
/// Metadata lives in a Postgres `reel_cache` table keyed by `reel_id`;
/// video blobs live in an S3-compatible bucket as `{reel_id}.mp4`. The two
/// are addressed independently; save order (blob first, then row) keeps
/// metadata from ever referencing a blob that was not written.
#[derive(Clone)]
pub struct HybridStore {
    pool: PgPool,
    store: AmazonS3,
    bucket: String,
    public_base_url: Option<String>,
}

/// Row type for the reel_cache table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
struct ReelRow {
    reel_id: String,
    url: String,
    caption: String,
    hashtags: Vec<String>,
    location: String,
    likes: i64,
    timestamp: Option<String>,
    owner_username: String,
    video_url: String,
    display_url: String,
    video_object_key: Option<String>,
    cached_at: DateTime<Utc>,
}

impl ReelRow {
    fn into_record(self) -> ReelRecord {
        ReelRecord {
            url: self.url,
            reel_id: self.reel_id,
            caption: self.caption,
            hashtags: self.hashtags,
            location: self.location,
            likes: self.likes,
            timestamp: self.timestamp,
            owner_username: self.owner_username,
            video_url: self.video_url,
            display_url: self.display_url,
            blob_ref: self.video_object_key,
            from_cache: false,
            cached_at: Some(self.cached_at),
        }
    }
}

/// Object-store key for a cached video blob.
fn video_object_key(reel_id: &str) -> String {
    format!("{}.mp4", reel_id)
}

/// Blob orphaned by a replacement save, if any. A save that stores no
/// blob nulls the row's pointer, so the object that pointer named must
/// go too; a save with a blob overwrites the same `{reel_id}.mp4` object.
fn stale_blob_key(previous: Option<String>, replacement: Option<&str>) -> Option<String> {
    match replacement {
        Some(_) => None,
        None => previous,
    }
}

/// Direct link for a public bucket.
fn public_video_url(base_url: &str, object_key: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), object_key)
}

impl HybridStore {
    /// Connect to the metadata database and the blob bucket, and run the
    /// schema migrations.
    ///
    /// Bucket credentials come from the standard AWS environment variables
    /// via `AmazonS3Builder::from_env`; `endpoint_url` targets S3-compatible
    /// providers (R2, MinIO, DigitalOcean Spaces).
    pub async fn connect(
        database_url: &str,
        bucket: String,
        region: Option<String>,
        endpoint_url: Option<String>,
        public_base_url: Option<String>,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(DB_MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .map_err(|e| {
                StoreError::ConfigError(format!("Failed to connect to metadata database: {}", e))
            })?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::ConfigError(format!("Migration failed: {}", e)))?;

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket.clone());

        if let Some(region) = region {
            builder = builder.with_region(region);
        }
        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StoreError::ConfigError(e.to_string()))?;

        tracing::info!(bucket = %bucket, "Hybrid cloud store initialized");

        Ok(HybridStore {
            pool,
            store,
            bucket,
            public_base_url,
        })
    }

    /// Upload a staged video file to the bucket.
    async fn upload_blob(&self, object_key: &str, video_path: &Path) -> StoreResult<()> {
        let data = fs::read(video_path).await.map_err(|e| {
            StoreError::UploadFailed(format!(
                "Failed to read staged video {}: {}",
                video_path.display(),
                e
            ))
        })?;

        let size = data.len() as u64;
        let location = ObjectPath::from(object_key.to_string());
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self
            .store
            .put(&location, PutPayload::from(Bytes::from(data)))
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %object_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Blob upload failed"
            );
            StoreError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %object_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Blob upload successful"
        );

        Ok(())
    }

    async fn delete_blob(&self, object_key: &str) -> StoreResult<()> {
        let location = ObjectPath::from(object_key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(_) | Err(ObjectStoreError::NotFound { .. }) => Ok(()),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %object_key,
                    "Blob delete failed"
                );
                Err(StoreError::DeleteFailed(e.to_string()))
            }
        }
    }

    async fn fetch_object_key(&self, reel_id: &str) -> StoreResult<Option<Option<String>>> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT video_object_key FROM reel_cache WHERE reel_id = $1")
                .bind(reel_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(key,)| key))
    }
}

#[async_trait]
impl ReelStore for HybridStore {
    async fn exists(&self, reel_id: &str) -> StoreResult<bool> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT reel_id FROM reel_cache WHERE reel_id = $1")
                .bind(reel_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    async fn get_metadata(&self, reel_id: &str) -> StoreResult<Option<ReelRecord>> {
        let row: Option<ReelRow> = sqlx::query_as(
            r#"
            SELECT reel_id, url, caption, hashtags, location, likes, "timestamp",
                   owner_username, video_url, display_url, video_object_key, cached_at
            FROM reel_cache
            WHERE reel_id = $1
            "#,
        )
        .bind(reel_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ReelRow::into_record))
    }

    async fn save(
        &self,
        reel_id: &str,
        record: &ReelRecord,
        video_path: Option<&Path>,
    ) -> StoreResult<ReelRecord> {
        let start = std::time::Instant::now();

        // Blob upload first: if it fails, no metadata row is written that
        // would reference a nonexistent object.
        let object_key = match video_path {
            Some(path) => {
                let key = video_object_key(reel_id);
                self.upload_blob(&key, path).await?;
                Some(key)
            }
            None => None,
        };

        // Pointer currently on the row, read before the upsert replaces it.
        let previous_key = self.fetch_object_key(reel_id).await?.flatten();

        let cached_at: (DateTime<Utc>,) = sqlx::query_as(
            r#"
            INSERT INTO reel_cache
                (reel_id, url, caption, hashtags, location, likes, "timestamp",
                 owner_username, video_url, display_url, video_object_key, cached_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, now())
            ON CONFLICT (reel_id) DO UPDATE SET
                url = EXCLUDED.url,
                caption = EXCLUDED.caption,
                hashtags = EXCLUDED.hashtags,
                location = EXCLUDED.location,
                likes = EXCLUDED.likes,
                "timestamp" = EXCLUDED."timestamp",
                owner_username = EXCLUDED.owner_username,
                video_url = EXCLUDED.video_url,
                display_url = EXCLUDED.display_url,
                video_object_key = EXCLUDED.video_object_key,
                cached_at = now()
            RETURNING cached_at
            "#,
        )
        .bind(reel_id)
        .bind(&record.url)
        .bind(&record.caption)
        .bind(&record.hashtags)
        .bind(&record.location)
        .bind(record.likes)
        .bind(&record.timestamp)
        .bind(&record.owner_username)
        .bind(&record.video_url)
        .bind(&record.display_url)
        .bind(&object_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::WriteFailed(format!("Metadata upsert failed: {}", e)))?;

        // A metadata-only save that replaced a blob-bearing entry leaves
        // the old object unreachable; remove it, best-effort.
        if let Some(key) = stale_blob_key(previous_key, object_key.as_deref()) {
            if let Err(e) = self.delete_blob(&key).await {
                tracing::warn!(
                    reel_id = %reel_id,
                    key = %key,
                    error = %e,
                    "Failed to remove replaced blob"
                );
            }
        }

        tracing::info!(
            reel_id = %reel_id,
            has_blob = object_key.is_some(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Hybrid cache save successful"
        );

        let mut stored = record.clone();
        stored.blob_ref = object_key;
        stored.from_cache = false;
        stored.cached_at = Some(cached_at.0);

        Ok(stored)
    }

    async fn get_video_url(&self, reel_id: &str) -> StoreResult<Option<String>> {
        let object_key = match self.fetch_object_key(reel_id).await? {
            Some(Some(key)) => key,
            _ => return Ok(None),
        };

        if let Some(ref base_url) = self.public_base_url {
            return Ok(Some(public_video_url(base_url, &object_key)));
        }

        let location = ObjectPath::from(object_key);
        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::GET, &location, SIGNED_URL_TTL)
            .await;

        let url = url_result
            .map_err(|e| StoreError::BackendError(e.to_string()))?
            .to_string();

        Ok(Some(url))
    }

    async fn delete(&self, reel_id: &str) -> StoreResult<bool> {
        // Read the row first to discover the blob pointer.
        let object_key = match self.fetch_object_key(reel_id).await? {
            Some(key) => key,
            None => return Ok(false),
        };

        sqlx::query("DELETE FROM reel_cache WHERE reel_id = $1")
            .bind(reel_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::DeleteFailed(format!("Metadata delete failed: {}", e)))?;

        if let Some(key) = object_key {
            self.delete_blob(&key).await?;
        }

        tracing::info!(reel_id = %reel_id, "Hybrid cache delete successful");

        Ok(true)
    }

    fn backend_kind(&self) -> StorageKind {
        StorageKind::HybridCloud
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_keys_are_deterministic() {
        assert_eq!(video_object_key("ABC123"), "ABC123.mp4");
        assert_eq!(video_object_key("ABC123"), video_object_key("ABC123"));
    }

    #[test]
    fn metadata_only_resave_removes_the_replaced_blob() {
        // Some -> None transition: the old object is now unreachable.
        assert_eq!(
            stale_blob_key(Some("ABC123.mp4".into()), None),
            Some("ABC123.mp4".into())
        );
        // Re-saving with a blob overwrites the same object in place.
        assert_eq!(stale_blob_key(Some("ABC123.mp4".into()), Some("ABC123.mp4")), None);
        // Nothing cached, nothing to remove.
        assert_eq!(stale_blob_key(None, None), None);
    }

    #[test]
    fn public_url_joins_without_double_slash() {
        assert_eq!(
            public_video_url("https://cdn.example.com/", "ABC.mp4"),
            "https://cdn.example.com/ABC.mp4"
        );
        assert_eq!(
            public_video_url("https://cdn.example.com", "ABC.mp4"),
            "https://cdn.example.com/ABC.mp4"
        );
    }
}
