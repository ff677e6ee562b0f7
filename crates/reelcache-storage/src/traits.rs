//! Storage abstraction trait
//!
//! Defines the `ReelStore` trait that all cache storage backends implement.

use async_trait::async_trait;
use reelcache_core::{AppError, ReelRecord, StorageKind};
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Blob upload failed: {0}")]
    UploadFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    #[error("Corrupt cached metadata: {0}")]
    Corrupt(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::BackendError(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ReadFailed(msg) | StoreError::Corrupt(msg) => AppError::CacheRead(msg),
            StoreError::UploadFailed(msg)
            | StoreError::WriteFailed(msg)
            | StoreError::DeleteFailed(msg) => AppError::CacheWrite(msg),
            StoreError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StoreError::ConfigError(msg) => AppError::Config(msg),
            StoreError::BackendError(msg) => AppError::CacheWrite(msg),
        }
    }
}

/// Storage backend abstraction
///
/// A backend composes a metadata store and (optionally) a blob store behind
/// one interface. The instance is chosen once at startup and shared by
/// reference across concurrent fetches; implementations hold no shared
/// mutable state of their own.
#[async_trait]
pub trait ReelStore: Send + Sync {
    /// Cheap existence check; must not require a full record read.
    async fn exists(&self, reel_id: &str) -> StoreResult<bool>;

    /// Full persisted record, or `None` when the key has no entry.
    ///
    /// Unreadable or corrupt metadata is `StoreError::Corrupt`, which the
    /// fetch pipeline treats as a miss.
    async fn get_metadata(&self, reel_id: &str) -> StoreResult<Option<ReelRecord>>;

    /// Idempotent upsert, last-write-wins, no merging.
    ///
    /// With `video_path`, the blob is stored before the metadata is written
    /// and `blob_ref` in the returned record points at it; without one,
    /// `blob_ref` is cleared. The returned record carries the `cached_at`
    /// the store assigned.
    async fn save(
        &self,
        reel_id: &str,
        record: &ReelRecord,
        video_path: Option<&Path>,
    ) -> StoreResult<ReelRecord>;

    /// Retrievable link to the stored blob, or `None` when no blob exists.
    ///
    /// Hybrid backends may return a time-bounded signed URL; callers must
    /// not hold it past its expiry window.
    async fn get_video_url(&self, reel_id: &str) -> StoreResult<Option<String>>;

    /// Remove metadata and blob together. Missing entry is `Ok(false)`.
    async fn delete(&self, reel_id: &str) -> StoreResult<bool>;

    /// Which backend kind this store is.
    fn backend_kind(&self) -> StorageKind;
}
