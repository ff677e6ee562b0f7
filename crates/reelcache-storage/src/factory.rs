use crate::{HybridStore, LocalStore, ReelStore, StorageKind, StoreError, StoreResult};
use reelcache_core::Config;
use std::sync::Arc;

/// Create the storage backend selected by configuration.
///
/// Called once at process start; the returned instance is shared by
/// reference for the lifetime of the process.
pub async fn create_store(config: &Config) -> StoreResult<Arc<dyn ReelStore>> {
    match config.storage_backend {
        StorageKind::Local => {
            let store = LocalStore::new(&config.local_cache_dir).await?;
            Ok(Arc::new(store))
        }

        StorageKind::HybridCloud => {
            let database_url = config.cache_database_url.as_deref().ok_or_else(|| {
                StoreError::ConfigError("CACHE_DATABASE_URL not configured".to_string())
            })?;
            let bucket = config
                .blob_bucket
                .clone()
                .ok_or_else(|| StoreError::ConfigError("BLOB_BUCKET not configured".to_string()))?;

            let store = HybridStore::connect(
                database_url,
                bucket,
                config.blob_region.clone(),
                config.blob_endpoint_url.clone(),
                config.blob_public_base_url.clone(),
            )
            .await?;
            Ok(Arc::new(store))
        }
    }
}
