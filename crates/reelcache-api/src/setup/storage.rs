//! Storage setup and initialization

use anyhow::Result;
use reelcache_core::Config;
use reelcache_storage::{create_store, ReelStore};
use std::sync::Arc;

/// Build the cache backend the configuration selects.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn ReelStore>> {
    tracing::info!("Initializing storage backend...");
    let store = create_store(config).await?;
    tracing::info!(
        backend = %store.backend_kind(),
        "Storage backend initialized successfully"
    );
    Ok(store)
}
