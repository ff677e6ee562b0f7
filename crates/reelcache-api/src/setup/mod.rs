//! Application setup and initialization
//!
//! All startup wiring lives here rather than in main.rs: configuration
//! validation, storage selection, pipeline construction, and routing.

pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use reelcache_core::Config;
use reelcache_fetch::{HttpScraper, ReelFetcher, VideoDownloader};
use std::sync::Arc;
use std::time::Duration;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry();

    tracing::info!("Configuration loaded and validated successfully");

    let store = storage::setup_storage(&config).await?;

    let scraper = HttpScraper::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize scraper client: {}", e))?;
    let downloader = VideoDownloader::new(
        Duration::from_secs(config.download_timeout_secs),
        None,
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize video downloader: {}", e))?;

    let fetcher = Arc::new(ReelFetcher::new(
        store.clone(),
        Arc::new(scraper),
        downloader,
    ));

    let state = Arc::new(AppState {
        config,
        store,
        fetcher,
    });

    let router = routes::setup_routes(state.clone());

    Ok((state, router))
}
