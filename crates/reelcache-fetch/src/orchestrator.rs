//! Fetch-or-serve orchestration.

use crate::downloader::{StagedVideo, VideoDownloader};
use crate::scraper::ReelScraper;
use reelcache_core::{derive_reel_id, AppError, ReelRecord};
use reelcache_storage::ReelStore;
use std::sync::Arc;

/// The fetch pipeline: derive key, serve from cache on a hit, otherwise
/// scrape upstream, stage the video, persist, and clean up.
///
/// Shared read-only across concurrent fetches; holds no locks. Two
/// simultaneous misses for the same key may both scrape and both save —
/// the backend's last-write-wins upsert makes that safe but wasteful, an
/// accepted duplication window rather than a defect.
pub struct ReelFetcher {
    store: Arc<dyn ReelStore>,
    scraper: Arc<dyn ReelScraper>,
    downloader: VideoDownloader,
}

impl ReelFetcher {
    pub fn new(
        store: Arc<dyn ReelStore>,
        scraper: Arc<dyn ReelScraper>,
        downloader: VideoDownloader,
    ) -> Self {
        ReelFetcher {
            store,
            scraper,
            downloader,
        }
    }

    pub fn store(&self) -> &Arc<dyn ReelStore> {
        &self.store
    }

    /// Fetch the record for a source URL, from cache when possible.
    ///
    /// Returns a complete record or a single upstream-failure reason. A
    /// failed video download or cache write degrades (metadata-only entry /
    /// unpersisted record) instead of failing the call. Temp files staged
    /// during the call are removed on every exit path.
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, source_url: &str) -> Result<ReelRecord, AppError> {
        let reel_id = derive_reel_id(source_url);

        if let Some(record) = self.read_cached(&reel_id, source_url).await {
            return Ok(record);
        }

        // Cache miss: one scrape attempt, never retried.
        let scraped = self.scraper.scrape(source_url).await?;
        let record = ReelRecord::from_scraped(source_url, &reel_id, scraped);

        let staged = self.stage_video(&reel_id, &record).await;

        let stored = match self
            .store
            .save(&reel_id, &record, staged.as_ref().map(StagedVideo::path))
            .await
        {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(
                    reel_id = %reel_id,
                    error = %e,
                    "Cache write failed, returning unpersisted record"
                );
                record
            }
        };

        // Dropping the guard deletes the staged file regardless of how the
        // save went.
        drop(staged);

        Ok(stored)
    }

    /// Cache read path. Corrupt or unreadable entries log a warning and
    /// report a miss so a fresh fetch can recover.
    async fn read_cached(&self, reel_id: &str, source_url: &str) -> Option<ReelRecord> {
        match self.store.exists(reel_id).await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                tracing::warn!(reel_id = %reel_id, error = %e, "Cache existence check failed, treating as miss");
                return None;
            }
        }

        match self.store.get_metadata(reel_id).await {
            Ok(Some(mut record)) => {
                record.from_cache = true;
                // The cached URL may be a differently canonicalized form.
                record.url = source_url.to_string();
                tracing::info!(reel_id = %reel_id, "Cache hit");
                Some(record)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(reel_id = %reel_id, error = %e, "Cached metadata unreadable, refetching");
                None
            }
        }
    }

    /// Stage the upstream video, if any. Download failures are non-fatal;
    /// a metadata-only cache entry is a valid, complete outcome.
    async fn stage_video(&self, reel_id: &str, record: &ReelRecord) -> Option<StagedVideo> {
        if !record.has_upstream_video() {
            return None;
        }

        match self.downloader.download(&record.video_url).await {
            Ok(staged) => Some(staged),
            Err(e) => {
                tracing::warn!(
                    reel_id = %reel_id,
                    error = %e,
                    "Video download failed, caching metadata only"
                );
                None
            }
        }
    }

    /// Administrative delete by source URL.
    ///
    /// The canonical key domain is the derived key; this derives it and
    /// reports whether an entry existed, along with the key acted on.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, source_url: &str) -> Result<(bool, String), AppError> {
        let reel_id = derive_reel_id(source_url);
        let existed = self.store.delete(&reel_id).await?;
        Ok((existed, reel_id))
    }
}
