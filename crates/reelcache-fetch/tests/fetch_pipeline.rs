//! End-to-end tests for the fetch-or-serve pipeline against the local
//! storage backend, with an in-process mock for the scraping collaborator.

use async_trait::async_trait;
use reelcache_core::{AppError, ReelRecord, ScrapedReel, StorageKind};
use reelcache_fetch::{ReelFetcher, ReelScraper, VideoDownloader};
use reelcache_storage::{LocalStore, ReelStore, StoreError, StoreResult};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

/// Scraper stub that counts invocations.
struct MockScraper {
    calls: AtomicUsize,
    response: Result<ScrapedReel, String>,
}

impl MockScraper {
    fn returning(scraped: ScrapedReel) -> Self {
        MockScraper {
            calls: AtomicUsize::new(0),
            response: Ok(scraped),
        }
    }

    fn failing(message: &str) -> Self {
        MockScraper {
            calls: AtomicUsize::new(0),
            response: Err(message.to_string()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReelScraper for MockScraper {
    async fn scrape(&self, _source_url: &str) -> Result<ScrapedReel, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Ok(scraped) => Ok(scraped.clone()),
            Err(msg) => Err(AppError::Upstream(msg.clone())),
        }
    }
}

/// Store wrapper whose save always fails; everything else delegates.
struct BrokenSaveStore(LocalStore);

#[async_trait]
impl ReelStore for BrokenSaveStore {
    async fn exists(&self, reel_id: &str) -> StoreResult<bool> {
        self.0.exists(reel_id).await
    }
    async fn get_metadata(&self, reel_id: &str) -> StoreResult<Option<ReelRecord>> {
        self.0.get_metadata(reel_id).await
    }
    async fn save(
        &self,
        _reel_id: &str,
        _record: &ReelRecord,
        _video_path: Option<&Path>,
    ) -> StoreResult<ReelRecord> {
        Err(StoreError::WriteFailed("disk full".to_string()))
    }
    async fn get_video_url(&self, reel_id: &str) -> StoreResult<Option<String>> {
        self.0.get_video_url(reel_id).await
    }
    async fn delete(&self, reel_id: &str) -> StoreResult<bool> {
        self.0.delete(reel_id).await
    }
    fn backend_kind(&self) -> StorageKind {
        self.0.backend_kind()
    }
}

struct Harness {
    fetcher: ReelFetcher,
    scraper: Arc<MockScraper>,
    store: Arc<dyn ReelStore>,
    staging: TempDir,
    cache: TempDir,
}

async fn harness(scraper: MockScraper) -> Harness {
    let cache = tempdir().unwrap();
    let staging = tempdir().unwrap();
    let store: Arc<dyn ReelStore> = Arc::new(LocalStore::new(cache.path()).await.unwrap());
    let scraper = Arc::new(scraper);
    let downloader = VideoDownloader::new(
        Duration::from_secs(5),
        Some(staging.path().to_path_buf()),
    )
    .unwrap();
    let fetcher = ReelFetcher::new(store.clone(), scraper.clone(), downloader);
    Harness {
        fetcher,
        scraper,
        store,
        staging,
        cache,
    }
}

fn metadata_only_reel() -> ScrapedReel {
    ScrapedReel {
        caption: "beach day".into(),
        hashtags: vec!["travel".into(), "beach".into()],
        location: "Lisbon".into(),
        likes: 42,
        owner_username: "wanderer".into(),
        ..Default::default()
    }
}

fn staged_file_count(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path()).unwrap().count()
}

#[tokio::test]
async fn second_fetch_is_served_from_cache() {
    let h = harness(MockScraper::returning(metadata_only_reel())).await;

    let first = h
        .fetcher
        .fetch("https://x.test/reel/ABC123/")
        .await
        .unwrap();
    assert_eq!(first.reel_id, "ABC123");
    assert!(!first.from_cache);
    assert_eq!(h.scraper.call_count(), 1);

    // Different URL form of the same post: same key, no second scrape.
    let second = h
        .fetcher
        .fetch("https://x.test/reel/ABC123/?igsh=share")
        .await
        .unwrap();
    assert!(second.from_cache);
    assert_eq!(second.reel_id, "ABC123");
    assert_eq!(second.url, "https://x.test/reel/ABC123/?igsh=share");
    assert_eq!(second.caption, first.caption);
    assert_eq!(h.scraper.call_count(), 1);
}

#[tokio::test]
async fn upstream_failure_is_fatal_and_not_retried() {
    let h = harness(MockScraper::failing("dataset empty")).await;

    let result = h.fetcher.fetch("https://x.test/reel/FAIL1/").await;
    match result {
        Err(AppError::Upstream(msg)) => assert!(msg.contains("dataset empty")),
        other => panic!("expected upstream error, got {:?}", other.map(|r| r.reel_id)),
    }
    assert_eq!(h.scraper.call_count(), 1);
    assert!(!h.store.exists("FAIL1").await.unwrap());
}

#[tokio::test]
async fn download_failure_degrades_to_metadata_only() {
    let mut scraped = metadata_only_reel();
    // Nothing listens here; the download fails fast.
    scraped.video_url = "http://127.0.0.1:9/video.mp4".into();
    let h = harness(MockScraper::returning(scraped)).await;

    let record = h
        .fetcher
        .fetch("https://x.test/reel/NODL1/")
        .await
        .unwrap();
    assert!(record.blob_ref.is_none());
    assert_eq!(record.caption, "beach day");

    // The degraded entry is still a complete cache entry.
    let cached = h.store.get_metadata("NODL1").await.unwrap().unwrap();
    assert!(cached.blob_ref.is_none());
    assert_eq!(staged_file_count(&h.staging), 0);
}

#[tokio::test]
async fn successful_video_is_cached_and_staging_cleaned() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = axum::Router::new().route(
        "/video.mp4",
        axum::routing::get(|| async { b"fake video bytes".to_vec() }),
    );
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut scraped = metadata_only_reel();
    scraped.video_url = format!("http://{}/video.mp4", addr);
    let h = harness(MockScraper::returning(scraped)).await;

    let record = h.fetcher.fetch("https://x.test/reel/VID42/").await.unwrap();
    assert!(record.blob_ref.is_some());

    let video_url = h.store.get_video_url("VID42").await.unwrap().unwrap();
    let blob = std::fs::read(&video_url).unwrap();
    assert_eq!(blob, b"fake video bytes");

    // Temp staging is empty once fetch returns.
    assert_eq!(staged_file_count(&h.staging), 0);
}

#[tokio::test]
async fn corrupt_cache_entry_triggers_a_fresh_fetch() {
    let h = harness(MockScraper::returning(metadata_only_reel())).await;

    h.fetcher
        .fetch("https://x.test/reel/CORR1/")
        .await
        .unwrap();
    assert_eq!(h.scraper.call_count(), 1);

    // Corrupt the persisted document behind the store's back.
    let path = h.cache.path().join("CORR1").join("metadata.json");
    std::fs::write(&path, b"{broken").unwrap();

    let record = h
        .fetcher
        .fetch("https://x.test/reel/CORR1/")
        .await
        .unwrap();
    assert!(!record.from_cache);
    assert_eq!(h.scraper.call_count(), 2);

    // The fresh fetch repaired the entry.
    let cached = h.store.get_metadata("CORR1").await.unwrap().unwrap();
    assert_eq!(cached.caption, "beach day");
}

#[tokio::test]
async fn save_failure_still_returns_the_fresh_record() {
    let cache = tempdir().unwrap();
    let staging = tempdir().unwrap();
    let store: Arc<dyn ReelStore> = Arc::new(BrokenSaveStore(
        LocalStore::new(cache.path()).await.unwrap(),
    ));
    let scraper = Arc::new(MockScraper::returning(metadata_only_reel()));
    let downloader = VideoDownloader::new(
        Duration::from_secs(5),
        Some(staging.path().to_path_buf()),
    )
    .unwrap();
    let fetcher = ReelFetcher::new(store, scraper.clone(), downloader);

    let record = fetcher.fetch("https://x.test/reel/NOSAVE/").await.unwrap();
    assert_eq!(record.caption, "beach day");
    assert!(record.blob_ref.is_none());
    assert!(record.cached_at.is_none());
    assert_eq!(staged_file_count(&staging), 0);
}

#[tokio::test]
async fn admin_delete_reports_whether_an_entry_existed() {
    let h = harness(MockScraper::returning(metadata_only_reel())).await;

    h.fetcher
        .fetch("https://x.test/reel/DEL42/")
        .await
        .unwrap();

    let (existed, reel_id) = h
        .fetcher
        .delete("https://x.test/reel/DEL42/?utm=share")
        .await
        .unwrap();
    assert!(existed);
    assert_eq!(reel_id, "DEL42");
    assert!(!h.store.exists("DEL42").await.unwrap());

    let (existed, _) = h.fetcher.delete("https://x.test/reel/DEL42/").await.unwrap();
    assert!(!existed);
}
