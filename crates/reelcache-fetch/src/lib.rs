//! Reelcache Fetch Library
//!
//! The fetch-or-serve pipeline: upstream scraper client, streaming video
//! downloader with guaranteed temp-file cleanup, and the orchestrator that
//! ties key derivation, cache lookup, upstream retrieval, and persistence
//! together.

pub mod downloader;
pub mod orchestrator;
pub mod scraper;

// Re-export commonly used types
pub use downloader::{StagedVideo, VideoDownloader};
pub use orchestrator::ReelFetcher;
pub use scraper::{HttpScraper, ReelScraper};
