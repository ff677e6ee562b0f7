//! Domain models for the reel cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured record returned by the upstream scraping collaborator.
///
/// Missing fields deserialize to empty values; any response shape that
/// cannot produce one of these is an upstream-error condition at the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapedReel {
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub owner_username: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub display_url: String,
}

/// The cached unit: social-post metadata plus an optional pointer to a
/// stored video blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelRecord {
    /// Original source URL as given by the caller.
    pub url: String,
    /// Derived cache key, see [`crate::keys::derive_reel_id`].
    pub reel_id: String,
    pub caption: String,
    pub hashtags: Vec<String>,
    pub location: String,
    /// Like count; never negative.
    pub likes: i64,
    /// Opaque upstream timestamp, passed through as-is.
    pub timestamp: Option<String>,
    pub owner_username: String,
    /// Upstream direct video link; empty when the post has no video.
    pub video_url: String,
    /// Thumbnail link; may be empty.
    pub display_url: String,
    /// Backend-specific pointer to the stored blob. Non-null only when a
    /// video was staged and written at save time.
    pub blob_ref: Option<String>,
    /// Read-path flag; never persisted.
    #[serde(default, skip_serializing)]
    pub from_cache: bool,
    /// Set by the store on write.
    pub cached_at: Option<DateTime<Utc>>,
}

impl ReelRecord {
    /// Build a fresh record from an upstream scrape result.
    ///
    /// Negative like counts from upstream are clamped to zero.
    pub fn from_scraped(url: &str, reel_id: &str, scraped: ScrapedReel) -> Self {
        ReelRecord {
            url: url.to_string(),
            reel_id: reel_id.to_string(),
            caption: scraped.caption,
            hashtags: scraped.hashtags,
            location: scraped.location,
            likes: scraped.likes.max(0),
            timestamp: scraped.timestamp,
            owner_username: scraped.owner_username,
            video_url: scraped.video_url,
            display_url: scraped.display_url,
            blob_ref: None,
            from_cache: false,
            cached_at: None,
        }
    }

    /// Whether the upstream post carries a downloadable video.
    pub fn has_upstream_video(&self) -> bool {
        !self.video_url.is_empty()
    }
}
