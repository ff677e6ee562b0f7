//! Reelcache Storage Library
//!
//! Storage abstraction and backend implementations for the reel cache.
//! A backend bundles a metadata store and a blob store behind one trait:
//!
//! - [`LocalStore`]: one directory per cache key under a local root, holding
//!   a `metadata.json` document and, when a video was cached, a `video.mp4`.
//! - [`HybridStore`]: a Postgres `reel_cache` table for metadata plus an
//!   S3-compatible object store for blobs, addressed as `{reel_id}.mp4`.
//!
//! Cache keys are derived strings (see `reelcache_core::keys`); keys must
//! not contain path separators or `..`.

pub mod factory;
pub mod hybrid;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use factory::create_store;
pub use hybrid::HybridStore;
pub use local::LocalStore;
pub use reelcache_core::StorageKind;
pub use traits::{ReelStore, StoreError, StoreResult};
