//! Reelcache Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! cache-key derivation shared across all reelcache components.

pub mod config;
pub mod error;
pub mod keys;
pub mod models;
pub mod storage_kind;

// Re-export commonly used types
pub use config::Config;
pub use error::AppError;
pub use keys::derive_reel_id;
pub use models::{ReelRecord, ScrapedReel};
pub use storage_kind::StorageKind;
