//! Error types module
//!
//! Unified error taxonomy for the caching pipeline. The propagation policy
//! lives with the callers: upstream failures abort a fetch, while download
//! and cache-write failures are absorbed so the freshest data still reaches
//! the caller.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The scraping collaborator failed or returned no usable data.
    /// Fatal to the current fetch; never retried.
    #[error("Upstream scrape failed: {0}")]
    Upstream(String),

    /// Staging the video blob failed. Non-fatal: the fetch degrades to a
    /// metadata-only record.
    #[error("Video download failed: {0}")]
    Download(String),

    /// The storage backend failed to persist. Non-fatal to the caller of
    /// fetch; the in-memory record is still returned.
    #[error("Cache write failed: {0}")]
    CacheWrite(String),

    /// Cached metadata was unreadable or corrupt. Treated as a cache miss.
    #[error("Cache read failed: {0}")]
    CacheRead(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl AppError {
    /// Error type name for detailed error responses.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Upstream(_) => "Upstream",
            AppError::Download(_) => "Download",
            AppError::CacheWrite(_) => "CacheWrite",
            AppError::CacheRead(_) => "CacheRead",
            AppError::Config(_) => "Config",
            AppError::NotFound(_) => "NotFound",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Machine-readable error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::Download(_) => "DOWNLOAD_ERROR",
            AppError::CacheWrite(_) => "CACHE_WRITE_ERROR",
            AppError::CacheRead(_) => "CACHE_READ_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_preserves_message() {
        let err = AppError::Upstream("scraper returned empty dataset".to_string());
        assert!(err.to_string().contains("scraper returned empty dataset"));
        assert_eq!(err.error_code(), "UPSTREAM_ERROR");
    }

    #[test]
    fn not_found_maps_to_code() {
        let err = AppError::NotFound("no cache entry for ABC123".to_string());
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(err.error_type(), "NotFound");
    }
}
