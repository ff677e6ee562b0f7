//! Configuration module
//!
//! Environment-driven configuration for the cache service. The storage
//! backend is chosen once at process start; hybrid-cloud credentials are
//! validated up front so a misconfigured process fails fast instead of
//! failing per-request.

use std::env;

use crate::storage_kind::StorageKind;

const DEFAULT_SERVER_PORT: u16 = 8000;
const DEFAULT_LOCAL_CACHE_DIR: &str = "./cache";
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub storage_backend: StorageKind,
    pub local_cache_dir: String,
    // Hybrid-cloud backend: metadata table + object store
    pub cache_database_url: Option<String>,
    pub blob_bucket: Option<String>,
    pub blob_region: Option<String>,
    pub blob_endpoint_url: Option<String>,
    pub blob_public_base_url: Option<String>,
    // Upstream scraping collaborator
    pub scraper_api_url: Option<String>,
    pub scraper_api_token: Option<String>,
    pub download_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let server_port = match env::var("SERVER_PORT") {
            Ok(v) => v
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("Invalid SERVER_PORT: {}", v))?,
            Err(_) => DEFAULT_SERVER_PORT,
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(v) => v.parse::<StorageKind>()?,
            Err(_) => StorageKind::Local,
        };

        let download_timeout_secs = match env::var("DOWNLOAD_TIMEOUT_SECS") {
            Ok(v) => v
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("Invalid DOWNLOAD_TIMEOUT_SECS: {}", v))?,
            Err(_) => DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        };

        let config = Config {
            server_port,
            storage_backend,
            local_cache_dir: env::var("LOCAL_CACHE_DIR")
                .unwrap_or_else(|_| DEFAULT_LOCAL_CACHE_DIR.to_string()),
            cache_database_url: env::var("CACHE_DATABASE_URL").ok(),
            blob_bucket: env::var("BLOB_BUCKET").ok(),
            blob_region: env::var("BLOB_REGION").ok(),
            blob_endpoint_url: env::var("BLOB_ENDPOINT_URL").ok(),
            blob_public_base_url: env::var("BLOB_PUBLIC_BASE_URL").ok(),
            scraper_api_url: env::var("SCRAPER_API_URL").ok(),
            scraper_api_token: env::var("SCRAPER_API_TOKEN").ok(),
            download_timeout_secs,
        };

        Ok(config)
    }

    /// Validate that the selected backend has its required settings.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let StorageKind::HybridCloud = self.storage_backend {
            if self.cache_database_url.is_none() {
                anyhow::bail!(
                    "CACHE_DATABASE_URL must be set when using the hybrid_cloud backend"
                );
            }
            if self.blob_bucket.is_none() {
                anyhow::bail!("BLOB_BUCKET must be set when using the hybrid_cloud backend");
            }
            if self.blob_region.is_none() && self.blob_endpoint_url.is_none() {
                anyhow::bail!(
                    "BLOB_REGION or BLOB_ENDPOINT_URL must be set when using the hybrid_cloud backend"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> Config {
        Config {
            server_port: DEFAULT_SERVER_PORT,
            storage_backend: StorageKind::Local,
            local_cache_dir: DEFAULT_LOCAL_CACHE_DIR.to_string(),
            cache_database_url: None,
            blob_bucket: None,
            blob_region: None,
            blob_endpoint_url: None,
            blob_public_base_url: None,
            scraper_api_url: None,
            scraper_api_token: None,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        }
    }

    #[test]
    fn local_backend_needs_no_cloud_settings() {
        assert!(local_config().validate().is_ok());
    }

    #[test]
    fn hybrid_backend_requires_database_and_bucket() {
        let mut config = local_config();
        config.storage_backend = StorageKind::HybridCloud;
        assert!(config.validate().is_err());

        config.cache_database_url = Some("postgres://cache".to_string());
        assert!(config.validate().is_err());

        config.blob_bucket = Some("reels".to_string());
        config.blob_endpoint_url = Some("http://localhost:9000".to_string());
        assert!(config.validate().is_ok());
    }
}
