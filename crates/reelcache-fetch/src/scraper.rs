//! Upstream scraping collaborator client.
//!
//! The scraper is a black box behind [`ReelScraper`]: given a source URL it
//! returns a single structured record or fails. Scraping calls are costly
//! and rate-limited upstream, so callers never retry them.

use async_trait::async_trait;
use reelcache_core::{AppError, Config, ScrapedReel};
use serde_json::Value;
use std::time::Duration;

const SCRAPE_TIMEOUT: Duration = Duration::from_secs(120);

/// Upstream scraping collaborator.
///
/// Constructed once at process start and injected into the fetch pipeline.
#[async_trait]
pub trait ReelScraper: Send + Sync {
    /// Scrape one source URL. Any shortfall — transport failure, non-2xx,
    /// malformed or empty response — is `AppError::Upstream`.
    async fn scrape(&self, source_url: &str) -> Result<ScrapedReel, AppError>;
}

/// HTTP client for a hosted scraping API.
///
/// Posts `{"url": ...}` to the configured endpoint with an optional bearer
/// token; accepts either a single record object or an array whose first
/// element is the record.
pub struct HttpScraper {
    client: reqwest::Client,
    api_url: String,
    api_token: Option<String>,
}

impl HttpScraper {
    pub fn new(api_url: String, api_token: Option<String>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(SCRAPE_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(HttpScraper {
            client,
            api_url,
            api_token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let api_url = config
            .scraper_api_url
            .clone()
            .ok_or_else(|| AppError::Config("SCRAPER_API_URL not configured".to_string()))?;
        Self::new(api_url, config.scraper_api_token.clone())
    }
}

/// Pull the record object out of the response body.
fn extract_record(body: Value) -> Result<ScrapedReel, AppError> {
    let item = match body {
        Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Upstream("Scraper returned an empty dataset".to_string()))?,
        Value::Null => {
            return Err(AppError::Upstream("Scraper returned no data".to_string()));
        }
        other => other,
    };

    serde_json::from_value(item)
        .map_err(|e| AppError::Upstream(format!("Unexpected scraper response shape: {}", e)))
}

#[async_trait]
impl ReelScraper for HttpScraper {
    async fn scrape(&self, source_url: &str) -> Result<ScrapedReel, AppError> {
        let start = std::time::Instant::now();

        let mut request = self
            .client
            .post(&self.api_url)
            .json(&serde_json::json!({ "url": source_url }));

        if let Some(ref token) = self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Scraper request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Scraper returned status {}: {}",
                status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Scraper response was not JSON: {}", e)))?;

        let scraped = extract_record(body)?;

        tracing::info!(
            url = %source_url,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upstream scrape successful"
        );

        Ok(scraped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_single_object_response() {
        let body = json!({"caption": "hi", "likes": 3, "owner_username": "someone"});
        let scraped = extract_record(body).unwrap();
        assert_eq!(scraped.caption, "hi");
        assert_eq!(scraped.likes, 3);
    }

    #[test]
    fn extracts_first_element_of_array_response() {
        let body = json!([{"caption": "first"}, {"caption": "second"}]);
        let scraped = extract_record(body).unwrap();
        assert_eq!(scraped.caption, "first");
    }

    #[test]
    fn empty_dataset_is_an_upstream_error() {
        assert!(matches!(
            extract_record(json!([])),
            Err(AppError::Upstream(_))
        ));
        assert!(matches!(
            extract_record(Value::Null),
            Err(AppError::Upstream(_))
        ));
    }

    #[test]
    fn malformed_record_is_an_upstream_error() {
        let body = json!({"likes": "not a number"});
        assert!(matches!(extract_record(body), Err(AppError::Upstream(_))));
    }
}
