//! Page retrieval.
//!
//! [`PageFetcher`] is the seam between the pipeline and wherever page HTML
//! comes from. [`HttpFetcher`] is the production implementation: one GET,
//! no retries, browser user-agent on a shared client.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::error::IngestError;

/// Retrieves the raw text of a problem page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, IngestError>;
}

/// Fetches pages over HTTP(S).
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IngestError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, IngestError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| IngestError::Network(format!("malformed URL '{}': {}", url, e)))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| IngestError::Network(format!("GET {} failed: {}", url, e)))?;

        // The extractor decides whether the body is usable.
        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "page fetch returned non-success status");
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| IngestError::Network(format!("reading body of {} failed: {}", url, e)))?;

        let body = String::from_utf8(bytes.to_vec())
            .map_err(|e| IngestError::Network(format!("body of {} is not UTF-8: {}", url, e)))?;

        debug!(%url, bytes = body.len(), "fetched page");
        Ok(body)
    }
}
