// # HTTP Metadata Fetcher
//
// This crate provides the HTTP implementation of `MetadataFetcher`.
//
// ## Purpose
//
// Queries the host-local metadata service for the document describing the
// VM's network interfaces. The service is reachable without authentication
// at a link-local address.
//
// ## Behavior
//
// - One GET per fetch, no retries (the caller's schedule is the retry)
// - Any non-2xx status is a fetch failure
// - The body is read to the end before returning, so the connection is
//   released on every path
// - Requests are bounded by the configured timeout

use ipam_core::config::MetadataConfig;
use ipam_core::traits::MetadataFetcher;
use ipam_core::{Error, Result};

use std::time::Duration;

/// Default request timeout when none is configured
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Fetches the interface document over plain HTTP
pub struct HttpMetadataFetcher {
    /// URL to fetch the document from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpMetadataFetcher {
    /// Create a fetcher for `url` with the default timeout
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a fetcher for `url` with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a fetcher from validated configuration
    pub fn from_config(config: &MetadataConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_timeout(config.url.clone(), config.timeout()))
    }
}

#[async_trait::async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch(&self) -> Result<Vec<u8>> {
        tracing::debug!("Requesting interface document from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::fetch(format!("Request to {} failed: {}", self.url, e)))?;

        let status = response.status();

        // Drain the body even on failure so the connection can be reused
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::fetch(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::fetch(format!(
                "Metadata service returned HTTP {}",
                status
            )));
        }

        tracing::debug!("Received {} bytes of interface document", body.len());
        Ok(body.to_vec())
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
