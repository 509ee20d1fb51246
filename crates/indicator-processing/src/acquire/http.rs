//! Blocking HTTP fetcher.

use super::Fetcher;
use crate::error::{PipelineError, Result};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

/// Default timeout for requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// [`Fetcher`] backed by a blocking `reqwest` client.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                PipelineError::InvalidConfig(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let failure = |reason: String| PipelineError::DownloadFailure {
            url: url.to_string(),
            reason,
        };

        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| failure(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failure(format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .map_err(|e| failure(e.without_url().to_string()))?;
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds() {
        assert!(HttpFetcher::with_timeout(5).is_ok());
    }

    #[test]
    fn test_unreachable_host_is_download_failure() {
        let fetcher = HttpFetcher::with_timeout(2).unwrap();
        let result = fetcher.fetch("http://127.0.0.1:9/nothing.zip");
        match result {
            Err(PipelineError::DownloadFailure { url, .. }) => {
                assert_eq!(url, "http://127.0.0.1:9/nothing.zip")
            }
            other => panic!("expected DownloadFailure, got {:?}", other.map(|b| b.len())),
        }
    }
}
