//! Connection settings shared by the HTTP clients

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::LlmError;
use crate::config::LlmConfig;

/// Credential, base URL and transport limits for one provider
pub(super) struct Endpoint {
    pub(super) api_key: String,
    pub(super) base_url: String,
    pub(super) http: Client,
    /// Ceiling applied to every request's `max_tokens`
    pub(super) max_tokens: u32,
    pub(super) max_retries: u32,
    pub(super) timeout: Duration,
}

impl Endpoint {
    /// Resolve the credential and build the HTTP client
    ///
    /// A missing credential is an `LlmError::Config`, raised before any request.
    pub(super) fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(provider = %config.provider, base_url = %config.base_url, "Endpoint::from_config: called");
        let api_key = config.get_api_key().map_err(|e| LlmError::Config(e.to_string()))?;
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            timeout,
        })
    }

    /// Full URL for an API path
    pub(super) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Endpoint for unit tests; never sends anything
    #[cfg(test)]
    pub(super) fn for_tests(max_tokens: u32) -> Self {
        Self {
            api_key: "test-key".to_string(),
            base_url: "https://api.example.com".to_string(),
            http: Client::new(),
            max_tokens,
            max_retries: 0,
            timeout: Duration::from_secs(30),
        }
    }
}
