//! Oracle call failures

use std::time::Duration;
use thiserror::Error;

use super::retry::is_retryable_status;

/// Why an oracle call produced no reply
#[derive(Debug, Error)]
pub enum LlmError {
    /// 429 from the provider; `retry_after` comes from the header when present
    #[error("Oracle rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// Any other non-success status
    #[error("Oracle returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Oracle unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Oracle did not answer within {0:?}")]
    Timeout(Duration),

    /// The provider answered, but not in a shape we can read
    #[error("Unreadable oracle reply: {0}")]
    BadResponse(String),

    #[error("Failed to decode oracle reply: {0}")]
    Decode(#[from] serde_json::Error),

    /// Missing credential or unknown provider; raised before any request
    #[error("Oracle configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Transient failures that another attempt may cure
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status, .. } => is_retryable_status(*status),
            Self::BadResponse(_) | Self::Decode(_) | Self::Config(_) => false,
        }
    }

    /// Server-provided wait, for rate limits only
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
