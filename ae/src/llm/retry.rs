//! Bounded retry with backoff, shared by the HTTP clients

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use tracing::{debug, warn};

use super::LlmError;

/// Initial backoff delay for retries
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Upper bound on any single wait, including server-provided retry-after
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Wait assumed for a 429 without a usable retry-after header
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Check if an HTTP status code is retryable
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504 | 529)
}

/// Delay before retry number `attempt` (1-based)
///
/// Exponential from `INITIAL_BACKOFF_MS`, except a rate limit with a
/// retry-after hint waits for the hint. Both are capped at `MAX_BACKOFF_MS`.
pub fn backoff_delay(attempt: u32, last_error: Option<&LlmError>) -> Duration {
    let exponential = INITIAL_BACKOFF_MS.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
    let millis = match last_error.and_then(LlmError::retry_after) {
        Some(hint) => hint.as_millis().min(u128::from(MAX_BACKOFF_MS)) as u64,
        None => exponential.min(MAX_BACKOFF_MS),
    };
    debug!(attempt, millis, "backoff_delay: computed");
    Duration::from_millis(millis)
}

/// Send a request built by `build`, retrying transient failures
///
/// Makes at most `max_retries + 1` attempts and returns the first successful
/// response. A non-retryable failure is returned at once.
pub async fn send_with_retry<F>(build: F, max_retries: u32, timeout: Duration) -> Result<Response, LlmError>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_error: Option<LlmError> = None;
    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = backoff_delay(attempt, last_error.as_ref());
            warn!(
                attempt,
                backoff_ms = delay.as_millis() as u64,
                error = ?last_error,
                "Retrying oracle call after transient error"
            );
            tokio::time::sleep(delay).await;
        }

        let error = match build().send().await {
            Ok(response) if response.status().is_success() => {
                debug!(attempt, "send_with_retry: success");
                return Ok(response);
            }
            Ok(response) => status_error(response).await,
            Err(e) if e.is_timeout() => LlmError::Timeout(timeout),
            Err(e) => LlmError::Network(e),
        };

        debug!(attempt, %error, "send_with_retry: attempt failed");
        if !error.is_retryable() {
            return Err(error);
        }
        last_error = Some(error);
    }

    Err(last_error.unwrap_or_else(|| LlmError::BadResponse("no attempt was made".to_string())))
}

/// Turn a non-success response into an error, reading retry-after on 429
async fn status_error(response: Response) -> LlmError {
    let status = response.status().as_u16();
    if status == 429 {
        let secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return LlmError::RateLimited {
            retry_after: Duration::from_secs(secs),
        };
    }

    let body = response.text().await.unwrap_or_default();
    LlmError::Api { status, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(1, None), Duration::from_millis(1000));
        assert_eq!(backoff_delay(2, None), Duration::from_millis(2000));
        assert_eq!(backoff_delay(3, None), Duration::from_millis(4000));
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(backoff_delay(20, None), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[test]
    fn test_rate_limit_hint_wins_but_is_capped() {
        let short = LlmError::RateLimited {
            retry_after: Duration::from_secs(3),
        };
        assert_eq!(backoff_delay(1, Some(&short)), Duration::from_secs(3));

        let long = LlmError::RateLimited {
            retry_after: Duration::from_secs(600),
        };
        assert_eq!(backoff_delay(1, Some(&long)), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[test]
    fn test_retryable_status() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(401));
    }

    #[tokio::test]
    async fn test_unreachable_host_fails_after_retries() {
        // Nothing listens on port 9 of localhost; each attempt is refused
        let http = reqwest::Client::new();
        let result = send_with_retry(|| http.post("http://127.0.0.1:9/v1/chat"), 0, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(LlmError::Network(_)) | Err(LlmError::Timeout(_))));
    }
}
