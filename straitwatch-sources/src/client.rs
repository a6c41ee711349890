//! Retrying HTTP client shared by the providers
//!
//! Bounded timeout per request, bounded retries with exponential backoff
//! plus jitter on throttling/server errors and transport failures.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::warn;

use crate::SourceError;

/// HTTP behavior shared by all providers
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base backoff; attempt n sleeps roughly base * 2^n
    pub backoff_base_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_retries: 3,
            backoff_base_ms: 1000,
        }
    }
}

/// Statuses worth retrying
fn is_retryable(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// Create an HTTP client with the configured timeout
pub fn create_client(config: &HttpConfig) -> Result<Client, SourceError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(concat!("straitwatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SourceError::ClientBuild(e.to_string()))
}

/// Send a request, retrying retryable failures with backoff.
///
/// The final response is returned as-is; non-retryable statuses are not
/// treated as errors here (providers decide what a 404 means to them).
pub async fn send_with_retry(
    request: RequestBuilder,
    config: &HttpConfig,
) -> Result<Response, SourceError> {
    let mut attempt: u32 = 0;

    loop {
        let cloned = request
            .try_clone()
            .ok_or_else(|| SourceError::ClientBuild("request body not clonable".to_string()))?;

        let outcome = cloned.send().await;

        match outcome {
            Ok(response) if is_retryable(response.status()) && attempt < config.max_retries => {
                warn!(
                    "retryable status {} (attempt {}/{})",
                    response.status(),
                    attempt + 1,
                    config.max_retries
                );
            }
            Ok(response) => return Ok(response),
            Err(err) if attempt < config.max_retries => {
                warn!("request error (attempt {}/{}): {}", attempt + 1, config.max_retries, err);
            }
            Err(err) => return Err(err.into()),
        }

        let backoff = config.backoff_base_ms.saturating_mul(1 << attempt.min(6));
        let jitter = {
            use rand::Rng;
            rand::thread_rng().gen_range(0..250)
        };
        tokio::time::sleep(Duration::from_millis(backoff + jitter)).await;
        attempt += 1;
    }
}
