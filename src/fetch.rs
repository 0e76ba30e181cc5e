//! Source fetching over HTTP
//!
//! A [`Fetcher`] performs exactly one bounded attempt; [`fetch_with_retry`] composes it
//! with the retry policy from [`crate::retry`]. Keeping the two apart lets tests count
//! attempts against a mock server and drive backoff without real timers.

use crate::config::{FetchConfig, RetryConfig};
use crate::error::{Error, FetchError, Result};
use crate::retry::{Sleeper, retry_with_backoff};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Abstraction over one fetch attempt, enabling testability.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve the body at `url`
    ///
    /// Implementations must return [`FetchError::Cancelled`] promptly once `cancel` fires.
    async fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<u8>, FetchError>;
}

/// Production [`Fetcher`] backed by a shared reqwest client.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// Create a fetcher from the fetch settings
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to create HTTP client: {}", e),
                key: Some("fetch".to_string()),
            })?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    async fn attempt(&self, url: Url) -> std::result::Result<Vec<u8>, FetchError> {
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        // Reject early when the server announces an oversized body
        if let Some(len) = response.content_length() {
            if len > self.max_body_bytes as u64 {
                return Err(FetchError::BodyTooLarge {
                    limit: self.max_body_bytes,
                });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(FetchError::BodyTooLarge {
                    limit: self.max_body_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<u8>, FetchError> {
        let parsed = parse_url(url)?;
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = self.attempt(parsed) => result,
        }
    }
}

/// Parse a declared source URL
pub fn parse_url(url: &str) -> std::result::Result<Url, FetchError> {
    Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Fetch `url` with the configured retry policy
///
/// Returns the first successful body, the first non-retryable error, or the last
/// error once the attempt budget is spent. Cancellation during an attempt or a
/// backoff wait yields [`FetchError::Cancelled`].
pub async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    retry: &RetryConfig,
    sleeper: &dyn Sleeper,
    url: &str,
    cancel: &CancellationToken,
) -> std::result::Result<Vec<u8>, FetchError> {
    retry_with_backoff(retry, sleeper, cancel, |attempt| async move {
        debug!(url = %url, attempt, "Fetching source");
        fetcher.fetch(url, cancel).await
    })
    .await
}
