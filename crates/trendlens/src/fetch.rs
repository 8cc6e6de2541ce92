//! HTTP client for the cards API.
//!
//! One refresh issues a single `GET {base}/api/v1/cards?limit=<n>`. Transient
//! failures (connection errors, timeouts, 5xx and 429 responses) are retried
//! with exponential backoff; other failures are returned immediately.

use std::time::Duration;

use thiserror::Error;
use trendlens_core::config::FetchConfig;
use trendlens_core::{AnalysisError, Card, ContentItem, parse_cards};

/// Errors from the cards API client.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout or transport failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        message: String,
    },

    /// The response body was not a card list.
    #[error("could not decode cards: {0}")]
    Decode(#[from] AnalysisError),
}

impl FetchError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            Self::Decode(_) => false,
        }
    }
}

/// Result alias for [`FetchError`].
pub type FetchResult<T> = Result<T, FetchError>;

/// Delay before retry number `attempt + 1`: `base × 2^attempt`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
}

/// Client for `GET /api/v1/cards`.
#[derive(Debug, Clone)]
pub struct CardsClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    backoff: Duration,
}

impl CardsClient {
    /// Build a client for `base_url` with the given transport settings.
    pub fn new(base_url: impl Into<String>, settings: &FetchConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: settings.max_retries,
            backoff: Duration::from_millis(settings.backoff_ms),
        })
    }

    /// URL of the cards endpoint for `limit` items.
    pub fn cards_url(&self, limit: usize) -> String {
        format!("{}/api/v1/cards?limit={limit}", self.base_url)
    }

    /// Fetch up to `limit` cards, retrying transient failures.
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn fetch_cards(&self, limit: usize) -> FetchResult<Vec<Card>> {
        let url = self.cards_url(limit);
        let mut attempt = 0u32;
        loop {
            match self.fetch_once(&url).await {
                Ok(cards) => {
                    tracing::info!(cards = cards.len(), attempts = attempt + 1, "cards fetched");
                    return Ok(cards);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = backoff_delay(self.backoff, attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "cards fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetch cards and normalize them into content items.
    pub async fn fetch_items(&self, limit: usize) -> FetchResult<Vec<ContentItem>> {
        let cards = self.fetch_cards(limit).await?;
        Ok(cards.into_iter().map(ContentItem::from_card).collect())
    }

    async fn fetch_once(&self, url: &str) -> FetchResult<Vec<Card>> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        Ok(parse_cards(&body)?)
    }
}
