//! Hacker News API client.
//!
//! ### Specification
//!
//! - **Endpoints**: `{base_url}/topstories.json` (up to 500 ranked ids) and
//!   `{base_url}/item/{id}.json`.
//! - **Missing items**: the API answers `null` for unknown ids.
//! - **Retries**: none. A failed call surfaces as one of the two
//!   [`qhn_core::Error`] variants the [`ItemProvider`] contract allows.

pub mod error;

pub use error::HnError;

use std::time::{Duration, Instant};

use qhn_core::{AppConfig, Error, ItemId, RawItem};
use reqwest::header;

use crate::provider::ItemProvider;

/// Default base URL for the Hacker News API.
const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "qhn/0.1";

/// Hacker News client configuration.
#[derive(Debug, Clone)]
pub struct HnConfig {
    /// Base URL (default: https://hacker-news.firebaseio.com/v0).
    pub base_url: String,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
    /// User-agent string (default: qhn/0.1).
    pub user_agent: String,
}

impl Default for HnConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&AppConfig> for HnConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Hacker News API client.
#[derive(Debug, Clone)]
pub struct HnClient {
    http: reqwest::Client,
    config: HnConfig,
}

impl HnClient {
    /// Create a new client with the given configuration.
    pub fn new(config: HnConfig) -> Result<Self, HnError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        Ok(Self { http, config })
    }

    /// Fetch the ranked top story ids.
    pub async fn top_story_ids(&self) -> Result<Vec<ItemId>, HnError> {
        let url = format!("{}/topstories.json", self.config.base_url);
        let start = Instant::now();

        let bytes = self.get_json(&url).await?;
        let ids = parse_top_ids(&bytes)?;

        tracing::debug!("listed {} top ids in {:?}", ids.len(), start.elapsed());
        Ok(ids)
    }

    /// Fetch a single item.
    pub async fn item(&self, id: ItemId) -> Result<RawItem, HnError> {
        let url = format!("{}/item/{id}.json", self.config.base_url);
        let bytes = self.get_json(&url).await?;
        parse_item(&bytes)
    }

    async fn get_json(&self, url: &str) -> Result<bytes::Bytes, HnError> {
        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HnError::HttpError { status: status.as_u16() });
        }

        Ok(response.bytes().await?)
    }
}

#[async_trait::async_trait]
impl ItemProvider for HnClient {
    async fn top_ids(&self) -> Result<Vec<ItemId>, Error> {
        self.top_story_ids()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("failed to load top stories: {e}")))
    }

    async fn get_item(&self, id: ItemId) -> Result<RawItem, Error> {
        self.item(id)
            .await
            .map_err(|e| Error::ItemUnavailable { id, reason: e.to_string() })
    }
}

/// Decode the `topstories.json` body.
fn parse_top_ids(bytes: &[u8]) -> Result<Vec<ItemId>, HnError> {
    serde_json::from_slice(bytes).map_err(|e| HnError::Parse(e.to_string()))
}

/// Decode an `item/{id}.json` body; `null` means the item does not exist.
fn parse_item(bytes: &[u8]) -> Result<RawItem, HnError> {
    let item: Option<RawItem> = serde_json::from_slice(bytes).map_err(|e| HnError::Parse(e.to_string()))?;
    item.ok_or(HnError::NotFound)
}
