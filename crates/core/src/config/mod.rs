//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (QHN_*)
//! 2. TOML config file (if QHN_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (QHN_*)
/// 2. TOML config file (if QHN_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Number of top stories to serve.
    ///
    /// Set via QHN_NUM_STORIES environment variable.
    #[serde(default = "default_num_stories")]
    pub num_stories: usize,

    /// Number of items fetched in parallel per chunk.
    ///
    /// Set via QHN_FETCH_WIDTH environment variable. When unset the width
    /// is derived from `num_stories`, see [`AppConfig::fetch_width`].
    #[serde(default)]
    pub fetch_width: Option<usize>,

    /// Path to the JSON cache snapshot.
    ///
    /// Set via QHN_CACHE_PATH environment variable.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Lifetime of the published top stories in seconds.
    ///
    /// Set via QHN_CACHE_TTL_SECS environment variable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// How long before expiry the background refresh runs, in seconds.
    ///
    /// Set via QHN_REFRESH_LEAD_SECS environment variable.
    #[serde(default = "default_refresh_lead_secs")]
    pub refresh_lead_secs: u64,

    /// Added to the TTL to form the snapshot persistence period, in seconds.
    ///
    /// Set via QHN_PERSIST_MARGIN_SECS environment variable.
    #[serde(default = "default_persist_margin_secs")]
    pub persist_margin_secs: u64,

    /// Base URL of the Hacker News API.
    ///
    /// Set via QHN_BASE_URL environment variable.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via QHN_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via QHN_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_num_stories() -> usize {
    30
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./qhn-cache.json")
}

fn default_cache_ttl_secs() -> u64 {
    30 * 60
}

fn default_refresh_lead_secs() -> u64 {
    60
}

fn default_persist_margin_secs() -> u64 {
    60
}

fn default_base_url() -> String {
    "https://hacker-news.firebaseio.com/v0".into()
}

fn default_user_agent() -> String {
    "qhn/0.1".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            num_stories: default_num_stories(),
            fetch_width: None,
            cache_path: default_cache_path(),
            cache_ttl_secs: default_cache_ttl_secs(),
            refresh_lead_secs: default_refresh_lead_secs(),
            persist_margin_secs: default_persist_margin_secs(),
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn refresh_lead(&self) -> Duration {
        Duration::from_secs(self.refresh_lead_secs)
    }

    /// Period of the snapshot persistence timer: `ttl + margin`.
    pub fn persist_period(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs.saturating_add(self.persist_margin_secs))
    }

    /// Effective fetch width.
    ///
    /// Uses the configured width when present, otherwise a quarter more
    /// than the number of stories (some fetched items never qualify).
    pub fn fetch_width(&self) -> usize {
        self.fetch_width.unwrap_or_else(|| (self.num_stories * 5).div_ceil(4)).max(1)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `QHN_`
    /// 2. TOML file from `QHN_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("QHN_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("QHN_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.num_stories, 30);
        assert!(config.fetch_width.is_none());
        assert_eq!(config.cache_path, PathBuf::from("./qhn-cache.json"));
        assert_eq!(config.cache_ttl_secs, 1800);
        assert_eq!(config.refresh_lead_secs, 60);
        assert_eq!(config.persist_margin_secs, 60);
        assert_eq!(config.base_url, "https://hacker-news.firebaseio.com/v0");
        assert_eq!(config.user_agent, "qhn/0.1");
        assert_eq!(config.timeout_ms, 10_000);
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(10_000));
        assert_eq!(config.cache_ttl(), Duration::from_secs(1800));
        assert_eq!(config.refresh_lead(), Duration::from_secs(60));
        assert_eq!(config.persist_period(), Duration::from_secs(1860));
    }

    #[test]
    fn test_persist_period_saturates() {
        let config = AppConfig { cache_ttl_secs: u64::MAX, persist_margin_secs: 60, ..Default::default() };
        assert_eq!(config.persist_period(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_derived_fetch_width() {
        let config = AppConfig::default();
        assert_eq!(config.fetch_width(), 38);

        let config = AppConfig { num_stories: 4, ..Default::default() };
        assert_eq!(config.fetch_width(), 5);

        let config = AppConfig { num_stories: 0, ..Default::default() };
        assert_eq!(config.fetch_width(), 1);
    }

    #[test]
    fn test_explicit_fetch_width() {
        let config = AppConfig { fetch_width: Some(8), ..Default::default() };
        assert_eq!(config.fetch_width(), 8);
    }
}
