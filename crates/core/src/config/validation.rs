//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Upper bound on `num_stories`; the top stories list holds at most 500 ids.
const MAX_STORIES: usize = 500;

/// Upper bound on `cache_ttl_secs`: one week.
const MAX_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Upper bound on `persist_margin_secs`: one day.
const MAX_PERSIST_MARGIN_SECS: u64 = 24 * 60 * 60;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `num_stories` exceeds 500
    /// - `fetch_width` is set to 0
    /// - `cache_ttl_secs` is 0 or longer than a week, or `refresh_lead_secs` is not within (0, ttl)
    /// - `persist_margin_secs` is longer than a day
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `cache_path`, `base_url` or `user_agent` is empty, or `base_url` is not http(s)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_stories > MAX_STORIES {
            return Err(ConfigError::Invalid {
                field: "num_stories".into(),
                reason: format!("must not exceed {MAX_STORIES}"),
            });
        }

        if self.fetch_width == Some(0) {
            return Err(ConfigError::Invalid { field: "fetch_width".into(), reason: "must be greater than 0".into() });
        }

        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid { field: "cache_ttl_secs".into(), reason: "must be greater than 0".into() });
        }
        if self.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_secs".into(),
                reason: format!("must not exceed one week ({MAX_CACHE_TTL_SECS}s)"),
            });
        }
        if self.persist_margin_secs > MAX_PERSIST_MARGIN_SECS {
            return Err(ConfigError::Invalid {
                field: "persist_margin_secs".into(),
                reason: format!("must not exceed one day ({MAX_PERSIST_MARGIN_SECS}s)"),
            });
        }
        if self.refresh_lead_secs == 0 || self.refresh_lead_secs >= self.cache_ttl_secs {
            return Err(ConfigError::Invalid {
                field: "refresh_lead_secs".into(),
                reason: "must be greater than 0 and less than cache_ttl_secs".into(),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.cache_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "cache_path".into(), reason: "must not be empty".into() });
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid { field: "base_url".into(), reason: "must be an http(s) URL".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.fetch_width() < self.num_stories {
            tracing::warn!(
                fetch_width = self.fetch_width(),
                num_stories = self.num_stories,
                "fetch_width is smaller than num_stories; every request needs several chunks"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_num_stories_exceeds_limit() {
        let config = AppConfig { num_stories: 501, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "num_stories"));
    }

    #[test]
    fn test_validate_zero_stories_allowed() {
        let config = AppConfig { num_stories: 0, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_fetch_width_zero() {
        let config = AppConfig { fetch_width: Some(0), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "fetch_width"));
    }

    #[test]
    fn test_validate_ttl_zero() {
        let config = AppConfig { cache_ttl_secs: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_ttl_secs"));
    }

    #[test]
    fn test_validate_ttl_upper_bound() {
        let config = AppConfig { cache_ttl_secs: u64::MAX, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_ttl_secs"));

        let config = AppConfig { cache_ttl_secs: MAX_CACHE_TTL_SECS + 1, ..Default::default() };
        assert!(config.validate().is_err());

        let config = AppConfig { cache_ttl_secs: MAX_CACHE_TTL_SECS, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_persist_margin_upper_bound() {
        let config = AppConfig { persist_margin_secs: u64::MAX, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "persist_margin_secs"));

        let config = AppConfig { persist_margin_secs: MAX_PERSIST_MARGIN_SECS, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_lead_not_below_ttl() {
        let config = AppConfig { cache_ttl_secs: 60, refresh_lead_secs: 60, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "refresh_lead_secs"));

        let config = AppConfig { refresh_lead_secs: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "refresh_lead_secs"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_empty_cache_path() {
        let config = AppConfig { cache_path: PathBuf::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_path"));
    }

    #[test]
    fn test_validate_base_url_scheme() {
        let config = AppConfig { base_url: "ftp://example.com".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "base_url"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig {
            cache_ttl_secs: 2,
            refresh_lead_secs: 1,
            persist_margin_secs: 0,
            timeout_ms: 100,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
