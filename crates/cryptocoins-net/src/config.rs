//! File-based configuration.
//!
//! ```toml
//! timeout_secs = 30
//! connect_timeout_secs = 10
//! user_agent = "CryptoCoins/1.0"
//! pinned_certificate = "certs/myserver.cer"
//! coins_endpoint = "https://api.example.com/coins"
//!
//! [cache]
//! memory_capacity = 10485760
//! disk_capacity = 52428800
//!
//! [retry]
//! max_retry_count = 3
//! retryable_status_codes = [500, 502, 503, 504]
//! delay_ms = 2000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cache::CacheConfig;
use crate::coin::DEFAULT_COINS_ENDPOINT;
use crate::retry::RetryPolicy;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The contents are not valid configuration.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Retry settings as written in configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Extra attempts after the first.
    pub max_retry_count: u32,
    /// Statuses that trigger a retry.
    pub retryable_status_codes: Vec<u16>,
    /// Pause before each retry, in milliseconds.
    pub delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retry_count: policy.max_retry_count,
            retryable_status_codes: policy.retryable_status_codes.into_iter().collect(),
            delay_ms: policy.delay_interval.as_millis() as u64,
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        RetryPolicy {
            max_retry_count: settings.max_retry_count,
            retryable_status_codes: settings.retryable_status_codes.iter().copied().collect(),
            delay_interval: Duration::from_millis(settings.delay_ms),
        }
    }
}

/// Top-level fetch configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds. `0` disables it.
    pub timeout_secs: u64,
    /// Connect timeout in seconds. `0` disables it.
    pub connect_timeout_secs: u64,
    /// User agent override.
    pub user_agent: Option<String>,
    /// Path to the pinned certificate. `None` disables pinning.
    pub pinned_certificate: Option<PathBuf>,
    /// Endpoint serving the coin list.
    pub coins_endpoint: String,
    /// Response cache settings.
    pub cache: CacheConfig,
    /// Retry settings.
    pub retry: RetrySettings,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: None,
            pinned_certificate: None,
            coins_endpoint: DEFAULT_COINS_ENDPOINT.to_string(),
            cache: CacheConfig::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl FetchConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// The request timeout.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// The connect timeout.
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_secs > 0).then(|| Duration::from_secs(self.connect_timeout_secs))
    }

    /// The retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = FetchConfig::from_toml_str("").unwrap();
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.cache.memory_capacity, 10 * 1024 * 1024);
        assert_eq!(config.coins_endpoint, DEFAULT_COINS_ENDPOINT);
        assert!(config.pinned_certificate.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = FetchConfig::from_toml_str(
            r#"
            timeout_secs = 0
            user_agent = "Test/1.0"
            pinned_certificate = "certs/myserver.cer"
            coins_endpoint = "https://example.com/crypto"

            [cache]
            memory_capacity = 1024
            disk_capacity = 0

            [retry]
            max_retry_count = 1
            retryable_status_codes = [429]
            delay_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.timeout(), None);
        assert_eq!(config.user_agent.as_deref(), Some("Test/1.0"));
        assert_eq!(config.pinned_certificate, Some(PathBuf::from("certs/myserver.cer")));
        assert_eq!(config.cache.memory_capacity, 1024);
        assert_eq!(config.cache.disk_capacity, 0);

        let policy = config.retry_policy();
        assert_eq!(policy.max_retry_count, 1);
        assert!(policy.is_retryable(429));
        assert!(!policy.is_retryable(503));
        assert_eq!(policy.delay_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_config() {
        let err = FetchConfig::from_toml_str("timeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = FetchConfig::from_file("/nonexistent/cryptocoins.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
