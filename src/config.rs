// ⚙️ Runtime Configuration
// Environment-driven settings for the backend API client and local storage

use std::path::PathBuf;
use std::time::Duration;

/// Backend origin used when `MEDFIN_API_BASE_URL` is not set
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Per-attempt request timeout (ms)
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Retries after the first failed attempt
pub const DEFAULT_RETRIES: u32 = 3;

/// Base delay for exponential backoff (ms)
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

// ============================================================================
// CONFIG
// ============================================================================

/// Runtime configuration, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend API origin (no trailing slash)
    pub api_base_url: String,

    /// Per-attempt timeout for backend requests
    pub request_timeout: Duration,

    /// Retries after the first failed attempt
    pub max_retries: u32,

    /// Base delay between attempts (doubled per attempt)
    pub retry_delay: Duration,

    /// SQLite database path for local records (None = records directory default)
    pub storage_path: Option<PathBuf>,
}

impl Config {
    /// Read configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an injected lookup (testable without
    /// mutating the process environment)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("MEDFIN_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_ms = lookup("MEDFIN_TIMEOUT_MS")
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        let max_retries = lookup("MEDFIN_MAX_RETRIES")
            .and_then(|raw| raw.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let retry_delay_ms = lookup("MEDFIN_RETRY_DELAY_MS")
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_DELAY_MS);

        let storage_path = lookup("MEDFIN_STORAGE_PATH").map(PathBuf::from);

        Config {
            api_base_url,
            request_timeout: Duration::from_millis(timeout_ms),
            max_retries,
            retry_delay: Duration::from_millis(retry_delay_ms),
            storage_path,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_env_empty() {
        let config = Config::from_lookup(|_| None);

        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_millis(30_000));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(1_000));
        assert!(config.storage_path.is_none());
    }

    #[test]
    fn test_reads_overrides() {
        let config = Config::from_lookup(|key| match key {
            "MEDFIN_API_BASE_URL" => Some("https://api.medfin.example/".to_string()),
            "MEDFIN_TIMEOUT_MS" => Some("5000".to_string()),
            "MEDFIN_MAX_RETRIES" => Some("1".to_string()),
            "MEDFIN_RETRY_DELAY_MS" => Some("250".to_string()),
            "MEDFIN_STORAGE_PATH" => Some("/tmp/medfin.db".to_string()),
            _ => None,
        });

        // Trailing slash is stripped so path joins stay predictable
        assert_eq!(config.api_base_url, "https://api.medfin.example");
        assert_eq!(config.request_timeout, Duration::from_millis(5_000));
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.retry_delay, Duration::from_millis(250));
        assert_eq!(config.storage_path, Some(PathBuf::from("/tmp/medfin.db")));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = Config::from_lookup(|key| match key {
            "MEDFIN_TIMEOUT_MS" => Some("not-a-number".to_string()),
            "MEDFIN_MAX_RETRIES" => Some("-2".to_string()),
            _ => None,
        });

        assert_eq!(config.request_timeout, Duration::from_millis(30_000));
        assert_eq!(config.max_retries, DEFAULT_RETRIES);
    }
}
