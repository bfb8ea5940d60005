//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `REALM_API_BASE_URL` - Backend REST API base URL (default: <http://localhost:5000>)
//! - `REALM_POLL_INTERVAL_SECS` - Wishlist reconciliation poll period (default: 10)
//! - `REALM_BADGE_OVERFLOW` - Badge count cap before rendering as "N+" (default: 9)
//! - `REALM_PRODUCT_CACHE_TTL_SECS` - Product read cache TTL (default: 300)
//! - `REALM_CACHE_PATH` - File path for the durable wishlist cache; when
//!   unset the cache is in-memory only
//!
//! The poll interval and badge overflow are display policy, not correctness
//! knobs; they exist as configuration precisely so nobody tunes the code.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_BADGE_OVERFLOW: usize = 9;
const DEFAULT_PRODUCT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the backend REST API.
    pub api_base_url: Url,
    /// Safety-net poll period for wishlist reconciliation.
    pub poll_interval: Duration,
    /// Largest count the badge renders verbatim; above it the label is "N+".
    pub badge_overflow: usize,
    /// TTL for cached product reads.
    pub product_cache_ttl: Duration,
    /// Durable cache file; `None` keeps the wishlist cache in memory.
    pub cache_path: Option<PathBuf>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present. Every
    /// variable has a default, so loading only fails on unparseable values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_env_or_default("REALM_API_BASE_URL", DEFAULT_API_BASE_URL)
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("REALM_API_BASE_URL".to_owned(), e.to_string())
            })?;
        let poll_interval = get_duration_secs("REALM_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        let badge_overflow = get_parsed_or_default("REALM_BADGE_OVERFLOW", DEFAULT_BADGE_OVERFLOW)?;
        let product_cache_ttl =
            get_duration_secs("REALM_PRODUCT_CACHE_TTL_SECS", DEFAULT_PRODUCT_CACHE_TTL_SECS)?;
        let cache_path = get_optional_env("REALM_CACHE_PATH").map(PathBuf::from);

        Ok(Self {
            api_base_url,
            poll_interval,
            badge_overflow,
            product_cache_ttl,
            cache_path,
        })
    }
}

impl Default for StorefrontConfig {
    #[allow(clippy::expect_used)] // the default URL literal always parses
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL
                .parse()
                .expect("default base URL is valid"),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            badge_overflow: DEFAULT_BADGE_OVERFLOW,
            product_cache_ttl: Duration::from_secs(DEFAULT_PRODUCT_CACHE_TTL_SECS),
            cache_path: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to a default when unset.
fn get_parsed_or_default<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Parse a whole-seconds duration from the environment.
fn get_duration_secs(key: &str, default_secs: u64) -> Result<Duration, ConfigError> {
    let secs: u64 = get_parsed_or_default(key, default_secs)?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_owned(),
            "must be at least 1 second".to_owned(),
        ));
    }
    Ok(Duration::from_secs(secs))
}
