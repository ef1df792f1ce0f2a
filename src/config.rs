//! Runtime configuration for the API client and the response cache
//!
//! Both structs carry sensible defaults and are filled in from CLI flags by
//! [`crate::cli::StartupConfig`].

use std::path::PathBuf;
use std::time::Duration;

/// Base URL of the portfolio API (versioned prefix included)
pub const DEFAULT_BASE_URL: &str = "https://api.folio.dev/v1";

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base backoff between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Namespace prefix for every cache key
pub const DEFAULT_CACHE_PREFIX: &str = "portfolio_cache_";

/// Cache entries are valid for 10 minutes
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(600_000);

/// Settings for [`crate::api::ApiClient`]
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base backoff delay, grown by 1.5x per failed attempt
    pub retry_delay: Duration,
    /// Per-request timeout; `None` leaves it to the transport
    pub timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            timeout: None,
        }
    }
}

impl ApiConfig {
    /// Replaces the base URL, dropping any trailing slashes.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(&base_url.into());
        self
    }
}

/// Settings for [`crate::cache::TtlCache`]
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Prefix prepended to every logical key
    pub prefix: String,
    /// How long an entry stays valid after it was written
    pub ttl: Duration,
    /// Directory for on-disk entries; `None` means the XDG cache dir
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_CACHE_PREFIX.to_string(),
            ttl: DEFAULT_CACHE_TTL,
            dir: None,
        }
    }
}

/// Strips trailing slashes so `base + "/path"` never doubles them.
pub fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
