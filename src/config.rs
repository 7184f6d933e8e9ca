//! Configuration Module
//!
//! Connection and versioning parameters for a Redis-backed cache.

use std::env;

use url::Url;

use crate::error::{CacheError, Result};

/// Address used when none is configured.
pub const DEFAULT_REDIS_ADDRESS: &str = "localhost:6379";

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Redis `host:port`
    pub address: String,
    /// Optional Redis password
    pub password: Option<String>,
    /// Redis logical database index
    pub db: i64,
    /// Version tag folded into every physical key
    pub version: String,
}

impl Config {
    /// Creates a config for the default address and database.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_REDIS_ADDRESS` - Redis host:port (default: localhost:6379)
    /// - `CACHE_REDIS_PASSWORD` - Redis password (default: none)
    /// - `CACHE_REDIS_DB` - Database index (default: 0)
    /// - `CACHE_VERSION` - Version tag (default: empty)
    pub fn from_env() -> Self {
        Self {
            address: env::var("CACHE_REDIS_ADDRESS")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_REDIS_ADDRESS.to_string()),
            password: env::var("CACHE_REDIS_PASSWORD")
                .ok()
                .filter(|v| !v.is_empty()),
            db: env::var("CACHE_REDIS_DB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            version: env::var("CACHE_VERSION").unwrap_or_default(),
        }
    }

    /// Renders the connection parameters as a `redis://` URL.
    ///
    /// The password is percent-encoded and the database index becomes the path.
    /// A negative database index is rejected.
    pub fn redis_url(&self) -> Result<String> {
        if self.db < 0 {
            return Err(CacheError::Config(format!(
                "database index must not be negative, got {}",
                self.db
            )));
        }

        let address = if self.address.is_empty() {
            DEFAULT_REDIS_ADDRESS
        } else {
            self.address.as_str()
        };

        let mut url = Url::parse(&format!("redis://{address}"))
            .map_err(|e| CacheError::Config(format!("invalid address {address:?}: {e}")))?;
        if url.host_str().map_or(true, str::is_empty) {
            return Err(CacheError::Config(format!(
                "address {address:?} has no host"
            )));
        }

        if let Some(password) = &self.password {
            url.set_password(Some(password))
                .map_err(|_| CacheError::Config("password cannot be set on address".into()))?;
        }
        url.set_path(&format!("/{}", self.db));

        Ok(url.into())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_REDIS_ADDRESS.to_string(),
            password: None,
            db: 0,
            version: String::new(),
        }
    }
}
