//! Configuration module for the Book Finder backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::catalog::MAX_PAGE_SIZE;

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Base URL of the upstream catalog API (without trailing slash)
    pub upstream_url: String,
    /// Timeout for a single upstream request
    pub upstream_timeout: Duration,
    /// How long a normalized search page stays cached
    pub cache_ttl: Duration,
    /// Page size used when the caller does not pass maxResults
    pub default_page_size: u32,
    /// Directory holding the persisted wishlist
    pub wishlist_dir: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            upstream_url: "https://www.googleapis.com/books/v1".to_string(),
            upstream_timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(3600),
            default_page_size: MAX_PAGE_SIZE,
            wishlist_dir: PathBuf::from("./data/wishlist"),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let bind_addr = parse_var("BOOKFINDER_BIND_ADDR")?.unwrap_or(defaults.bind_addr);

        let upstream_url = env::var("BOOKFINDER_UPSTREAM_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.upstream_url);

        let upstream_timeout = parse_var("BOOKFINDER_UPSTREAM_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.upstream_timeout);

        let cache_ttl = parse_var("BOOKFINDER_CACHE_TTL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);

        let default_page_size = match parse_var::<u32>("BOOKFINDER_DEFAULT_PAGE_SIZE")? {
            Some(size) if size == 0 || size > MAX_PAGE_SIZE => {
                return Err(ConfigError::Invalid {
                    var: "BOOKFINDER_DEFAULT_PAGE_SIZE",
                    value: size.to_string(),
                })
            }
            Some(size) => size,
            None => defaults.default_page_size,
        };

        let wishlist_dir = env::var("BOOKFINDER_WISHLIST_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.wishlist_dir);

        let log_level = env::var("BOOKFINDER_LOG_LEVEL").unwrap_or(defaults.log_level);

        Ok(Self {
            bind_addr,
            upstream_url,
            upstream_timeout,
            cache_ttl,
            default_page_size,
            wishlist_dir,
            log_level,
        })
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(None),
    }
}
