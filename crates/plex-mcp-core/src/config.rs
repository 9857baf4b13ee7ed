//! Configuration for the Plex MCP server.
//!
//! Configuration is environment-style: `PLEX_URL` and `PLEX_TOKEN` are
//! required, the rest have defaults. No on-disk state is owned by this
//! crate.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default staleness window for the cached upstream connection.
///
/// Chosen so transient server restarts are detected promptly without
/// re-handshaking on every call.
pub const DEFAULT_CONNECTION_TTL: Duration = Duration::from_secs(300);

/// Default per-request timeout against the Plex server.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the upstream Plex server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlexConfig {
    /// Base URL of the Plex server, e.g. `http://localhost:32400`
    pub base_url: String,

    /// Authentication token (`X-Plex-Token`)
    pub token: String,

    /// Optional account name used to scope account-filtered queries
    pub username: Option<String>,

    /// Maximum age at which a cached connection is trusted without
    /// re-validation
    pub connection_ttl: Duration,

    /// Timeout applied to each HTTP request
    pub request_timeout: Duration,
}

impl PlexConfig {
    /// Create a configuration with default TTL and timeout.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            username: None,
            connection_ttl: DEFAULT_CONNECTION_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable             | Required | Default |
    /// |----------------------|----------|---------|
    /// | `PLEX_URL`           | yes      | -       |
    /// | `PLEX_TOKEN`         | yes      | -       |
    /// | `PLEX_USERNAME`      | no       | unset   |
    /// | `PLEX_CONN_TTL_SECS` | no       | 300     |
    /// | `PLEX_TIMEOUT_SECS`  | no       | 30      |
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("PLEX_URL")
            .map_err(|_| Error::Config("PLEX_URL is not set".to_string()))?;
        let token = std::env::var("PLEX_TOKEN")
            .map_err(|_| Error::Config("PLEX_TOKEN is not set".to_string()))?;

        let username = std::env::var("PLEX_USERNAME").ok().filter(|s| !s.is_empty());

        let connection_ttl = match std::env::var("PLEX_CONN_TTL_SECS") {
            Ok(raw) => Duration::from_secs(parse_secs("PLEX_CONN_TTL_SECS", &raw)?),
            Err(_) => DEFAULT_CONNECTION_TTL,
        };
        let request_timeout = match std::env::var("PLEX_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(parse_secs("PLEX_TIMEOUT_SECS", &raw)?),
            Err(_) => DEFAULT_REQUEST_TIMEOUT,
        };

        let config = Self {
            base_url,
            token,
            username,
            connection_ttl,
            request_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid PLEX_URL '{}': {}", self.base_url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Config(format!(
                "PLEX_URL must be http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.token.trim().is_empty() {
            return Err(Error::Config("PLEX_TOKEN must not be empty".to_string()));
        }

        if self.connection_ttl.is_zero() {
            return Err(Error::Config(
                "PLEX_CONN_TTL_SECS must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_secs(name: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| Error::Config(format!("{name} must be a number of seconds, got '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> PlexConfig {
        PlexConfig::new("http://localhost:32400", "token123")
    }

    #[test]
    fn test_new_defaults() {
        let config = valid_config();
        assert_eq!(config.connection_ttl, Duration::from_secs(300));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.username.is_none());
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_https_url() {
        let config = PlexConfig::new("https://plex.example.com:32400", "token123");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_url() {
        let config = PlexConfig::new("not a url", "token123");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_bad_scheme() {
        let config = PlexConfig::new("ftp://localhost:32400", "token123");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_token() {
        let config = PlexConfig::new("http://localhost:32400", "  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_ttl() {
        let mut config = valid_config();
        config.connection_ttl = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs("X", "120").unwrap(), 120);
        assert!(parse_secs("X", "two").is_err());
    }
}
