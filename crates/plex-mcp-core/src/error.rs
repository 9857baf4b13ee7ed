//! Error types for the Plex MCP server.

use thiserror::Error;

/// Main error type for Plex MCP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Handshake against the upstream server failed
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Request-level transport failure (connect, timeout, body decode)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream returned a non-success HTTP status
    #[error("Upstream returned HTTP {status}: {message}")]
    UpstreamStatus {
        /// HTTP status code
        status: u16,
        /// Response body or status text
        message: String,
    },

    /// Named entity does not exist on the server
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input or parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this failure indicates the upstream session/transport itself
    /// is broken, as opposed to a valid request being rejected on domain
    /// grounds.
    ///
    /// Connection-class failures cause the connection manager to invalidate
    /// its cached session and retry the operation exactly once. Domain-class
    /// failures (missing entity, bad parameters, most HTTP statuses) must
    /// never trigger a reconnect - the session is healthy, the request was
    /// simply invalid.
    ///
    /// HTTP 401 means the token/session was rejected; 502/503/504 mean the
    /// server behind a proxy went away. Everything else is domain-class.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Error::Connection(_) | Error::Transport(_) => true,
            Error::UpstreamStatus { status, .. } => {
                matches!(status, 401 | 502 | 503 | 504)
            }
            _ => false,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_display() {
        let err = Error::Connection("connection refused".to_string());
        assert_eq!(err.to_string(), "Connection failed: connection refused");
    }

    #[test]
    fn test_transport_error_display() {
        let err = Error::Transport("operation timed out".to_string());
        assert_eq!(err.to_string(), "Transport error: operation timed out");
    }

    #[test]
    fn test_upstream_status_display() {
        let err = Error::UpstreamStatus {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "Upstream returned HTTP 404: Not Found");
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::NotFound("account 'alice'".to_string());
        assert_eq!(err.to_string(), "Not found: account 'alice'");
    }

    #[test]
    fn test_invalid_input_display() {
        let err = Error::InvalidInput("missing parameter".to_string());
        assert_eq!(err.to_string(), "Invalid input: missing parameter");
    }

    #[test]
    fn test_config_error_display() {
        let err = Error::Config("PLEX_URL is not set".to_string());
        assert_eq!(err.to_string(), "Configuration error: PLEX_URL is not set");
    }

    #[test]
    fn test_connection_class() {
        assert!(Error::Connection("x".into()).is_connection_error());
        assert!(Error::Transport("x".into()).is_connection_error());
        assert!(Error::UpstreamStatus {
            status: 401,
            message: "Unauthorized".into()
        }
        .is_connection_error());
        assert!(Error::UpstreamStatus {
            status: 503,
            message: "Service Unavailable".into()
        }
        .is_connection_error());
    }

    #[test]
    fn test_domain_class() {
        assert!(!Error::NotFound("x".into()).is_connection_error());
        assert!(!Error::InvalidInput("x".into()).is_connection_error());
        assert!(!Error::Config("x".into()).is_connection_error());
        assert!(!Error::UpstreamStatus {
            status: 404,
            message: "Not Found".into()
        }
        .is_connection_error());
        assert!(!Error::UpstreamStatus {
            status: 400,
            message: "Bad Request".into()
        }
        .is_connection_error());
        assert!(!Error::Other("x".into()).is_connection_error());
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_err = serde_json::from_str::<i32>("invalid json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_result_type() {
        let success: Result<i32> = Ok(42);
        assert!(success.is_ok());

        let failure: Result<i32> = Err(Error::Other("test error".to_string()));
        assert!(failure.is_err());
    }
}
