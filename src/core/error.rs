//! Error types for the logging facade

use std::time::Duration;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Credentials environment variable is not set
    #[error("env var {var} is not set")]
    MissingEnv { var: String },

    /// Credentials file could not be read
    #[error("read {path} failed: {source}")]
    CredentialsRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Credentials file is not the expected JSON document
    #[error("unmarshal file {path} failed: {source}")]
    CredentialsParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Service-account assertion could not be signed
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    /// No usable token provider
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Non-string key in an alternating key/value list
    #[error("Key at position {position} is not a string: {found}")]
    InvalidKey { position: usize, found: String },

    /// Remote service rejected or failed a request
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Flush did not complete in time
    #[error("Flush did not complete within {timeout:?}")]
    FlushTimeout { timeout: Duration },

    /// Remote sink worker is gone
    #[error("Remote sink already stopped")]
    SinkStopped,
}

impl LoggerError {
    /// Create a missing environment variable error
    pub fn missing_env(var: impl Into<String>) -> Self {
        LoggerError::MissingEnv { var: var.into() }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an invalid key error
    pub fn invalid_key(position: usize, found: impl Into<String>) -> Self {
        LoggerError::InvalidKey {
            position,
            found: found.into(),
        }
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        LoggerError::TransportError(msg.into())
    }

    /// Create an authentication error
    pub fn auth<S: Into<String>>(msg: S) -> Self {
        LoggerError::AuthError(msg.into())
    }

    /// Create a flush timeout error
    pub fn flush_timeout(timeout: Duration) -> Self {
        LoggerError::FlushTimeout { timeout }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::missing_env("GOOGLE_APPLICATION_CREDENTIALS");
        assert!(matches!(err, LoggerError::MissingEnv { .. }));

        let err = LoggerError::config("CloudLoggingSink", "empty project id");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::invalid_key(2, "42");
        assert!(matches!(err, LoggerError::InvalidKey { position: 2, .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::missing_env("GOOGLE_APPLICATION_CREDENTIALS");
        assert_eq!(
            err.to_string(),
            "env var GOOGLE_APPLICATION_CREDENTIALS is not set"
        );

        let err = LoggerError::invalid_key(0, "true");
        assert_eq!(err.to_string(), "Key at position 0 is not a string: true");

        let err = LoggerError::flush_timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "Flush did not complete within 5s");
    }

    #[test]
    fn test_credentials_read_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = LoggerError::CredentialsRead {
            path: "/etc/creds.json".to_string(),
            source: io_err,
        };

        assert!(err.to_string().contains("/etc/creds.json"));
        assert!(err.to_string().contains("no such file"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
