//! Error types for calendar retrieval.
//!
//! This module defines the errors that can occur while fetching raw ICS
//! text from a calendar server.

use std::fmt;
use thiserror::Error;

/// The category of a retrieval error.
///
/// Callers use it to pick a transport-level response (an HTTP status in
/// the server, an exit message in the CLI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetrievalErrorCode {
    /// Authentication failed or credentials are invalid.
    AuthenticationFailed,
    /// Authorization failed - user lacks permission.
    AuthorizationFailed,
    /// Network error - connection failed, DNS resolution, etc.
    NetworkError,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// Calendar not found (404).
    NotFound,
    /// Rate limit exceeded - too many requests.
    RateLimited,
    /// Server returned an error (5xx status codes).
    ServerError,
    /// Unexpected status or unreadable body.
    InvalidResponse,
    /// Configuration error - missing or invalid config.
    ConfigurationError,
}

impl RetrievalErrorCode {
    /// Returns true if this error is transient.
    ///
    /// Nothing in this workspace retries; the flag is informational.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::Timeout | Self::RateLimited | Self::ServerError
        )
    }

    /// Returns a machine-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::Timeout => "timeout",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::ConfigurationError => "configuration_error",
        }
    }
}

impl fmt::Display for RetrievalErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while fetching a calendar.
#[derive(Debug, Error)]
pub struct RetrievalError {
    /// The error code categorizing this error.
    code: RetrievalErrorCode,
    /// A human-readable message describing the error.
    message: String,
    /// The source that generated this error (e.g., "nextcloud").
    source_name: Option<String>,
    /// The underlying cause of this error, if any.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RetrievalError {
    /// Creates a new retrieval error with the given code and message.
    pub fn new(code: RetrievalErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source_name: None,
            source: None,
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(RetrievalErrorCode::AuthenticationFailed, message)
    }

    /// Creates an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(RetrievalErrorCode::AuthorizationFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RetrievalErrorCode::NetworkError, message)
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(RetrievalErrorCode::Timeout, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RetrievalErrorCode::NotFound, message)
    }

    /// Creates a rate limit error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(RetrievalErrorCode::RateLimited, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(RetrievalErrorCode::ServerError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(RetrievalErrorCode::InvalidResponse, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(RetrievalErrorCode::ConfigurationError, message)
    }

    /// Sets the source name for this error.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Sets the underlying cause of this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> RetrievalErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the source name, if set.
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// Returns true if this error is transient.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Returns true if the request timed out.
    pub fn is_timeout(&self) -> bool {
        self.code == RetrievalErrorCode::Timeout
    }
}

impl fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref name) = self.source_name {
            write!(f, "[{}] ", name)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for retrieval operations.
pub type RetrievalResult<T> = Result<T, RetrievalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_retryable() {
        assert!(RetrievalErrorCode::NetworkError.is_retryable());
        assert!(RetrievalErrorCode::Timeout.is_retryable());
        assert!(RetrievalErrorCode::ServerError.is_retryable());
        assert!(!RetrievalErrorCode::AuthenticationFailed.is_retryable());
        assert!(!RetrievalErrorCode::NotFound.is_retryable());
    }

    #[test]
    fn retrieval_error_creation() {
        let err = RetrievalError::authentication("bad password");
        assert_eq!(err.code(), RetrievalErrorCode::AuthenticationFailed);
        assert_eq!(err.message(), "bad password");
        assert!(err.source_name().is_none());
        assert!(!err.is_timeout());
    }

    #[test]
    fn retrieval_error_display() {
        let err = RetrievalError::timeout("no answer after 10s").with_source_name("nextcloud");
        assert_eq!(err.to_string(), "[nextcloud] timeout: no answer after 10s");
        assert!(err.is_timeout());
    }

    #[test]
    fn retrieval_error_with_source() {
        use std::error::Error;
        let io_err = std::io::Error::other("connection reset");
        let err = RetrievalError::network("request failed").with_source(io_err);
        assert!(err.source().is_some());
    }
}
