//! Client error types.

use std::fmt;

use ical2json_core::ConvertError;
use ical2json_providers::RetrievalError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error (missing flag, unreadable config file, bad secret).
    Config(String),
    /// The calendar could not be fetched.
    Retrieval(RetrievalError),
    /// The calendar could not be converted.
    Convert(ConvertError),
    /// A local ICS file could not be read.
    Input(String),
    /// IO error.
    Io(std::io::Error),
    /// The calendar could not be rendered as JSON.
    Serialization(serde_json::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Retrieval(err) => write!(f, "failed to fetch calendar: {}", err),
            Self::Convert(err) => write!(f, "failed to convert calendar: {}", err),
            Self::Input(msg) => write!(f, "input error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Serialization(err) => write!(f, "failed to serialize calendar: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Retrieval(err) => Some(err),
            Self::Convert(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<RetrievalError> for ClientError {
    fn from(err: RetrievalError) -> Self {
        Self::Retrieval(err)
    }
}

impl From<ConvertError> for ClientError {
    fn from(err: ConvertError) -> Self {
        Self::Convert(err)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}
