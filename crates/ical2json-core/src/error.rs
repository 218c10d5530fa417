//! Error types for ICS conversion.
//!
//! Conversion can fail in two distinct ways, and callers map them to
//! different responses:
//! - [`ParseError`]: the text is not an iCalendar document
//! - [`NormalizationError`]: a parsed event lacks a field the output requires

use thiserror::Error;

/// The input could not be parsed as an iCalendar document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid ICS: {message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    /// Creates a parse error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A required event field that was missing from an occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Uid,
    Start,
}

impl MissingField {
    /// Returns the field name as it appears in the output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uid => "uid",
            Self::Start => "start",
        }
    }
}

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An occurrence could not be turned into an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("event {} is missing required field `{field}`", .uid.as_deref().unwrap_or("<no uid>"))]
pub struct NormalizationError {
    /// The UID of the offending occurrence, when it has one.
    pub uid: Option<String>,
    /// The field that was absent.
    pub field: MissingField,
}

impl NormalizationError {
    /// Creates a normalization error for the given field.
    pub fn missing(uid: Option<&str>, field: MissingField) -> Self {
        Self {
            uid: uid.map(str::to_string),
            field,
        }
    }
}

/// Any failure of a raw-ICS-to-calendar conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

impl ConvertError {
    /// Returns a short machine-readable kind for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::Normalization(_) => "normalization",
        }
    }
}

/// A specialized Result type for conversions.
pub type ConvertResult<T> = Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = ParseError::new("missing BEGIN:VCALENDAR");
        assert_eq!(err.to_string(), "invalid ICS: missing BEGIN:VCALENDAR");
        assert_eq!(err.message(), "missing BEGIN:VCALENDAR");
    }

    #[test]
    fn normalization_error_names_uid_and_field() {
        let err = NormalizationError::missing(Some("abc-1"), MissingField::Start);
        assert_eq!(err.to_string(), "event abc-1 is missing required field `start`");

        let err = NormalizationError::missing(None, MissingField::Uid);
        assert_eq!(err.to_string(), "event <no uid> is missing required field `uid`");
    }

    #[test]
    fn convert_error_kind() {
        let parse: ConvertError = ParseError::new("x").into();
        assert_eq!(parse.kind(), "parse");

        let norm: ConvertError = NormalizationError::missing(None, MissingField::Uid).into();
        assert_eq!(norm.kind(), "normalization");
        assert_eq!(norm.to_string(), "event <no uid> is missing required field `uid`");
    }
}
