//! Server error types.

use std::io;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ical2json_core::ConvertError;
use ical2json_providers::RetrievalError;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (bind, accept, etc.).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The calendar source could not be set up.
    #[error("calendar source error: {0}")]
    Source(#[from] RetrievalError),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// A request failure, rendered as a JSON error document.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The raw calendar could not be fetched.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// The fetched document could not be converted.
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Retrieval(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::Retrieval(_) => StatusCode::BAD_GATEWAY,
            Self::Convert(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// A short machine-readable kind: `retrieval`, `parse` or `normalization`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Retrieval(_) => "retrieval",
            Self::Convert(e) => e.kind(),
        }
    }
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = %status, kind = self.kind(), error = %self, "request failed");
        let body = Json(ErrorResponse {
            error: self.to_string(),
            kind: self.kind(),
        });
        (status, body).into_response()
    }
}
