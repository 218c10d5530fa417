//! CalendarSource trait definition.
//!
//! A [`CalendarSource`] hands out raw ICS text for a calendar URI. It is the
//! only suspending step of a conversion; everything after it is synchronous.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::error::{RetrievalError, RetrievalResult};

/// A boxed future for async trait methods.
///
/// Using boxed futures keeps the trait object-safe, so the server can hold
/// an `Arc<dyn CalendarSource>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Something that can fetch raw ICS text by calendar URI.
///
/// # Example Implementation
///
/// ```ignore
/// struct FileSource { dir: PathBuf }
///
/// impl CalendarSource for FileSource {
///     fn name(&self) -> &str { "file" }
///
///     fn fetch_ics<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, RetrievalResult<String>> {
///         Box::pin(async move {
///             std::fs::read_to_string(self.dir.join(uri))
///                 .map_err(|e| RetrievalError::not_found(e.to_string()))
///         })
///     }
/// }
/// ```
pub trait CalendarSource: Send + Sync {
    /// Returns the name of this source (e.g., "nextcloud").
    fn name(&self) -> &str;

    /// Fetches the raw ICS document for `uri`.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError`] on network errors, authentication failures,
    /// timeouts or non-success responses. An error is never reported as an
    /// empty calendar.
    fn fetch_ics<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, RetrievalResult<String>>;
}

/// An in-memory source serving fixed documents by URI.
///
/// Unknown URIs fail with `NotFound`.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    calendars: HashMap<String, String>,
}

impl StaticSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a calendar document.
    pub fn with_calendar(mut self, uri: impl Into<String>, ics: impl Into<String>) -> Self {
        self.calendars.insert(uri.into(), ics.into());
        self
    }
}

impl CalendarSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch_ics<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, RetrievalResult<String>> {
        let result = self.calendars.get(uri).cloned().ok_or_else(|| {
            RetrievalError::not_found(format!("no calendar named `{uri}`")).with_source_name("static")
        });
        Box::pin(async move { result })
    }
}

/// A source that always returns an error.
///
/// This is useful for testing or as a placeholder when a source fails to
/// initialize.
#[derive(Debug)]
pub struct ErrorSource {
    name: String,
    error: RetrievalError,
}

impl ErrorSource {
    /// Creates a new error source.
    pub fn new(name: impl Into<String>, error: RetrievalError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl CalendarSource for ErrorSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_ics<'a>(&'a self, _uri: &'a str) -> BoxFuture<'a, RetrievalResult<String>> {
        // RetrievalError is not Clone because of its boxed source
        let error = RetrievalError::new(self.error.code(), self.error.message())
            .with_source_name(&self.name);
        Box::pin(async move { Err(error) })
    }
}
