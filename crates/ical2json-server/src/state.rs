//! Shared application state.

use std::sync::Arc;

use ical2json_core::{Calendar, ConvertOptions, Converter, OutputMode};
use ical2json_providers::CalendarSource;
use tracing::info_span;

use crate::error::ApiError;

/// State shared by every request handler.
///
/// Nothing is cached: each request fetches and converts its calendar
/// independently.
#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn CalendarSource>,
    options: ConvertOptions,
}

impl AppState {
    /// Creates state around a calendar source and default options.
    pub fn new(source: Arc<dyn CalendarSource>, options: ConvertOptions) -> Self {
        Self { source, options }
    }

    /// The default conversion options.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Fetches calendar `uri` and converts it, optionally overriding the
    /// output mode.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Retrieval`] when the fetch fails and
    /// [`ApiError::Convert`] when the document cannot be converted.
    pub async fn calendar(&self, uri: &str, mode: Option<OutputMode>) -> Result<Calendar, ApiError> {
        let ics = self.source.fetch_ics(uri).await?;

        let options = match mode {
            Some(mode) => self.options.with_output_mode(mode),
            None => self.options,
        };
        let span = info_span!(
            "convert",
            source = self.source.name(),
            uri = %uri,
            mode = %options.output_mode
        );
        let calendar = Converter::new(options).with_span(span).convert(&ics)?;
        Ok(calendar)
    }
}
