//! Tracing setup for ical2json
//!
//! Provides unified logging and tracing configuration for all crates. Logs
//! always go to stderr: the CLI's stdout is reserved for the JSON document.
//!
//! # Usage
//!
//! For binaries, install a process-wide subscriber once:
//! ```ignore
//! use ical2json_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::server())?;
//! ```
//!
//! Library callers that must not touch global state can scope a dispatch:
//! ```ignore
//! let dispatch = TracingConfig::cli().dispatch()?;
//! tracing::dispatcher::with_default(&dispatch, || converter.convert(&text));
//! ```

use thiserror::Error;
use tracing::{Dispatch, Level};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set global subscriber
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::dispatcher::SetGlobalDefaultError),

    /// Failed to parse env filter directive
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Human-readable pretty format (default)
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
    /// JSON format (useful for structured logging in server mode)
    Json,
}

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// The default log level when RUST_LOG is not set
    pub default_level: Level,
    /// Output format for log messages
    pub output_format: TracingOutputFormat,
    /// Whether to include file/line information in logs
    pub include_location: bool,
    /// Whether to include target (module path) in logs
    pub include_target: bool,
    /// Whether to include timestamps
    pub include_timestamp: bool,
    /// Whether to include span events (enter/exit)
    pub include_span_events: bool,
    /// Custom env filter directive (overrides default_level if set)
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Pretty,
            include_location: false,
            include_target: true,
            include_timestamp: true,
            include_span_events: false,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    /// Create a config suitable for quiet CLI usage (warnings only)
    #[must_use]
    pub fn cli() -> Self {
        Self {
            default_level: Level::WARN,
            output_format: TracingOutputFormat::Compact,
            include_location: false,
            include_target: false,
            include_timestamp: false,
            include_span_events: false,
            env_filter: None,
        }
    }

    /// Create a config suitable for CLI usage with debug mode
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            output_format: TracingOutputFormat::Compact,
            include_location: true,
            include_target: true,
            include_timestamp: false,
            include_span_events: false,
            env_filter: None,
        }
    }

    /// Create a config suitable for HTTP server usage
    #[must_use]
    pub fn server() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Json,
            include_location: true,
            include_target: true,
            include_timestamp: true,
            include_span_events: true,
            env_filter: None,
        }
    }

    /// Set the default log level
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set a custom env filter directive
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Build the subscriber described by this config as a [`Dispatch`].
    ///
    /// Nothing global is touched; the caller decides whether to install it
    /// process-wide ([`init_tracing`]) or scope it with
    /// [`tracing::dispatcher::with_default`].
    ///
    /// The `RUST_LOG` environment variable overrides the default level.
    ///
    /// # Errors
    ///
    /// Returns an error if the custom env filter directive is invalid.
    pub fn dispatch(&self) -> Result<Dispatch, TracingError> {
        let env_filter = if let Some(ref filter) = self.env_filter {
            EnvFilter::try_new(filter)?
        } else {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("ical2json={}", self.default_level)))
        };

        let span_events = if self.include_span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let dispatch = match self.output_format {
            TracingOutputFormat::Pretty => {
                let subscriber = tracing_subscriber::registry().with(env_filter).with(
                    fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr)
                        .with_file(self.include_location)
                        .with_line_number(self.include_location)
                        .with_target(self.include_target)
                        .with_span_events(span_events),
                );
                Dispatch::new(subscriber)
            }
            TracingOutputFormat::Compact => {
                let layer = fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_target(self.include_target)
                    .with_span_events(span_events);

                let layer = if self.include_timestamp {
                    layer.boxed()
                } else {
                    layer.without_time().boxed()
                };

                Dispatch::new(tracing_subscriber::registry().with(env_filter).with(layer))
            }
            TracingOutputFormat::Json => {
                let subscriber = tracing_subscriber::registry().with(env_filter).with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_file(self.include_location)
                        .with_line_number(self.include_location)
                        .with_target(self.include_target)
                        .with_span_events(span_events),
                );
                Dispatch::new(subscriber)
            }
        };

        Ok(dispatch)
    }
}

/// Initialize tracing with the given configuration.
///
/// This should be called once at the start of a binary.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set or if
/// the env filter directive is invalid.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let dispatch = config.dispatch()?;
    tracing::dispatcher::set_global_default(dispatch)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.default_level, Level::INFO);
        assert_eq!(config.output_format, TracingOutputFormat::Pretty);
        assert!(!config.include_location);
        assert!(config.include_target);
        assert!(config.include_timestamp);
        assert!(!config.include_span_events);
        assert!(config.env_filter.is_none());
    }

    #[test]
    fn test_cli_debug_config() {
        let config = TracingConfig::cli_debug();
        assert_eq!(config.default_level, Level::DEBUG);
        assert_eq!(config.output_format, TracingOutputFormat::Compact);
        assert!(config.include_location);
    }

    #[test]
    fn test_cli_config_is_quiet() {
        let config = TracingConfig::cli();
        assert_eq!(config.default_level, Level::WARN);
        assert!(!config.include_timestamp);
    }

    #[test]
    fn test_server_config() {
        let config = TracingConfig::server();
        assert_eq!(config.default_level, Level::INFO);
        assert_eq!(config.output_format, TracingOutputFormat::Json);
        assert!(config.include_span_events);
    }

    #[test]
    fn test_builder_methods() {
        let config = TracingConfig::default()
            .with_level(Level::WARN)
            .with_format(TracingOutputFormat::Json)
            .with_env_filter("ical2json=trace");

        assert_eq!(config.default_level, Level::WARN);
        assert_eq!(config.output_format, TracingOutputFormat::Json);
        assert_eq!(config.env_filter, Some("ical2json=trace".to_string()));
    }

    #[test]
    fn test_dispatch_can_be_scoped() {
        let dispatch = TracingConfig::cli_debug()
            .with_env_filter("ical2json=debug")
            .dispatch()
            .unwrap();
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::debug!("scoped log line");
        });
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let result = TracingConfig::default()
            .with_env_filter("ical2json=notalevel")
            .dispatch();
        assert!(matches!(result, Err(TracingError::EnvFilter(_))));
    }
}
