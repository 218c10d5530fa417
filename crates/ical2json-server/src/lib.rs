//! HTTP API: Nextcloud calendars as normalized JSON.
//!
//! This crate provides the `ical2json-server` HTTP boundary:
//! - axum routes fetching a calendar through a [`CalendarSource`] and
//!   converting it with [`ical2json_core::Converter`]
//! - mapping of retrieval and conversion failures to HTTP statuses
//! - graceful shutdown on SIGTERM/SIGINT
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ical2json_core::ConvertOptions;
//! use ical2json_providers::StaticSource;
//! use ical2json_server::{AppState, router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = AppState::new(Arc::new(StaticSource::new()), ConvertOptions::default());
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, router(state)).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod routes;
mod signals;
mod state;

use std::sync::Arc;

use ical2json_providers::CalendarSource;
use tokio::net::TcpListener;
use tracing::info;

pub use config::{ServerArgs, ServerConfig};
pub use error::{ApiError, ErrorResponse, ServerError, ServerResult};
pub use routes::{CalendarQuery, router};
pub use signals::{ShutdownSignal, SignalHandler};
pub use state::AppState;

/// Binds `config.bind` and serves calendars from `source` until SIGTERM or
/// SIGINT.
///
/// # Errors
///
/// Returns an IO error if the address cannot be bound or the server fails.
pub async fn serve(config: ServerConfig, source: Arc<dyn CalendarSource>) -> ServerResult<()> {
    let state = AppState::new(source, config.convert);
    let app = router(state);

    let listener = TcpListener::bind(config.bind).await?;
    info!(
        addr = %listener.local_addr()?,
        upstream = %config.nextcloud.base_url,
        mode = %config.convert.output_mode,
        "ical2json-server listening"
    );

    let signals = SignalHandler::new();
    signals.spawn_listener();
    axum::serve(listener, app)
        .with_graceful_shutdown(signals.shutdown().wait())
        .await?;

    info!("server stopped");
    Ok(())
}
