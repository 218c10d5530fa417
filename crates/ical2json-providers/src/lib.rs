//! Calendar retrieval.
//!
//! This crate provides the abstraction layer for fetching raw ICS text:
//!
//! - [`CalendarSource`] - The trait every calendar backend implements
//! - [`NextcloudClient`] - Authenticated ICS export from a Nextcloud server
//! - [`StaticSource`] / [`ErrorSource`] - In-memory sources for tests and fallbacks
//! - [`RetrievalError`] - Error types for retrieval operations
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐
//! │ Nextcloud (DAV) │    │   in-memory     │
//! └────────┬────────┘    └────────┬────────┘
//!          │                      │
//!          ▼                      ▼
//! ┌─────────────────┐    ┌─────────────────┐
//! │ NextcloudClient │    │  StaticSource   │
//! └────────┬────────┘    └────────┬────────┘
//!          │                      │
//!          │    CalendarSource    │
//!          └──────────┬───────────┘
//!                     │
//!                     ▼ fetch_ics()
//!              ┌─────────────┐
//!              │  ICS text   │
//!              └─────────────┘
//! ```

pub mod error;
#[cfg(feature = "nextcloud")]
pub mod nextcloud;
pub mod source;

pub use error::{RetrievalError, RetrievalErrorCode, RetrievalResult};
#[cfg(feature = "nextcloud")]
pub use nextcloud::{NextcloudClient, NextcloudConfig};
pub use source::{BoxFuture, CalendarSource, ErrorSource, StaticSource};
