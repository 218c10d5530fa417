//! Nextcloud calendar source.
//!
//! Nextcloud publishes every calendar as a single ICS document at
//! `remote.php/dav/calendars/{user}/{uri}?export&accept=ical`; this module
//! fetches it with HTTP Basic authentication.
//!
//! # Example
//!
//! ```ignore
//! use ical2json_providers::nextcloud::{NextcloudClient, NextcloudConfig};
//!
//! let config = NextcloudConfig::new("https://cloud.example.com", "alice", "app-token")?;
//! let client = NextcloudClient::new(config)?;
//! let ics = client.fetch_calendar("personal").await?;
//! ```

mod auth;
mod client;
mod config;

pub use auth::basic_auth;
pub use client::NextcloudClient;
pub use config::NextcloudConfig;
