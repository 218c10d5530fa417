//! CLI, configuration file handling, conversion commands
//!
//! This crate provides the `ical2json` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use commands::convert::{ConvertRequest, Input};
pub use error::{ClientError, ClientResult};
