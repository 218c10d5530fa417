//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ical2json_core::OutputMode;

/// ical2json - Nextcloud calendars as normalized JSON
#[derive(Debug, Parser)]
#[command(name = "ical2json")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, env = "ICAL2JSON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    // --- Source flags ---
    /// Nextcloud base URL
    #[arg(long, short = 'b', env = "NEXTCLOUD_URL")]
    pub base_url: Option<String>,

    /// URI of the calendar to convert
    #[arg(long, short = 'c', conflicts_with = "input")]
    pub uri: Option<String>,

    /// Nextcloud user from whom to pull the calendar
    #[arg(long, short = 'u', env = "NEXTCLOUD_USER")]
    pub user: Option<String>,

    /// Password for the user (supports `pass::` and `env::` references)
    #[arg(long, short = 'p', env = "NEXTCLOUD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Convert a local ICS file instead of fetching from Nextcloud
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    // --- Output flags ---
    /// JSON shape: typed (name/color/events) or extras (every X- property)
    #[arg(long)]
    pub output_mode: Option<OutputMode>,

    /// Only keep events starting now or later
    #[arg(long)]
    pub from_now: bool,

    /// Drop events lacking a UID or start instead of failing
    #[arg(long)]
    pub skip_invalid_events: bool,

    /// Pretty-print the JSON document
    #[arg(long)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
///
/// Without a command, the calendar is converted and printed.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
