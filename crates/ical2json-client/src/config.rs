//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/ical2json/config.toml` by default:
//!
//! ```toml
//! [nextcloud]
//! base_url = "https://cloud.example.com"
//! user = "alice"
//! password = "pass::nextcloud/alice"
//! timeout = 10
//!
//! [output]
//! mode = "typed"
//! from_now = false
//! pretty = true
//! skip_invalid_events = false
//! ```
//!
//! The `password` value supports secret references:
//! - `pass::path/in/store` - resolved via `pass show`
//! - `env::VAR_NAME` - resolved from the environment
//! - plain text - used as-is
//!
//! Command-line flags take precedence over every value in the file.

use std::path::{Path, PathBuf};

use ical2json_core::OutputMode;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::secret;

/// Configuration for the ical2json client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Nextcloud connection settings.
    pub nextcloud: NextcloudSettings,

    /// Output settings.
    pub output: OutputSettings,
}

/// Nextcloud connection settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NextcloudSettings {
    /// Base URL of the Nextcloud instance.
    pub base_url: Option<String>,

    /// Username.
    pub user: Option<String>,

    /// Password or app token (supports `pass::` and `env::` prefixes).
    pub password: Option<String>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,
}

/// Output settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// JSON shape.
    pub mode: Option<OutputMode>,

    /// Only keep events starting now or later.
    pub from_now: bool,

    /// Pretty-print the JSON document.
    pub pretty: bool,

    /// Drop events lacking a UID or start instead of failing.
    pub skip_invalid_events: bool,
}

impl ClientConfig {
    /// Loads configuration from the default path.
    ///
    /// A missing file yields the default configuration.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read config {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ClientError::Config(format!("failed to parse config {}: {}", path.display(), e))
        })
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ical2json")
    }

    /// Returns a copy safe to print: literal passwords are masked, secret
    /// references are kept.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if let Some(ref mut password) = config.nextcloud.password {
            if !secret::is_reference(password) {
                *password = "<redacted>".to_string();
            }
        }
        config
    }
}

impl NextcloudSettings {
    /// Resolves the configured password, expanding secret references.
    pub fn resolve_password(&self) -> ClientResult<Option<String>> {
        self.password
            .as_deref()
            .map(secret::resolve)
            .transpose()
            .map_err(|e| ClientError::Config(format!("invalid password: {}", e)))
    }
}
