//! The default command: fetch (or read) a calendar and print it as JSON.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use ical2json_core::{Calendar, ConvertOptions, Converter, InvalidEventPolicy};
use ical2json_providers::{NextcloudClient, NextcloudConfig};
use tracing::debug;

use crate::cli::Cli;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::secret;

/// Where the raw ICS text comes from.
#[derive(Debug, Clone)]
pub enum Input {
    /// A local ICS file.
    File(PathBuf),
    /// A calendar exported by a Nextcloud server.
    Nextcloud { config: NextcloudConfig, uri: String },
}

/// A fully resolved conversion request.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub input: Input,
    pub options: ConvertOptions,
    pub from_now: bool,
    pub pretty: bool,
}

impl ConvertRequest {
    /// Merges command-line flags over the configuration file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when neither `--input` nor `--uri` is
    /// given, or when a Nextcloud setting is missing or invalid.
    pub fn resolve(cli: &Cli, config: &ClientConfig) -> ClientResult<Self> {
        let input = match (&cli.input, &cli.uri) {
            (Some(path), _) => Input::File(path.clone()),
            (None, Some(uri)) => Input::Nextcloud {
                config: nextcloud_config(cli, config)?,
                uri: uri.clone(),
            },
            (None, None) => {
                return Err(ClientError::Config(
                    "no calendar given: pass --uri <URI> or --input <FILE>".to_string(),
                ));
            }
        };

        let output_mode = cli.output_mode.or(config.output.mode).unwrap_or_default();
        let invalid_events = if cli.skip_invalid_events || config.output.skip_invalid_events {
            InvalidEventPolicy::Skip
        } else {
            InvalidEventPolicy::Fail
        };
        let options = ConvertOptions::default()
            .with_output_mode(output_mode)
            .with_invalid_events(invalid_events);

        Ok(Self {
            input,
            options,
            from_now: cli.from_now || config.output.from_now,
            pretty: cli.pretty || config.output.pretty,
        })
    }
}

fn nextcloud_config(cli: &Cli, config: &ClientConfig) -> ClientResult<NextcloudConfig> {
    let settings = &config.nextcloud;
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| settings.base_url.clone())
        .ok_or_else(|| missing("base URL", "--base-url", "NEXTCLOUD_URL", "base_url"))?;
    let user = cli
        .user
        .clone()
        .or_else(|| settings.user.clone())
        .ok_or_else(|| missing("user", "--user", "NEXTCLOUD_USER", "user"))?;
    let password = match cli.password.as_deref() {
        Some(password) => secret::resolve(password)
            .map_err(|e| ClientError::Config(format!("invalid password: {}", e)))?,
        None => settings
            .resolve_password()?
            .ok_or_else(|| missing("password", "--password", "NEXTCLOUD_PASSWORD", "password"))?,
    };

    let timeout = cli
        .timeout
        .or(settings.timeout)
        .unwrap_or(NextcloudConfig::DEFAULT_TIMEOUT_SECS);
    if timeout == 0 {
        return Err(ClientError::Config("timeout must be at least 1 second".to_string()));
    }

    let nextcloud = NextcloudConfig::new(&base_url, user, password)
        .map_err(|e| ClientError::Config(format!("invalid base URL `{}`: {}", base_url, e)))?
        .with_timeout(Duration::from_secs(timeout));
    Ok(nextcloud)
}

fn missing(what: &str, flag: &str, env: &str, key: &str) -> ClientError {
    ClientError::Config(format!(
        "missing Nextcloud {what}: pass {flag}, set {env} or [nextcloud] {key} in the config file"
    ))
}

/// Runs a conversion and returns the JSON document.
pub async fn run(request: &ConvertRequest) -> ClientResult<String> {
    let text = match &request.input {
        Input::File(path) => {
            debug!(path = %path.display(), "reading local ICS file");
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ClientError::Input(format!("cannot read {}: {}", path.display(), e)))?
        }
        Input::Nextcloud { config, uri } => {
            let client = NextcloudClient::new(config.clone())?;
            client.fetch_calendar(uri).await?
        }
    };

    let mut calendar = Converter::new(request.options).convert(&text)?;
    if request.from_now {
        calendar = calendar.from_now(Utc::now());
    }
    render(&calendar, request.pretty)
}

/// Serializes a calendar, compact or pretty.
pub fn render(calendar: &Calendar, pretty: bool) -> ClientResult<String> {
    let json = if pretty {
        serde_json::to_string_pretty(calendar)?
    } else {
        serde_json::to_string(calendar)?
    };
    Ok(json)
}
