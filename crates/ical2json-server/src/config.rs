//! Server configuration.
//!
//! Every setting can come from a flag or an environment variable, so the
//! server runs unchanged under a process manager or in a container.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use ical2json_core::{ConvertOptions, InvalidEventPolicy, OutputMode};
use ical2json_providers::NextcloudConfig;

use crate::error::{ServerError, ServerResult};

/// Command-line arguments of `ical2json-server`.
#[derive(Debug, Parser)]
#[command(
    name = "ical2json-server",
    version,
    about = "Serve Nextcloud calendars as normalized JSON"
)]
pub struct ServerArgs {
    /// Address to listen on.
    #[arg(long, env = "ICAL2JSON_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Nextcloud base URL.
    #[arg(short = 'b', long, env = "NEXTCLOUD_URL")]
    pub base_url: String,

    /// Nextcloud user the calendars belong to.
    #[arg(short = 'u', long, env = "NEXTCLOUD_USER")]
    pub user: String,

    /// Password or app token for the user.
    #[arg(short = 'p', long, env = "NEXTCLOUD_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Default JSON shape (typed or extras); `?mode=` overrides it per request.
    #[arg(long, env = "ICAL2JSON_OUTPUT_MODE", default_value_t = OutputMode::Typed)]
    pub output_mode: OutputMode,

    /// Drop events lacking a UID or start instead of failing the request.
    #[arg(long)]
    pub skip_invalid_events: bool,

    /// Upstream request timeout, in seconds.
    #[arg(long, default_value_t = NextcloudConfig::DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Enable debug logging.
    #[arg(short = 'v', long)]
    pub debug: bool,
}

impl ServerArgs {
    /// Validates the arguments into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unparseable base URL or a zero
    /// timeout.
    pub fn into_config(self) -> ServerResult<ServerConfig> {
        if self.timeout == 0 {
            return Err(ServerError::config("--timeout must be at least 1 second"));
        }

        let nextcloud = NextcloudConfig::new(&self.base_url, self.user, self.password)
            .map_err(|e| ServerError::config(format!("invalid base URL `{}`: {}", self.base_url, e)))?
            .with_timeout(Duration::from_secs(self.timeout));

        let invalid_events = if self.skip_invalid_events {
            InvalidEventPolicy::Skip
        } else {
            InvalidEventPolicy::Fail
        };
        let convert = ConvertOptions::default()
            .with_output_mode(self.output_mode)
            .with_invalid_events(invalid_events);

        Ok(ServerConfig {
            bind: self.bind,
            nextcloud,
            convert,
        })
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: SocketAddr,

    /// Upstream Nextcloud settings.
    pub nextcloud: NextcloudConfig,

    /// Default conversion options.
    pub convert: ConvertOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> ServerArgs {
        let mut args = vec![
            "ical2json-server",
            "--bind",
            "127.0.0.1:8000",
            "--base-url",
            "https://cloud.example.com",
            "--user",
            "alice",
            "--password",
            "secret",
        ];
        args.extend_from_slice(extra);
        ServerArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&[]).into_config().unwrap();
        assert_eq!(config.bind, "127.0.0.1:8000".parse().unwrap());
        assert_eq!(config.nextcloud.username, "alice");
        assert_eq!(config.nextcloud.timeout, Duration::from_secs(10));
        assert_eq!(config.convert, ConvertOptions::default());
    }

    #[test]
    fn flags_map_to_options() {
        let config = parse(&["--output-mode", "extras", "--skip-invalid-events", "--timeout", "3"])
            .into_config()
            .unwrap();
        assert_eq!(config.convert.output_mode, OutputMode::Extras);
        assert_eq!(config.convert.invalid_events, InvalidEventPolicy::Skip);
        assert_eq!(config.nextcloud.timeout, Duration::from_secs(3));
    }

    #[test]
    fn invalid_output_mode_is_rejected() {
        let result = ServerArgs::try_parse_from([
            "ical2json-server",
            "--base-url",
            "https://cloud.example.com",
            "--user",
            "alice",
            "--password",
            "secret",
            "--output-mode",
            "yaml",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let mut args = parse(&[]);
        args.base_url = "not a url".to_string();
        assert!(matches!(args.into_config(), Err(ServerError::Config { .. })));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut args = parse(&[]);
        args.timeout = 0;
        assert!(args.into_config().is_err());
    }
}
