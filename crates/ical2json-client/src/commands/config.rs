//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the configuration loaded from `path` to stdout, with literal
/// passwords masked.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    println!("{}", render_dump(config, path)?);
    Ok(())
}

fn render_dump(config: &ClientConfig, path: &Path) -> ClientResult<String> {
    let toml_str = toml::to_string_pretty(&config.redacted())
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    Ok(format!("# config.toml ({})\n{}", path.display(), toml_str))
}

/// Validate the configuration.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    if let Some(ref base_url) = config.nextcloud.base_url {
        url_check(base_url)?;
    }

    if config.nextcloud.timeout == Some(0) {
        return Err(ClientError::Config(
            "nextcloud.timeout must be at least 1 second".to_string(),
        ));
    }

    if config.nextcloud.resolve_password()?.is_some() {
        println!("Nextcloud password resolves.");
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path() -> ClientResult<()> {
    let config_path = ClientConfig::default_path();
    println!("config: {}", config_path.display());
    Ok(())
}

fn url_check(base_url: &str) -> ClientResult<()> {
    ical2json_providers::NextcloudConfig::new(base_url, "", "")
        .map(|_| ())
        .map_err(|e| ClientError::Config(format!("invalid nextcloud.base_url `{}`: {}", base_url, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_names_the_loaded_file() {
        let mut config = ClientConfig::default();
        config.nextcloud.password = Some("hunter2".into());
        let path = Path::new("/tmp/custom/ical2json.toml");

        let out = render_dump(&config, path).unwrap();
        assert!(out.starts_with("# config.toml (/tmp/custom/ical2json.toml)\n"));
        assert!(!out.contains("hunter2"));
    }

    #[test]
    fn validate_accepts_empty_config() {
        assert!(validate(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn validate_rejects_bad_url() {
        let mut config = ClientConfig::default();
        config.nextcloud.base_url = Some("not a url".into());
        assert!(matches!(validate(&config), Err(ClientError::Config(_))));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = ClientConfig::default();
        config.nextcloud.timeout = Some(0);
        assert!(validate(&config).is_err());
    }
}
