//! Nextcloud source configuration.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::{RetrievalError, RetrievalResult};

/// Configuration for the Nextcloud ICS export client.
#[derive(Clone)]
pub struct NextcloudConfig {
    /// Base URL of the Nextcloud instance (e.g. `https://cloud.example.com`).
    pub base_url: Url,

    /// Username, also the owner segment of the calendar path.
    pub username: String,

    /// Password or app token.
    pub password: String,

    /// Request timeout.
    pub timeout: Duration,

    /// Whether to verify TLS certificates.
    pub verify_tls: bool,

    /// Whether to honour the system proxy settings.
    pub use_proxy: bool,

    /// User agent string.
    pub user_agent: String,
}

impl NextcloudConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Creates a configuration for the given instance and account.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(
        base_url: impl AsRef<str>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(base_url.as_ref())?;
        Ok(Self {
            base_url: parsed,
            username: username.into(),
            password: password.into(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            verify_tls: true,
            use_proxy: true,
            user_agent: format!("ical2json/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Disables TLS verification (for testing only).
    pub fn with_insecure_tls(mut self) -> Self {
        self.verify_tls = false;
        self
    }

    /// Connects directly, ignoring `HTTP_PROXY` and friends.
    pub fn without_proxy(mut self) -> Self {
        self.use_proxy = false;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Builds the ICS export URL for a calendar:
    /// `{base_url}/remote.php/dav/calendars/{user}/{uri}?export&accept=ical`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty URI or a base URL that
    /// cannot carry a path (e.g. `mailto:`).
    pub fn calendar_url(&self, uri: &str) -> RetrievalResult<Url> {
        if uri.is_empty() {
            return Err(RetrievalError::configuration("calendar URI must not be empty"));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                RetrievalError::configuration(format!(
                    "base URL `{}` cannot be used as a base",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["remote.php", "dav", "calendars", self.username.as_str(), uri]);
        url.set_query(Some("export&accept=ical"));
        Ok(url)
    }
}

impl fmt::Debug for NextcloudConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NextcloudConfig")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("verify_tls", &self.verify_tls)
            .field("use_proxy", &self.use_proxy)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RetrievalErrorCode;

    #[test]
    fn config_creation() {
        let config = NextcloudConfig::new("https://cloud.example.com", "alice", "secret").unwrap();
        assert_eq!(config.username, "alice");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.verify_tls);
        assert!(config.use_proxy);
    }

    #[test]
    fn config_builder_methods() {
        let config = NextcloudConfig::new("https://cloud.example.com", "alice", "secret")
            .unwrap()
            .with_insecure_tls()
            .without_proxy()
            .with_timeout(Duration::from_secs(3))
            .with_user_agent("test-agent");

        assert!(!config.verify_tls);
        assert!(!config.use_proxy);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn calendar_url_targets_export() {
        let config = NextcloudConfig::new("https://cloud.example.com", "alice", "secret").unwrap();
        assert_eq!(
            config.calendar_url("personal").unwrap().as_str(),
            "https://cloud.example.com/remote.php/dav/calendars/alice/personal?export&accept=ical"
        );
    }

    #[test]
    fn calendar_url_keeps_base_path() {
        let config = NextcloudConfig::new("https://example.com/nextcloud/", "bob", "pw").unwrap();
        assert_eq!(
            config.calendar_url("work").unwrap().as_str(),
            "https://example.com/nextcloud/remote.php/dav/calendars/bob/work?export&accept=ical"
        );
    }

    #[test]
    fn calendar_url_escapes_segments() {
        let config = NextcloudConfig::new("https://cloud.example.com", "alice", "pw").unwrap();
        let url = config.calendar_url("a/b c").unwrap();
        assert_eq!(url.path(), "/remote.php/dav/calendars/alice/a%2Fb%20c");
    }

    #[test]
    fn empty_uri_is_rejected() {
        let config = NextcloudConfig::new("https://cloud.example.com", "alice", "pw").unwrap();
        let err = config.calendar_url("").unwrap_err();
        assert_eq!(err.code(), RetrievalErrorCode::ConfigurationError);
    }

    #[test]
    fn debug_redacts_password() {
        let config = NextcloudConfig::new("https://cloud.example.com", "alice", "hunter2").unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn invalid_url_returns_error() {
        assert!(NextcloudConfig::new("not a valid url", "a", "b").is_err());
    }
}
