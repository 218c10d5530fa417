//! HTTP client for the Nextcloud ICS export.
//!
//! One authenticated GET per calendar, bounded by the configured timeout.

use reqwest::{Client, Response, StatusCode, header};
use tracing::{debug, trace, warn};

use crate::error::{RetrievalError, RetrievalResult};
use crate::source::{BoxFuture, CalendarSource};

use super::auth::basic_auth;
use super::config::NextcloudConfig;

const SOURCE_NAME: &str = "nextcloud";

/// Fetches raw ICS exports from a Nextcloud instance.
#[derive(Debug)]
pub struct NextcloudClient {
    client: Client,
    config: NextcloudConfig,
}

impl NextcloudClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a network error if the HTTP client cannot be built.
    pub fn new(config: NextcloudConfig) -> RetrievalResult<Self> {
        let mut builder = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .user_agent(&config.user_agent);
        if !config.use_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(|e| {
            RetrievalError::network(format!("failed to create HTTP client: {}", e))
                .with_source_name(SOURCE_NAME)
                .with_source(e)
        })?;

        Ok(Self { client, config })
    }

    /// Fetches the ICS export of calendar `uri`.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError`] for transport failures, timeouts and any
    /// non-success status.
    pub async fn fetch_calendar(&self, uri: &str) -> RetrievalResult<String> {
        let url = self.config.calendar_url(uri)?;
        debug!(uri = %uri, user = %self.config.username, "fetching calendar export");
        trace!(url = %url, "Sending request");

        let response = self
            .client
            .get(url)
            .header(
                header::AUTHORIZATION,
                basic_auth(&self.config.username, &self.config.password),
            )
            .header(header::ACCEPT, "text/calendar")
            .send()
            .await
            .map_err(|e| self.transport_error("request failed", e))?;

        let body = self.handle_response(response).await?;
        debug!(uri = %uri, bytes = body.len(), "calendar export received");
        Ok(body)
    }

    /// Handles the HTTP response and extracts the body.
    async fn handle_response(&self, response: Response) -> RetrievalResult<String> {
        let status = response.status();
        trace!(status = %status, "Received response");

        let result = match status {
            s if s.is_success() => {
                return response
                    .text()
                    .await
                    .map_err(|e| self.transport_error("failed to read response", e));
            }
            StatusCode::UNAUTHORIZED => Err(RetrievalError::authentication(
                "authentication failed: invalid credentials",
            )),
            StatusCode::FORBIDDEN => {
                Err(RetrievalError::authorization("access denied to calendar"))
            }
            StatusCode::NOT_FOUND => Err(RetrievalError::not_found("calendar not found")),
            StatusCode::TOO_MANY_REQUESTS => {
                Err(RetrievalError::rate_limited("too many requests to server"))
            }
            s if s.is_server_error() => {
                let body = response.text().await.unwrap_or_default();
                Err(RetrievalError::server(format!("server error ({}): {}", s, body)))
            }
            s => {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %s, body = %body, "Unexpected response status");
                Err(RetrievalError::invalid_response(format!(
                    "unexpected status {}: {}",
                    s, body
                )))
            }
        };

        result.map_err(|e| e.with_source_name(SOURCE_NAME))
    }

    fn transport_error(&self, context: &str, err: reqwest::Error) -> RetrievalError {
        let error = if err.is_timeout() {
            RetrievalError::timeout(format!(
                "{context}: no response within {}s",
                self.config.timeout.as_secs_f32()
            ))
        } else {
            RetrievalError::network(format!("{context}: {err}"))
        };
        error.with_source_name(SOURCE_NAME).with_source(err)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &NextcloudConfig {
        &self.config
    }
}

impl CalendarSource for NextcloudClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn fetch_ics<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, RetrievalResult<String>> {
        Box::pin(self.fetch_calendar(uri))
    }
}
