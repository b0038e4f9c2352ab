use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::DocumentLoader;
use crate::error::LoadError;
use crate::format::Format;

/// Fetches `http://` and `https://` locators with a blocking client.
///
/// The body is parsed as JSON when the response says so or the locator ends
/// in `.json`, as YAML otherwise. Non-success statuses are errors; there is
/// no retry.
#[derive(Debug, Clone, Default)]
pub struct HttpLoader {
    client: Client,
}

impl HttpLoader {
    /// Creates a loader with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client (proxies, headers, TLS...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Creates a loader whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Fails if the underlying client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl DocumentLoader for HttpLoader {
    fn load(&self, locator: &Url) -> Result<Value, LoadError> {
        let http_error = |source| LoadError::Http {
            locator: locator.clone(),
            source,
        };

        debug!(%locator, "fetching document");
        let response = self
            .client
            .get(locator.clone())
            .send()
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                locator: locator.clone(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let text = response.text().map_err(http_error)?;

        Format::from_content_type(content_type.as_deref(), locator).parse(locator, &text)
    }
}
