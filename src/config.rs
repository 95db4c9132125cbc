//! Relay configuration.
//!
//! The agent base URL is required; there is no fallback endpoint. Everything
//! else has a default.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::constants::{A2UI_EXTENSION_URI, HTTP_EXTENSION_HEADER};
use crate::error::{A2uiError, A2uiResult};

/// Default timeout for discovery and for connecting the stream.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default capacity of the `streaming-event` broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Configuration for a [`MessageRelay`](crate::client::MessageRelay).
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    /// Base URL of the agent, e.g. `http://localhost:10002`.
    pub base_url: String,
    /// Override for the discovery path. `None` uses
    /// `/.well-known/agent-card.json` with the legacy fallback.
    pub card_path: Option<String>,
    /// Timeout for the discovery fetch and for connecting the stream.
    /// An open stream is never timed out.
    pub timeout: Duration,
    /// Static headers sent on every request.
    pub headers: HashMap<String, String>,
    /// Extension URIs advertised in `X-A2A-Extensions`.
    pub extensions: Vec<String>,
    /// Capacity of the `streaming-event` broadcast channel. Subscribers that
    /// fall further behind than this miss the oldest events.
    pub event_capacity: usize,
}

impl RelayConfig {
    /// Configuration for the given base URL with every other value defaulted.
    ///
    /// The A2UI v0.8 extension is advertised by default.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            card_path: None,
            timeout: DEFAULT_TIMEOUT,
            headers: HashMap::new(),
            extensions: vec![A2UI_EXTENSION_URI.to_string()],
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Check the configuration without touching the network.
    pub fn validate(&self) -> A2uiResult<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(A2uiError::Config("base URL is required".to_string()));
        }

        let url = reqwest::Url::parse(base)
            .map_err(|e| A2uiError::Config(format!("invalid base URL '{base}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(A2uiError::Config(format!(
                "base URL '{base}' must use http or https"
            )));
        }

        if self.event_capacity == 0 {
            return Err(A2uiError::Config(
                "event capacity must be greater than 0".to_string(),
            ));
        }

        self.header_map()?;
        Ok(())
    }

    /// Base URL without trailing slashes.
    pub(crate) fn normalized_base_url(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }

    /// Value of the `X-A2A-Extensions` header, if any extensions are set.
    pub(crate) fn extension_header_value(&self) -> Option<String> {
        if self.extensions.is_empty() {
            None
        } else {
            Some(self.extensions.join(","))
        }
    }

    /// Default headers for every outgoing request.
    pub(crate) fn header_map(&self) -> A2uiResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (key, value) in &self.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| A2uiError::Config(format!("invalid header name '{key}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| A2uiError::Config(format!("invalid value for header '{key}': {e}")))?;
            headers.insert(name, value);
        }

        if let Some(extensions) = self.extension_header_value() {
            let value = HeaderValue::from_str(&extensions)
                .map_err(|e| A2uiError::Config(format!("invalid extension URI list: {e}")))?;
            let name = HeaderName::from_bytes(HTTP_EXTENSION_HEADER.as_bytes())
                .map_err(|e| A2uiError::Config(format!("invalid extension header: {e}")))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }

    /// Build the shared HTTP client.
    ///
    /// Only the connect phase is bounded by `timeout` here; the discovery
    /// request adds its own total timeout, the stream gets none.
    pub(crate) fn http_client(&self) -> A2uiResult<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(self.timeout)
            .default_headers(self.header_map()?)
            .build()
            .map_err(|e| A2uiError::Config(format!("failed to build HTTP client: {e}")))
    }
}
