//! Builder for [`MessageRelay`](crate::client::MessageRelay).

use std::time::Duration;

use crate::client::MessageRelay;
use crate::config::RelayConfig;
use crate::error::A2uiResult;

/// Builder for a [`MessageRelay`].
///
/// # Example
///
/// ```no_run
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use a2ui_client::builders::RelayBuilder;
/// use std::time::Duration;
///
/// let relay = RelayBuilder::new("http://localhost:10002")
///     .with_timeout(Duration::from_secs(30))
///     .with_bearer_token("secret")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RelayBuilder {
    config: RelayConfig,
}

impl RelayBuilder {
    /// Create a new builder for the agent at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: RelayConfig::new(base_url),
        }
    }

    /// Start from an existing configuration.
    pub fn from_config(config: RelayConfig) -> Self {
        Self { config }
    }

    /// Set the discovery / connect timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add a static HTTP header sent on every request.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(key.into(), value.into());
        self
    }

    /// Add an Authorization header with a bearer token.
    pub fn with_bearer_token(self, token: impl Into<String>) -> Self {
        self.with_header("Authorization", format!("Bearer {}", token.into()))
    }

    /// Fetch the agent card from a custom path instead of the well-known one.
    pub fn with_card_path(mut self, path: impl Into<String>) -> Self {
        self.config.card_path = Some(path.into());
        self
    }

    /// Advertise an additional protocol extension.
    pub fn with_extension(mut self, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        if !self.config.extensions.contains(&uri) {
            self.config.extensions.push(uri);
        }
        self
    }

    /// Set the capacity of the `streaming-event` channel.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// The configuration built so far.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Validate the configuration and create the relay.
    ///
    /// No network I/O happens here; discovery runs on the first send.
    pub fn build(self) -> A2uiResult<MessageRelay> {
        MessageRelay::new(self.config)
    }
}
