//! Agent card discovery.
//!
//! Fetches the discovery document from the well-known URI of an agent and
//! picks the JSON-RPC endpoint the relay streams against.

use std::time::Duration;

use crate::constants::{AGENT_CARD_WELL_KNOWN_PATH, PREV_AGENT_CARD_WELL_KNOWN_PATH};
use crate::error::{A2uiError, A2uiResult};
use crate::types::AgentCard;

/// Resolves [`AgentCard`]s from agent base URLs.
///
/// # Example
///
/// ```no_run
/// use a2ui_client::client::CardResolver;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = CardResolver::new(reqwest::Client::new());
/// let card = resolver.resolve("http://localhost:10002").await?;
/// println!("Agent: {} v{}", card.name, card.version);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CardResolver {
    client: reqwest::Client,
    card_path: Option<String>,
    timeout: Option<Duration>,
}

impl CardResolver {
    /// Create a resolver on top of an existing `reqwest::Client`.
    ///
    /// Default headers on the client (including `X-A2A-Extensions`) are sent
    /// with the discovery request.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            card_path: None,
            timeout: None,
        }
    }

    /// Override the agent card path. A custom path never falls back.
    pub fn with_card_path(mut self, path: impl Into<String>) -> Self {
        self.card_path = Some(path.into());
        self
    }

    /// Bound the whole discovery request (connect + body).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fetch and parse the agent card from the given base URL.
    ///
    /// With the default path, `/.well-known/agent-card.json` is tried first
    /// and `/.well-known/agent.json` only when the first answers 404.
    ///
    /// # Errors
    ///
    /// [`A2uiError::Transport`] / [`A2uiError::Timeout`] on network failures,
    /// [`A2uiError::Http`] on non-2xx responses and [`A2uiError::InvalidJson`]
    /// when the document does not parse.
    pub async fn resolve(&self, base_url: &str) -> A2uiResult<AgentCard> {
        let base = base_url.trim_end_matches('/');

        if let Some(path) = self.card_path.as_deref() {
            return self.fetch_card(base, path).await;
        }

        match self.fetch_card(base, AGENT_CARD_WELL_KNOWN_PATH).await {
            Err(A2uiError::Http { status: 404, .. }) => {
                tracing::warn!(
                    "agent card not found at {}{}, trying legacy path {}",
                    base,
                    AGENT_CARD_WELL_KNOWN_PATH,
                    PREV_AGENT_CARD_WELL_KNOWN_PATH,
                );
                self.fetch_card(base, PREV_AGENT_CARD_WELL_KNOWN_PATH).await
            }
            other => other,
        }
    }

    async fn fetch_card(&self, base: &str, path: &str) -> A2uiResult<AgentCard> {
        let url = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };

        tracing::debug!("resolving agent card from {}", url);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/json");
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| A2uiError::from_reqwest(e, &format!("fetching agent card from {url}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(A2uiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| A2uiError::from_reqwest(e, "reading agent card"))?;

        let card: AgentCard = serde_json::from_slice(&bytes)
            .map_err(|e| A2uiError::InvalidJson(format!("failed to parse agent card: {e}")))?;

        tracing::debug!("resolved agent card: {} v{}", card.name, card.version);

        Ok(card)
    }

    /// The JSON-RPC endpoint an agent card points at.
    ///
    /// The first `supportedInterfaces` entry with transport `JSONRPC`
    /// (case-insensitive) wins; otherwise the card's top-level `url`.
    pub fn endpoint_url(card: &AgentCard) -> Option<String> {
        card.supported_interfaces
            .iter()
            .find(|iface| iface.transport.eq_ignore_ascii_case("JSONRPC"))
            .map(|iface| iface.url.clone())
            .or_else(|| {
                let url = card.url.trim();
                (!url.is_empty()).then(|| url.to_string())
            })
    }
}
