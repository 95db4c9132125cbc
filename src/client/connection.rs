//! Lazy, single-flight connection to the remote agent.
//!
//! The first caller of [`ConnectionManager::acquire`] resolves the agent card
//! and builds the [`Connection`]; callers arriving while that is in flight
//! wait for the same discovery instead of starting their own. A failed
//! discovery leaves the manager uninitialized so a later call can try again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::RelayConfig;
use crate::constants::MESSAGE_STREAM_METHOD;
use crate::error::{A2uiError, A2uiResult};
use crate::types::{AgentCard, JsonRpcRequest, SendMessageParams};

use super::card_resolver::CardResolver;
use super::sse::SseStream;
use super::transport::{JsonRpcTransport, Transport};

/// An established link to one agent: its card plus a transport to its
/// JSON-RPC endpoint.
pub struct Connection {
    card: AgentCard,
    endpoint: String,
    transport: Box<dyn Transport>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("agent", &self.card.name)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Assemble a connection from its parts.
    pub fn new(card: AgentCard, endpoint: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self {
            card,
            endpoint: endpoint.into(),
            transport,
        }
    }

    /// Build an HTTP connection for a resolved card.
    ///
    /// # Errors
    ///
    /// [`A2uiError::Discovery`] when the card names no usable endpoint.
    pub fn from_card(card: AgentCard, client: reqwest::Client) -> A2uiResult<Self> {
        let endpoint = CardResolver::endpoint_url(&card).ok_or_else(|| {
            A2uiError::Discovery(format!(
                "agent card for '{}' has neither a JSONRPC interface nor a url",
                card.name
            ))
        })?;
        let transport = JsonRpcTransport::new(endpoint.clone(), client);
        Ok(Self::new(card, endpoint, Box::new(transport)))
    }

    /// The agent card this connection was built from.
    pub fn card(&self) -> &AgentCard {
        &self.card
    }

    /// The JSON-RPC endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Open a `message/stream` call.
    ///
    /// Refused locally when the card explicitly says `streaming: false`.
    pub async fn stream_message(&self, params: &SendMessageParams) -> A2uiResult<SseStream> {
        if self.card.capabilities.streaming == Some(false) {
            return Err(A2uiError::StreamingNotSupported(format!(
                "agent '{}' does not advertise streaming",
                self.card.name
            )));
        }

        let request = JsonRpcRequest::new(MESSAGE_STREAM_METHOD, serde_json::to_value(params)?);
        self.transport.send_stream(&request).await
    }
}

/// Observable initialization state of a [`ConnectionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No connection yet and no discovery running.
    Uninitialized,
    /// A discovery is in flight.
    Initializing,
    /// The connection is established and memoized.
    Ready,
}

/// Owns the one connection of a relay.
pub struct ConnectionManager {
    /// `None` when the manager was handed a ready connection.
    discovery: Option<Discovery>,
    cell: OnceCell<Arc<Connection>>,
    initializing: AtomicBool,
}

/// What the manager needs to find the agent on first use.
struct Discovery {
    base_url: String,
    resolver: CardResolver,
    client: reqwest::Client,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("base_url", &self.discovery.as_ref().map(|d| &d.base_url))
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Create a manager for the configured agent. Does no I/O.
    pub fn new(config: &RelayConfig) -> A2uiResult<Self> {
        config.validate()?;

        let client = config.http_client()?;
        let mut resolver = CardResolver::new(client.clone()).with_timeout(config.timeout);
        if let Some(path) = &config.card_path {
            resolver = resolver.with_card_path(path.clone());
        }

        Ok(Self {
            discovery: Some(Discovery {
                base_url: config.normalized_base_url().to_string(),
                resolver,
                client,
            }),
            cell: OnceCell::new(),
            initializing: AtomicBool::new(false),
        })
    }

    /// A manager that is already [`Ready`](ConnectionState::Ready) with the
    /// given connection. Discovery never runs.
    pub fn with_connection(connection: Connection) -> Self {
        Self {
            discovery: None,
            cell: OnceCell::new_with(Some(Arc::new(connection))),
            initializing: AtomicBool::new(false),
        }
    }

    /// Current initialization state.
    pub fn state(&self) -> ConnectionState {
        if self.cell.initialized() {
            ConnectionState::Ready
        } else if self.initializing.load(Ordering::Acquire) {
            ConnectionState::Initializing
        } else {
            ConnectionState::Uninitialized
        }
    }

    /// The memoized connection, if discovery already succeeded.
    pub fn get(&self) -> Option<Arc<Connection>> {
        self.cell.get().cloned()
    }

    /// Return the connection, discovering it on first use.
    ///
    /// # Errors
    ///
    /// Whatever discovery failed with; see [`CardResolver::resolve`] and
    /// [`Connection::from_card`].
    pub async fn acquire(&self) -> A2uiResult<Arc<Connection>> {
        let connection = self.cell.get_or_try_init(|| self.connect()).await?;
        Ok(Arc::clone(connection))
    }

    async fn connect(&self) -> A2uiResult<Arc<Connection>> {
        let discovery = self.discovery.as_ref().ok_or_else(|| {
            A2uiError::Discovery("no base URL to discover the agent from".to_string())
        })?;
        let _guard = InitializingGuard::enter(&self.initializing);

        debug!(base_url = %discovery.base_url, "discovering agent");
        let card = discovery.resolver.resolve(&discovery.base_url).await?;
        let connection = Connection::from_card(card, discovery.client.clone())?;

        info!(
            agent = %connection.card.name,
            endpoint = %connection.endpoint,
            "agent connection ready"
        );
        Ok(Arc::new(connection))
    }
}

/// Holds the `Initializing` flag for the lifetime of one discovery,
/// including when the discovering future is dropped.
struct InitializingGuard<'a>(&'a AtomicBool);

impl<'a> InitializingGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for InitializingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
