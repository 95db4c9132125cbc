//! # a2ui-client: streaming A2A relay for A2UI interfaces
//!
//! Talks to a remote agent over the [A2A protocol](https://a2a-protocol.org/)
//! and collects the server-driven UI messages
//! ([A2UI](https://a2ui.org/)) it streams back.
//!
//! ## Overview
//!
//! A [`client::MessageRelay`]:
//! - discovers the agent once, lazily, from
//!   `{base_url}/.well-known/agent-card.json`
//! - advertises the A2UI extension (`X-A2A-Extensions`) on every request
//! - sends one user message per call over `message/stream`
//! - republishes every received event as a `streaming-event` notification
//! - returns the `data` parts of status updates as [`ServerToClientMessage`]s
//!
//! Rendering those messages is up to the caller.
//!
//! ## Feature flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `client` | yes     | HTTP relay (reqwest + SSE) |
//! | `full`   | no      | Enable all features |
//!
//! Without `client`, only the wire types and A2UI helpers are built.
//!
//! ## Quick Start
//!
//! ```no_run
//! use a2ui_client::client::MessageRelay;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let relay = MessageRelay::builder("http://localhost:10002").build()?;
//!
//!     // Watch the raw stream while the call runs.
//!     let mut events = relay.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(note) = events.recv().await {
//!             println!("[{}] {:?}", note.sequence, note.kind());
//!         }
//!     });
//!
//!     let messages = relay.send_str("Top 5 Chinese restaurants in New York").await?;
//!     for message in &messages {
//!         println!("{:?} on {:?}", message.kind(), message.surface_id());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`client::MessageRelay`]: send + fan-out + collect
//! - [`client::ConnectionManager`]: single-flight lazy discovery
//! - [`client::CardResolver`]: agent card discovery
//! - [`client::JsonRpcTransport`]: JSON-RPC 2.0 over HTTP with SSE replies
//! - [`OutboundMessage`] / [`ClientEvent`]: what the caller sends
//! - [`ServerToClientMessage`]: what comes back
//! - [`error::A2uiError`]: error type

pub mod a2ui;
pub mod constants;
pub mod error;
pub mod types;

#[cfg(feature = "client")]
pub mod builders;
#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "client")]
pub mod config;

/// Prelude module that re-exports commonly used types.
///
/// ```
/// use a2ui_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::a2ui::{
        A2uiMessageKind, ClientEvent, OutboundMessage, ServerToClientMessage, UserAction,
    };
    pub use crate::error::{A2uiError, A2uiResult};
    pub use crate::types::{AgentCard, Message, Part, StreamEvent, TaskState};

    #[cfg(feature = "client")]
    pub use crate::builders::RelayBuilder;

    #[cfg(feature = "client")]
    pub use crate::client::{ConnectionState, MessageRelay, StreamingEvent};

    #[cfg(feature = "client")]
    pub use crate::config::RelayConfig;
}

pub use a2ui::{A2uiMessageKind, ClientEvent, OutboundMessage, ServerToClientMessage};
pub use error::{A2uiError, A2uiResult};

#[cfg(feature = "client")]
pub use builders::RelayBuilder;
#[cfg(feature = "client")]
pub use config::RelayConfig;
