//! Relay client: talk to a remote A2A agent that renders A2UI.
//!
//! - [`MessageRelay`]: send a message, fan out every stream event, return
//!   the A2UI payloads
//! - [`ConnectionManager`] / [`Connection`]: lazy, single-flight discovery
//!   of the agent and its endpoint
//! - [`CardResolver`]: fetch agent cards from the well-known URI
//! - [`Transport`] / [`JsonRpcTransport`]: pluggable transport layer
//! - [`SseStream`]: SSE event stream of raw JSON events
//!
//! # Quick Start
//!
//! ```no_run
//! use a2ui_client::client::MessageRelay;
//! use a2ui_client::OutboundMessage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let relay = MessageRelay::builder("http://localhost:10002").build()?;
//!
//! // Caller decides: plain text ...
//! let messages = relay.send(OutboundMessage::Text("Find me ramen".into())).await?;
//! // ... or a structured A2UI payload.
//! let more = relay
//!     .send(OutboundMessage::Structured(serde_json::json!({"userAction": {"name": "refresh"}})))
//!     .await?;
//! println!("{} + {} messages", messages.len(), more.len());
//! # Ok(())
//! # }
//! ```

mod card_resolver;
mod connection;
mod relay;
mod sse;
mod transport;

pub use card_resolver::CardResolver;
pub use connection::{Connection, ConnectionManager, ConnectionState};
pub use relay::{MessageRelay, StreamingEvent};
pub use sse::SseStream;
pub use transport::{JsonRpcTransport, Transport};
