//! Well-known paths, headers and identifiers used by the relay.

/// The well-known path for the agent card (A2A protocol v0.3 and later).
pub const AGENT_CARD_WELL_KNOWN_PATH: &str = "/.well-known/agent-card.json";

/// The previous well-known path for the agent card (still served by older agents).
pub const PREV_AGENT_CARD_WELL_KNOWN_PATH: &str = "/.well-known/agent.json";

/// HTTP header advertising the protocol extensions a client supports.
pub const HTTP_EXTENSION_HEADER: &str = "X-A2A-Extensions";

/// URI of the A2UI v0.8 protocol extension.
pub const A2UI_EXTENSION_URI: &str = "https://a2ui.org/a2a-extension/a2ui/v0.8";

/// MIME type tagging structured-data parts that carry A2UI messages.
pub const A2UI_MIME_TYPE: &str = "application/json+a2ui";

/// JSON-RPC method used to open a streamed response.
pub const MESSAGE_STREAM_METHOD: &str = "message/stream";

/// Name of the local notification published for every inbound stream event.
pub const STREAMING_EVENT: &str = "streaming-event";
