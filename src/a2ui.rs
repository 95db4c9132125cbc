//! A2UI message shapes layered on top of A2A parts.
//!
//! Outbound, the caller picks an [`OutboundMessage`]: free text or a
//! structured payload (usually a [`ClientEvent`]). Inbound, every `data` part
//! found in a status update is surfaced as a [`ServerToClientMessage`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::A2UI_MIME_TYPE;
use crate::types::{Part, StreamEvent};

/// A message the caller wants to send to the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// Plain text, sent as a `text` part.
    Text(String),
    /// Structured payload, sent as a `data` part tagged `application/json+a2ui`.
    Structured(Value),
}

impl OutboundMessage {
    /// Classify free-form input the way a chat box would.
    ///
    /// Input that parses as a JSON object or array becomes
    /// [`Structured`](Self::Structured); anything else (unparsable text,
    /// numbers, strings, booleans, `null`) stays [`Text`](Self::Text) with the
    /// original string untouched. A parse failure is not an error.
    pub fn infer(input: &str) -> Self {
        match serde_json::from_str::<Value>(input) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => OutboundMessage::Structured(value),
            _ => OutboundMessage::Text(input.to_string()),
        }
    }

    /// Normalize into the single part placed on the wire.
    pub fn into_part(self) -> Part {
        match self {
            OutboundMessage::Text(text) => Part::text(text),
            OutboundMessage::Structured(data) => Part::data_with_mime(data, A2UI_MIME_TYPE),
        }
    }
}

impl From<String> for OutboundMessage {
    fn from(text: String) -> Self {
        OutboundMessage::Text(text)
    }
}

impl From<&str> for OutboundMessage {
    fn from(text: &str) -> Self {
        OutboundMessage::Text(text.to_string())
    }
}

impl From<Value> for OutboundMessage {
    fn from(value: Value) -> Self {
        OutboundMessage::Structured(value)
    }
}

impl From<ClientEvent> for OutboundMessage {
    fn from(event: ClientEvent) -> Self {
        OutboundMessage::Structured(event.to_value())
    }
}

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

/// A user interaction on a rendered surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAction {
    /// Action name declared by the component.
    pub name: String,
    /// Surface the component lives on.
    pub surface_id: String,
    /// Component that triggered the action.
    pub source_component_id: String,
    /// RFC 3339 timestamp of the interaction.
    pub timestamp: String,
    /// Resolved action context (bound data values).
    #[serde(default)]
    pub context: Map<String, Value>,
}

/// A2UI v0.8 client-to-server event.
///
/// Serializes externally tagged: `{"userAction": {...}}` or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientEvent {
    /// A user interaction.
    UserAction(UserAction),
    /// A client-side rendering error reported back to the agent.
    Error(Value),
}

impl ClientEvent {
    /// Build a `userAction` event stamped with the current UTC time.
    pub fn user_action(
        name: impl Into<String>,
        surface_id: impl Into<String>,
        source_component_id: impl Into<String>,
        context: Map<String, Value>,
    ) -> Self {
        ClientEvent::UserAction(UserAction {
            name: name.into(),
            surface_id: surface_id.into(),
            source_component_id: source_component_id.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            context,
        })
    }

    /// Build an `error` event.
    pub fn error(details: Value) -> Self {
        ClientEvent::Error(details)
    }

    /// The JSON payload placed in the outbound data part.
    pub fn to_value(&self) -> Value {
        // Strings and string-keyed maps always serialize.
        serde_json::to_value(self).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

/// Top-level A2UI v0.8 server message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum A2uiMessageKind {
    /// `beginRendering`: a surface is ready to be shown.
    BeginRendering,
    /// `surfaceUpdate`: component definitions for a surface.
    SurfaceUpdate,
    /// `dataModelUpdate`: data bound into a surface.
    DataModelUpdate,
    /// `deleteSurface`: drop a surface.
    DeleteSurface,
}

impl A2uiMessageKind {
    const ALL: [A2uiMessageKind; 4] = [
        A2uiMessageKind::BeginRendering,
        A2uiMessageKind::SurfaceUpdate,
        A2uiMessageKind::DataModelUpdate,
        A2uiMessageKind::DeleteSurface,
    ];

    /// The JSON key carrying this message.
    pub fn key(self) -> &'static str {
        match self {
            A2uiMessageKind::BeginRendering => "beginRendering",
            A2uiMessageKind::SurfaceUpdate => "surfaceUpdate",
            A2uiMessageKind::DataModelUpdate => "dataModelUpdate",
            A2uiMessageKind::DeleteSurface => "deleteSurface",
        }
    }
}

/// A structured payload received from the agent, passed through unvalidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerToClientMessage(Value);

impl ServerToClientMessage {
    /// Wrap a raw payload.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The raw payload.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Unwrap into the raw payload.
    pub fn into_inner(self) -> Value {
        self.0
    }

    /// The A2UI message kind, if the payload is a recognised v0.8 message.
    pub fn kind(&self) -> Option<A2uiMessageKind> {
        let object = self.0.as_object()?;
        A2uiMessageKind::ALL
            .into_iter()
            .find(|kind| object.contains_key(kind.key()))
    }

    /// The `surfaceId` the message targets.
    pub fn surface_id(&self) -> Option<&str> {
        let kind = self.kind()?;
        self.0.get(kind.key())?.get("surfaceId")?.as_str()
    }
}

impl From<Value> for ServerToClientMessage {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Collect the structured payloads an event contributes to a `send` result.
///
/// Only status updates carrying a message contribute; every `data` part of
/// that message is taken, in order, regardless of its MIME type.
pub fn extract_messages(event: &StreamEvent) -> Vec<ServerToClientMessage> {
    let StreamEvent::StatusUpdate(update) = event else {
        return Vec::new();
    };
    let Some(message) = &update.status.message else {
        return Vec::new();
    };
    message
        .parts
        .iter()
        .filter_map(|part| match part {
            Part::Data { data, .. } => Some(ServerToClientMessage::new(data.clone())),
            _ => None,
        })
        .collect()
}
