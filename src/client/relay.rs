//! The message relay: send one message, stream the reply, fan every event
//! out to local subscribers and return the A2UI payloads.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::a2ui::{extract_messages, OutboundMessage, ServerToClientMessage};
use crate::builders::RelayBuilder;
use crate::config::RelayConfig;
use crate::constants::STREAMING_EVENT;
use crate::error::{A2uiError, A2uiResult};
use crate::types::{AgentCard, Message, SendMessageParams, StreamEvent};

use super::connection::{Connection, ConnectionManager, ConnectionState};

/// Local notification published for every event received from the agent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingEvent {
    /// Id of the outbound message whose reply produced this event.
    pub message_id: String,
    /// Zero-based position of the event within its stream.
    pub sequence: u64,
    /// When the relay pulled the event off the stream.
    pub received_at: DateTime<Utc>,
    /// The event exactly as the agent sent it, JSON-RPC envelope removed.
    /// Fields this crate does not model are kept.
    pub event: Value,
}

impl StreamingEvent {
    /// Notification name.
    pub const NAME: &'static str = STREAMING_EVENT;

    /// The event's `kind` discriminator, if it has one.
    pub fn kind(&self) -> Option<&str> {
        self.event.get("kind").and_then(Value::as_str)
    }

    /// Typed view of the event. Unknown kinds decode to
    /// [`StreamEvent::Other`].
    ///
    /// # Errors
    ///
    /// [`A2uiError::InvalidJson`] when a known kind has a malformed body.
    pub fn decode(&self) -> A2uiResult<StreamEvent> {
        serde_json::from_value(self.event.clone()).map_err(|e| {
            A2uiError::InvalidJson(format!(
                "malformed {} event #{}: {e}",
                self.kind().unwrap_or("untyped"),
                self.sequence
            ))
        })
    }
}

/// Relays messages to one remote agent.
///
/// The connection is discovered lazily on the first [`send`](Self::send) and
/// reused afterwards. Concurrent sends are fine; they share the connection
/// and the notification channel but nothing else.
///
/// # Example
///
/// ```no_run
/// use a2ui_client::client::MessageRelay;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let relay = MessageRelay::builder("http://localhost:10002").build()?;
///
/// let mut events = relay.subscribe();
/// tokio::spawn(async move {
///     while let Ok(note) = events.recv().await {
///         println!("#{} {:?}", note.sequence, note.kind());
///     }
/// });
///
/// for message in relay.send_str("Top 5 Chinese restaurants in New York").await? {
///     println!("{:?} -> {:?}", message.kind(), message.surface_id());
/// }
/// # Ok(())
/// # }
/// ```
pub struct MessageRelay {
    connection: ConnectionManager,
    events: broadcast::Sender<StreamingEvent>,
}

impl std::fmt::Debug for MessageRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRelay")
            .field("connection", &self.connection)
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

impl MessageRelay {
    /// Create a relay from a configuration. Does no I/O.
    ///
    /// # Errors
    ///
    /// [`A2uiError::Config`](crate::error::A2uiError::Config) when the
    /// configuration does not validate.
    pub fn new(config: RelayConfig) -> A2uiResult<Self> {
        let connection = ConnectionManager::new(&config)?;
        let (events, _) = broadcast::channel(config.event_capacity);
        Ok(Self { connection, events })
    }

    /// Start building a relay for the agent at `base_url`.
    pub fn builder(base_url: impl Into<String>) -> RelayBuilder {
        RelayBuilder::new(base_url)
    }

    /// Create a relay over an already-established connection.
    ///
    /// # Errors
    ///
    /// [`A2uiError::Config`] when `event_capacity` is 0.
    pub fn with_connection(connection: Connection, event_capacity: usize) -> A2uiResult<Self> {
        if event_capacity == 0 {
            return Err(A2uiError::Config(
                "event capacity must be greater than 0".to_string(),
            ));
        }
        let (events, _) = broadcast::channel(event_capacity);
        Ok(Self {
            connection: ConnectionManager::with_connection(connection),
            events,
        })
    }

    /// Subscribe to `streaming-event` notifications.
    ///
    /// Only events received after subscribing are delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<StreamingEvent> {
        self.events.subscribe()
    }

    /// State of the underlying connection.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// The agent card, discovering the connection if needed.
    pub async fn agent_card(&self) -> A2uiResult<AgentCard> {
        let connection = self.connection.acquire().await?;
        Ok(connection.card().clone())
    }

    /// Send free-form input, treating JSON objects and arrays as structured
    /// payloads and everything else as text.
    pub async fn send_str(&self, input: &str) -> A2uiResult<Vec<ServerToClientMessage>> {
        self.send(OutboundMessage::infer(input)).await
    }

    /// Send a message and collect the A2UI payloads from the streamed reply.
    ///
    /// Every received event is published as a [`StreamingEvent`] first,
    /// verbatim; then each `data` part of a status update's message is
    /// appended to the result, in stream order. Events of a kind this crate
    /// does not know are published and otherwise skipped. Returns once the
    /// agent closes the stream.
    ///
    /// # Errors
    ///
    /// Discovery failures, transport failures, unparsable event data and
    /// known events with a malformed body abort the call. Payloads collected
    /// before the failure are discarded.
    pub async fn send(
        &self,
        message: impl Into<OutboundMessage>,
    ) -> A2uiResult<Vec<ServerToClientMessage>> {
        let connection = self.connection.acquire().await?;

        let message = Message::user(vec![message.into().into_part()]);
        let message_id = message.message_id.clone();
        let params = SendMessageParams {
            message,
            metadata: None,
        };

        let mut stream = connection.stream_message(&params).await?;
        debug!(message_id = %message_id, endpoint = connection.endpoint(), "stream opened");

        let mut collected = Vec::new();
        let mut sequence = 0u64;
        while let Some(event) = stream.next().await {
            let note = StreamingEvent {
                message_id: message_id.clone(),
                sequence,
                received_at: Utc::now(),
                event: event?,
            };
            trace!(message_id = %message_id, sequence, kind = ?note.kind(), "stream event");

            let decoded = note.decode();
            self.publish(note);
            let event = decoded?;
            if let StreamEvent::Other(_) = event {
                debug!(message_id = %message_id, sequence, "skipping unrecognised event kind");
            }
            collected.extend(extract_messages(&event));
            sequence += 1;
        }

        debug!(
            message_id = %message_id,
            events = sequence,
            messages = collected.len(),
            "stream finished"
        );
        Ok(collected)
    }

    fn publish(&self, note: StreamingEvent) {
        if self.events.send(note).is_err() {
            trace!("no {} subscribers", STREAMING_EVENT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a2ui::ClientEvent;
    use crate::client::{SseStream, Transport};
    use crate::types::JsonRpcRequest;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    /// Replays a fixed script of events and records each request.
    struct ScriptedTransport {
        script: Vec<A2uiResult<Value>>,
        requests: Arc<Mutex<Vec<JsonRpcRequest>>>,
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send_stream(&self, request: &JsonRpcRequest) -> A2uiResult<SseStream> {
            self.requests.lock().unwrap().push(request.clone());
            let (tx, rx) = tokio::sync::mpsc::channel(self.script.len().max(1));
            for item in &self.script {
                tx.send(item.clone()).await.unwrap();
            }
            Ok(SseStream::from_receiver(rx))
        }
    }

    fn relay(script: Vec<A2uiResult<Value>>) -> (MessageRelay, Arc<Mutex<Vec<JsonRpcRequest>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let card: AgentCard =
            serde_json::from_value(json!({"name": "scripted", "url": "http://x/a2a"})).unwrap();
        let transport = ScriptedTransport {
            script,
            requests: Arc::clone(&requests),
        };
        let connection = Connection::new(card, "http://x/a2a", Box::new(transport));
        (MessageRelay::with_connection(connection, 16).unwrap(), requests)
    }

    fn status(parts: Option<Value>) -> Value {
        let mut status = json!({"state": "working"});
        if let Some(parts) = parts {
            status["message"] =
                json!({"kind": "message", "messageId": "a", "role": "agent", "parts": parts});
        }
        json!({"kind": "status-update", "taskId": "t", "contextId": "c", "status": status})
    }

    fn task() -> Value {
        json!({"kind": "task", "id": "t", "contextId": "c", "status": {"state": "submitted"}})
    }

    fn sent_part(requests: &Mutex<Vec<JsonRpcRequest>>, index: usize) -> Value {
        requests.lock().unwrap()[index].params["message"]["parts"][0].clone()
    }

    #[tokio::test]
    async fn two_data_parts_are_returned_in_order() {
        let (relay, _) = relay(vec![Ok(status(Some(json!([
            {"kind": "data", "data": {"x": 1}},
            {"kind": "data", "data": {"y": 2}}
        ]))))]);
        let got: Vec<Value> = relay
            .send("show")
            .await
            .unwrap()
            .into_iter()
            .map(ServerToClientMessage::into_inner)
            .collect();
        assert_eq!(got, vec![json!({"x": 1}), json!({"y": 2})]);
    }

    #[tokio::test]
    async fn non_qualifying_events_yield_nothing() {
        let (relay, _) = relay(vec![Ok(task()), Ok(status(None))]);
        assert!(relay.send("hi").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn envelope_is_a_user_message_on_message_stream() {
        let (relay, requests) = relay(vec![]);
        relay.send_str("hello").await.unwrap();

        let request = requests.lock().unwrap()[0].clone();
        assert_eq!(request.method, "message/stream");
        assert_eq!(request.jsonrpc, "2.0");
        let message = &request.params["message"];
        assert_eq!(message["role"], "user");
        assert_eq!(message["kind"], "message");
        assert_eq!(message["parts"], json!([{"kind": "text", "text": "hello"}]));
    }

    #[tokio::test]
    async fn free_text_json_object_is_sent_as_data() {
        let (relay, requests) = relay(vec![]);
        relay.send_str(r#"{"a":1}"#).await.unwrap();
        assert_eq!(
            sent_part(&requests, 0),
            json!({"kind": "data", "data": {"a": 1}, "mimeType": "application/json+a2ui"})
        );
    }

    #[tokio::test]
    async fn structured_payload_is_always_data() {
        let (relay, requests) = relay(vec![]);
        relay.send(json!(7)).await.unwrap();
        assert_eq!(
            sent_part(&requests, 0),
            json!({"kind": "data", "data": 7, "mimeType": "application/json+a2ui"})
        );

        relay
            .send(ClientEvent::user_action("book", "main", "btn", Default::default()))
            .await
            .unwrap();
        let part = sent_part(&requests, 1);
        assert_eq!(part["kind"], "data");
        assert_eq!(part["data"]["userAction"]["name"], "book");
    }

    #[tokio::test]
    async fn every_call_gets_a_fresh_message_id() {
        let (relay, requests) = relay(vec![]);
        relay.send("a").await.unwrap();
        relay.send("b").await.unwrap();
        let requests = requests.lock().unwrap();
        assert_ne!(
            requests[0].params["message"]["messageId"],
            requests[1].params["message"]["messageId"]
        );
    }

    #[tokio::test]
    async fn every_event_is_published_once_in_order() {
        let (relay, _) = relay(vec![
            Ok(task()),
            Ok(status(Some(json!([{"kind": "data", "data": {"x": 1}}])))),
            Ok(status(None)),
        ]);
        let mut rx = relay.subscribe();
        relay.send("go").await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(note) = rx.try_recv() {
            assert_eq!(note.sequence as usize, kinds.len());
            kinds.push(note.kind().unwrap_or_default().to_string());
        }
        assert_eq!(kinds, vec!["task", "status-update", "status-update"]);
        assert_eq!(StreamingEvent::NAME, "streaming-event");
    }

    #[tokio::test]
    async fn stream_error_discards_partial_results() {
        let (relay, _) = relay(vec![
            Ok(status(Some(json!([{"kind": "data", "data": {"x": 1}}])))),
            Err(A2uiError::Transport("connection reset".to_string())),
        ]);
        let mut rx = relay.subscribe();
        let err = relay.send("go").await.unwrap_err();
        assert!(matches!(err, A2uiError::Transport(_)));
        // the event before the failure was still published
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn works_without_subscribers() {
        let (relay, _) = relay(vec![Ok(task())]);
        assert!(relay.send("go").await.unwrap().is_empty());
        assert_eq!(relay.connection_state(), ConnectionState::Ready);
        assert_eq!(relay.agent_card().await.unwrap().name, "scripted");
    }

    #[tokio::test]
    async fn unknown_event_kind_is_published_and_skipped() {
        let odd = json!({"kind": "telepathy", "payload": 1});
        let (relay, _) = relay(vec![
            Ok(task()),
            Ok(odd.clone()),
            Ok(status(Some(json!([{"kind": "data", "data": {"x": 1}}])))),
        ]);
        let mut rx = relay.subscribe();

        let got: Vec<Value> = relay
            .send("go")
            .await
            .unwrap()
            .into_iter()
            .map(ServerToClientMessage::into_inner)
            .collect();
        assert_eq!(got, vec![json!({"x": 1})]);

        let notes: Vec<StreamingEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[1].event, odd);
        assert!(matches!(notes[1].decode().unwrap(), StreamEvent::Other(_)));
    }

    #[tokio::test]
    async fn malformed_known_event_is_published_then_aborts() {
        let broken = json!({"kind": "status-update", "taskId": "t"});
        let (relay, _) = relay(vec![Ok(broken.clone()), Ok(task())]);
        let mut rx = relay.subscribe();

        let err = relay.send("go").await.unwrap_err();
        assert!(matches!(err, A2uiError::InvalidJson(_)), "{err:?}");
        assert_eq!(rx.try_recv().unwrap().event, broken);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn zero_event_capacity_is_a_config_error() {
        let card: AgentCard =
            serde_json::from_value(json!({"name": "scripted", "url": "http://x/a2a"})).unwrap();
        let transport = ScriptedTransport {
            script: vec![],
            requests: Arc::default(),
        };
        let connection = Connection::new(card, "http://x/a2a", Box::new(transport));
        assert!(matches!(
            MessageRelay::with_connection(connection, 0),
            Err(A2uiError::Config(_))
        ));
    }
}
