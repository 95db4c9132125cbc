//! Shared test utilities: an in-process mock agent.
//!
//! The mock serves an agent card at the well-known path and answers
//! `POST /a2a` with a scripted SSE stream, recording every request it sees.

#![allow(dead_code)]

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

/// What the discovery endpoint answers.
#[derive(Debug, Clone)]
pub enum CardReply {
    /// A well-formed card pointing at this server's `/a2a`.
    Default,
    /// This exact JSON.
    Json(Value),
    /// An error status.
    Status(u16),
    /// A raw body served as `application/json`.
    Raw(String),
}

/// One scripted SSE event.
#[derive(Debug, Clone)]
pub enum ScriptedEvent {
    /// Sent as a JSON-RPC `result` with the request's id.
    Result(Value),
    /// Sent as a JSON-RPC `error`.
    Error { code: i64, message: String },
    /// Sent verbatim as the event's data.
    Raw(String),
}

impl ScriptedEvent {
    fn render(&self, id: &Value) -> String {
        match self {
            ScriptedEvent::Result(result) => {
                json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string()
            }
            ScriptedEvent::Error { code, message } => {
                json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
                    .to_string()
            }
            ScriptedEvent::Raw(data) => data.clone(),
        }
    }
}

/// Mock agent configuration.
pub struct MockAgent {
    card: CardReply,
    events: Vec<ScriptedEvent>,
    card_delay: Duration,
    legacy_card_path: bool,
}

impl Default for MockAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAgent {
    pub fn new() -> Self {
        Self {
            card: CardReply::Default,
            events: Vec::new(),
            card_delay: Duration::ZERO,
            legacy_card_path: false,
        }
    }

    pub fn with_card(mut self, card: CardReply) -> Self {
        self.card = card;
        self
    }

    pub fn with_event(mut self, event: Value) -> Self {
        self.events.push(ScriptedEvent::Result(event));
        self
    }

    pub fn with_scripted(mut self, event: ScriptedEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_card_delay(mut self, delay: Duration) -> Self {
        self.card_delay = delay;
        self
    }

    /// Serve the card only at `/.well-known/agent.json`.
    pub fn with_legacy_card_path(mut self) -> Self {
        self.legacy_card_path = true;
        self
    }

    /// Bind on a random port and serve until the test ends.
    pub async fn spawn(self) -> RunningAgent {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let card = match self.card {
            CardReply::Default => CardReply::Json(default_card(&format!("{}/a2a", base_url))),
            other => other,
        };

        let shared = Arc::new(Shared {
            card,
            events: self.events,
            card_delay: self.card_delay,
            card_hits: AtomicUsize::new(0),
            card_headers: Mutex::new(Vec::new()),
            stream_requests: Mutex::new(Vec::new()),
        });

        let card_path = if self.legacy_card_path {
            "/.well-known/agent.json"
        } else {
            "/.well-known/agent-card.json"
        };

        let app = Router::new()
            .route(card_path, get(serve_card))
            .route("/custom/card.json", get(serve_card))
            .route("/a2a", post(serve_stream))
            .with_state(Arc::clone(&shared));

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Brief wait for the server to start accepting connections.
        tokio::time::sleep(Duration::from_millis(20)).await;

        RunningAgent {
            base_url,
            shared,
            _handle: handle,
        }
    }
}

/// A served mock agent.
pub struct RunningAgent {
    pub base_url: String,
    shared: Arc<Shared>,
    _handle: tokio::task::JoinHandle<()>,
}

impl RunningAgent {
    /// Number of discovery requests served.
    pub fn card_hits(&self) -> usize {
        self.shared.card_hits.load(Ordering::SeqCst)
    }

    /// Headers of every discovery request.
    pub fn card_headers(&self) -> Vec<HeaderMap> {
        self.shared.card_headers.lock().unwrap().clone()
    }

    /// Headers and JSON bodies of every `POST /a2a`.
    pub fn stream_requests(&self) -> Vec<(HeaderMap, Value)> {
        self.shared.stream_requests.lock().unwrap().clone()
    }

    /// The single outbound part of the n-th stream request.
    pub fn sent_part(&self, index: usize) -> Value {
        self.stream_requests()[index].1["params"]["message"]["parts"][0].clone()
    }
}

struct Shared {
    card: CardReply,
    events: Vec<ScriptedEvent>,
    card_delay: Duration,
    card_hits: AtomicUsize,
    card_headers: Mutex<Vec<HeaderMap>>,
    stream_requests: Mutex<Vec<(HeaderMap, Value)>>,
}

async fn serve_card(State(shared): State<Arc<Shared>>, headers: HeaderMap) -> Response {
    shared.card_hits.fetch_add(1, Ordering::SeqCst);
    shared.card_headers.lock().unwrap().push(headers);

    if !shared.card_delay.is_zero() {
        tokio::time::sleep(shared.card_delay).await;
    }

    match &shared.card {
        CardReply::Json(card) => Json(card.clone()).into_response(),
        CardReply::Status(code) => (
            StatusCode::from_u16(*code).unwrap(),
            "discovery unavailable",
        )
            .into_response(),
        CardReply::Raw(body) => {
            ([(header::CONTENT_TYPE, "application/json")], body.clone()).into_response()
        }
        CardReply::Default => unreachable!("resolved at spawn"),
    }
}

async fn serve_stream(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let id = body["id"].clone();
    shared
        .stream_requests
        .lock()
        .unwrap()
        .push((headers, body));

    let events: Vec<Result<Event, Infallible>> = shared
        .events
        .iter()
        .map(|event| Ok(Event::default().data(event.render(&id))))
        .collect();

    Sse::new(futures::stream::iter(events)).into_response()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub const A2UI_EXTENSION: &str = "https://a2ui.org/a2a-extension/a2ui/v0.8";

/// A restaurant-finder style agent card.
pub fn default_card(endpoint: &str) -> Value {
    json!({
        "name": "Restaurant Agent",
        "description": "Finds restaurants and renders results with A2UI",
        "version": "1.0.0",
        "url": endpoint,
        "protocolVersion": "0.3.0",
        "preferredTransport": "JSONRPC",
        "capabilities": {
            "streaming": true,
            "extensions": [{"uri": A2UI_EXTENSION, "required": false}]
        },
        "defaultInputModes": ["text", "text/plain"],
        "defaultOutputModes": ["text", "text/plain"],
        "skills": [{
            "id": "find_restaurants",
            "name": "Find Restaurants",
            "description": "Finds restaurants by cuisine and location",
            "tags": ["food", "restaurant"]
        }]
    })
}

pub fn task_event() -> Value {
    json!({
        "kind": "task",
        "id": "task-1",
        "contextId": "ctx-1",
        "status": {"state": "submitted"}
    })
}

/// A status update; `parts: None` leaves out the message entirely.
pub fn status_event(parts: Option<Value>) -> Value {
    let mut status = json!({"state": "working"});
    if let Some(parts) = parts {
        status["message"] = json!({
            "kind": "message",
            "messageId": "agent-msg",
            "role": "agent",
            "parts": parts
        });
    }
    json!({
        "kind": "status-update",
        "taskId": "task-1",
        "contextId": "ctx-1",
        "status": status,
        "final": false
    })
}

pub fn artifact_event() -> Value {
    json!({
        "kind": "artifact-update",
        "taskId": "task-1",
        "contextId": "ctx-1",
        "artifact": {
            "artifactId": "a-1",
            "parts": [{"kind": "data", "data": {"ignored": true}}]
        }
    })
}

pub fn data_part(data: Value) -> Value {
    json!({"kind": "data", "data": data, "mimeType": "application/json+a2ui"})
}

pub fn text_part(text: &str) -> Value {
    json!({"kind": "text", "text": text})
}
