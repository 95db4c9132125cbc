//! Transport layer for streamed JSON-RPC calls.
//!
//! [`Transport`] abstracts how a `message/stream` request reaches the agent;
//! [`JsonRpcTransport`] is the HTTP binding.

use async_trait::async_trait;

use crate::error::{A2uiError, A2uiResult};
use crate::types::{JsonRpcError, JsonRpcRequest};

use super::sse::SseStream;

/// Transport abstraction for streamed agent calls.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a JSON-RPC request and receive an SSE event stream.
    async fn send_stream(&self, request: &JsonRpcRequest) -> A2uiResult<SseStream>;
}

/// JSON-RPC over HTTP transport using `reqwest`.
///
/// POSTs the request as JSON with `Accept: text/event-stream` and decodes
/// the response body as SSE. Headers configured on the `reqwest::Client`
/// (extension advertisement, static auth) ride along on every request.
#[derive(Debug, Clone)]
pub struct JsonRpcTransport {
    client: reqwest::Client,
    url: String,
}

impl JsonRpcTransport {
    /// Create a transport targeting the given endpoint URL.
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Returns the URL this transport sends requests to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for JsonRpcTransport {
    async fn send_stream(&self, request: &JsonRpcRequest) -> A2uiResult<SseStream> {
        let body = serde_json::to_vec(request).map_err(|e| {
            A2uiError::Transport(format!("failed to serialize JSON-RPC request: {e}"))
        })?;

        tracing::debug!(method = %request.method, id = %request.id, url = %self.url, "opening stream");

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .body(body)
            .send()
            .await
            .map_err(|e| A2uiError::from_reqwest(e, "stream request"))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(A2uiError::Http {
                status: status.as_u16(),
                body: body_text,
            });
        }

        // Agents reject a call up front with a plain JSON-RPC error body.
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));
        if is_json {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| A2uiError::from_reqwest(e, "reading stream response"))?;
            return Err(rejected_stream(&bytes));
        }

        Ok(SseStream::from_response(response))
    }
}

/// Error for a stream request answered with JSON instead of SSE.
fn rejected_stream(body: &[u8]) -> A2uiError {
    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            return A2uiError::InvalidJson(format!("failed to parse stream response: {e}"))
        }
    };

    match value
        .get("error")
        .cloned()
        .map(serde_json::from_value::<JsonRpcError>)
    {
        Some(Ok(error)) => error.into(),
        _ => A2uiError::InvalidJson(format!("expected an event stream, got JSON: {value}")),
    }
}
