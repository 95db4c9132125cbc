//! Server-Sent Events (SSE) decoding for `message/stream` responses.
//!
//! The response body is read on a background task and framed into SSE
//! events. Each event's `data` is parsed as JSON and, when the agent wraps it
//! in a JSON-RPC response, unwrapped to the bare event. Typed decoding into
//! [`StreamEvent`](crate::types::StreamEvent) is left to the consumer so the
//! raw event survives untouched.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::Stream;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{A2uiError, A2uiResult};
use crate::types::JsonRpcError;

const CHANNEL_CAPACITY: usize = 64;

/// A stream of raw agent events as JSON values.
///
/// Yields `Ok(event)` per SSE event, at most one `Err` (after which the
/// stream ends), and `None` once the server closes the response.
///
/// # Example
///
/// ```no_run
/// # async fn example(mut stream: a2ui_client::client::SseStream) {
/// while let Some(event) = stream.next().await {
///     match event {
///         Ok(event) => println!("got {}", event["kind"]),
///         Err(e) => eprintln!("stream error: {}", e),
///     }
/// }
/// # }
/// ```
pub struct SseStream {
    receiver: mpsc::Receiver<A2uiResult<Value>>,
    /// Decoder task; `None` when the stream was built from a channel.
    _task: Option<tokio::task::JoinHandle<()>>,
}

impl std::fmt::Debug for SseStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseStream").finish_non_exhaustive()
    }
}

impl SseStream {
    /// Decode a raw `reqwest::Response` on a spawned task.
    pub(crate) fn from_response(response: reqwest::Response) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        let task = tokio::spawn(async move {
            if let Err(e) = decode_body(response, &tx).await {
                // Receiver may already be gone.
                let _ = tx.send(Err(e)).await;
            }
        });

        Self {
            receiver: rx,
            _task: Some(task),
        }
    }

    /// Wrap a channel of already-parsed events.
    ///
    /// Lets custom [`Transport`](super::Transport) implementations produce
    /// streams without going through HTTP.
    pub fn from_receiver(receiver: mpsc::Receiver<A2uiResult<Value>>) -> Self {
        Self {
            receiver,
            _task: None,
        }
    }

    /// Get the next event. `None` means the stream is exhausted.
    pub async fn next(&mut self) -> Option<A2uiResult<Value>> {
        self.receiver.recv().await
    }
}

impl Stream for SseStream {
    type Item = A2uiResult<Value>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Read the response body, split it into lines and feed the decoder.
///
/// Lines are split on raw bytes so a multi-byte character straddling two
/// chunks is decoded intact.
async fn decode_body(
    response: reqwest::Response,
    tx: &mpsc::Sender<A2uiResult<Value>>,
) -> A2uiResult<()> {
    use futures::StreamExt;

    let mut body = response.bytes_stream();
    let mut pending: Vec<u8> = Vec::new();
    let mut decoder = EventDecoder::default();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| A2uiError::from_reqwest(e, "reading event stream"))?;
        pending.extend_from_slice(&chunk);

        while let Some(newline) = pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = pending.drain(..=newline).collect();
            let line = decode_line(&raw)?;

            if let Some(event) = decoder.push_line(line)? {
                if tx.send(Ok(event)).await.is_err() {
                    // Receiver dropped.
                    return Ok(());
                }
            }
        }
    }

    if !pending.is_empty() {
        let line = decode_line(&pending)?;
        if let Some(event) = decoder.push_line(line)? {
            let _ = tx.send(Ok(event)).await;
            return Ok(());
        }
    }

    if let Some(event) = decoder.finish()? {
        let _ = tx.send(Ok(event)).await;
    }

    Ok(())
}

fn decode_line(raw: &[u8]) -> A2uiResult<&str> {
    let line = std::str::from_utf8(raw)
        .map_err(|e| A2uiError::Transport(format!("invalid UTF-8 in event stream: {e}")))?;
    Ok(line.trim_end_matches(|c| c == '\n' || c == '\r'))
}

/// SSE event framing: `data:` lines accumulate until a blank line
/// dispatches the event.
#[derive(Debug, Default)]
struct EventDecoder {
    data: Vec<String>,
}

impl EventDecoder {
    fn push_line(&mut self, line: &str) -> A2uiResult<Option<Value>> {
        if line.is_empty() {
            return self.dispatch();
        }

        // Comment / keep-alive.
        if line.starts_with(':') {
            return Ok(None);
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        // event:, id: and retry: carry nothing the relay uses.
        if field == "data" {
            self.data.push(value.to_string());
        }

        Ok(None)
    }

    /// Flush a final event the server did not terminate with a blank line.
    fn finish(&mut self) -> A2uiResult<Option<Value>> {
        self.dispatch()
    }

    fn dispatch(&mut self) -> A2uiResult<Option<Value>> {
        if self.data.is_empty() {
            return Ok(None);
        }
        let payload = self.data.join("\n");
        self.data.clear();
        parse_event_data(&payload)
    }
}

/// Parse one event's data. Returns `None` for empty data and the `[DONE]`
/// sentinel.
///
/// Accepts both raw events and JSON-RPC wrapped responses
/// (`{"jsonrpc": "2.0", "id": ..., "result": {...}}`); a wrapped `error`
/// becomes [`A2uiError::JsonRpc`].
fn parse_event_data(data: &str) -> A2uiResult<Option<Value>> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(data).map_err(|e| {
        A2uiError::InvalidJson(format!("failed to parse SSE event data: {e} (data: {data})"))
    })?;

    let event = if value.get("jsonrpc").is_some() {
        if let Some(error) = value.get("error") {
            let error = serde_json::from_value::<JsonRpcError>(error.clone()).unwrap_or_else(|_| {
                JsonRpcError {
                    code: -1,
                    message: error.to_string(),
                    data: None,
                }
            });
            return Err(error.into());
        }
        value.get("result").cloned().ok_or_else(|| {
            A2uiError::InvalidJson(format!(
                "JSON-RPC SSE response has neither 'result' nor 'error': {data}"
            ))
        })?
    } else {
        value
    };

    Ok(Some(event))
}
