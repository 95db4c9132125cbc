//! Restaurant Finder: relays one query to an A2UI agent and prints what
//! comes back.
//!
//! Every raw stream event is printed as it arrives (via the
//! `streaming-event` notifications), followed by the A2UI messages the
//! relay collected from status updates.
//!
//! Run against a local A2UI restaurant agent:
//! ```sh
//! cargo run --example restaurant_finder -- http://localhost:10002 "Top 5 Chinese restaurants in New York"
//! ```
//!
//! Input that parses as a JSON object or array is sent as an A2UI data part:
//! ```sh
//! cargo run --example restaurant_finder -- http://localhost:10002 \
//!   '{"userAction": {"name": "book_restaurant", "surfaceId": "main", "context": {}}}'
//! ```

use a2ui_client::client::MessageRelay;
use a2ui_client::types::StreamEvent;
use anyhow::{Context, Result};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let base_url = args
        .next()
        .context("usage: restaurant_finder <agent-base-url> [query]")?;
    let query = args
        .next()
        .unwrap_or_else(|| "Top 5 Chinese restaurants in New York".to_string());

    let relay = MessageRelay::builder(base_url).build()?;

    let card = relay.agent_card().await?;
    println!("Connected to: {} (v{})", card.name, card.version);
    println!();

    // Print the raw stream while the call runs.
    let mut events = relay.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(note) = events.recv().await {
            match note.decode() {
                Ok(StreamEvent::Task(task)) => {
                    println!("[{}] task {}: {}", note.sequence, task.id, task.status.state);
                }
                Ok(StreamEvent::StatusUpdate(update)) => {
                    println!(
                        "[{}] status {} (final: {})",
                        note.sequence, update.status.state, update.r#final
                    );
                }
                Ok(StreamEvent::ArtifactUpdate(update)) => {
                    println!("[{}] artifact {}", note.sequence, update.artifact.artifact_id);
                }
                Ok(StreamEvent::Message(message)) => {
                    println!("[{}] message from {}", note.sequence, message.role);
                }
                // Unknown kinds and malformed bodies are shown raw.
                Ok(StreamEvent::Other(_)) | Err(_) => {
                    println!("[{}] {}", note.sequence, note.event);
                }
            }
        }
    });

    println!("--- Sending: {} ---", query);
    let messages = relay.send_str(&query).await?;
    println!("--- Stream ended ---");
    println!();

    // Dropping the relay closes the channel and ends the printer.
    drop(relay);
    printer.await?;

    println!("{} A2UI message(s):", messages.len());
    for message in &messages {
        let kind = message.kind().map_or("unknown", |k| k.key());
        let surface = message.surface_id().unwrap_or("-");
        println!("  {kind} on surface {surface}");
        println!("    {}", serde_json::to_string(message.as_value())?);
    }

    Ok(())
}
