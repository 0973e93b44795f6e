//! SSE stream parsing for Anthropic streaming responses.

use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::pin::Pin;

use waymark_core::{ChatTurn, Error, Result};

/// Stream of generation tokens.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Chat backend that streams assistant tokens as they are generated.
#[async_trait::async_trait]
pub trait StreamingChat: Send + Sync {
    /// Stream the assistant's reply to a conversation transcript.
    async fn stream_chat(&self, messages: &[ChatTurn]) -> Result<TokenStream>;

    /// Model identifier used for generation.
    fn model_name(&self) -> &str;
}

/// Parse an SSE byte stream from the Anthropic messages endpoint.
pub fn parse_sse_stream(
    stream: impl Stream<Item = std::result::Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
) -> TokenStream {
    let token_stream = stream
        .map(|chunk_result| {
            chunk_result.map_err(|e| Error::Inference(format!("Stream error: {}", e)))
        })
        .filter_map(|result| async move {
            match result {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    parse_sse_chunk(&text)
                }
                Err(e) => Some(Err(e)),
            }
        });

    Box::pin(token_stream)
}

/// Payload of a `data:` line. Every event repeats its kind in the
/// `type` field, so the preceding `event:` line can be ignored.
#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    delta: Option<EventDelta>,
    #[serde(default)]
    error: Option<EventError>,
}

/// Delta carried by `content_block_delta` and `message_delta` events.
/// Only text deltas have a `text` field.
#[derive(Debug, Deserialize)]
struct EventDelta {
    #[serde(default)]
    text: Option<String>,
}

/// Error detail carried by `error` events.
#[derive(Debug, Deserialize)]
struct EventError {
    #[serde(rename = "type", default)]
    error_type: String,
    message: String,
}

/// Parse a single SSE chunk and extract text deltas.
fn parse_sse_chunk(chunk: &str) -> Option<Result<String>> {
    let mut content = String::new();

    for line in chunk.lines() {
        let line = line.trim();

        // Skip empty lines, comments, and event-name lines
        if line.is_empty() || line.starts_with(':') || line.starts_with("event:") {
            continue;
        }

        // Parse data lines
        if let Some(data) = line.strip_prefix("data: ") {
            match serde_json::from_str::<StreamEvent>(data) {
                Ok(event) => match event.event_type.as_str() {
                    "content_block_delta" => {
                        if let Some(text) = event.delta.and_then(|d| d.text) {
                            content.push_str(&text);
                        }
                    }
                    // End of generation; trailing data in this chunk is ignored
                    "message_stop" => break,
                    "error" => {
                        let (kind, message) = event
                            .error
                            .map(|e| (e.error_type, e.message))
                            .unwrap_or_else(|| {
                                ("unknown".to_string(), "Unknown error".to_string())
                            });
                        return Some(Err(Error::Inference(format!(
                            "Stream error event ({}): {}",
                            kind, message
                        ))));
                    }
                    // message_start, content_block_start/stop, message_delta, ping
                    _ => {}
                },
                Err(e) => {
                    return Some(Err(Error::Inference(format!(
                        "Failed to parse SSE chunk: {}",
                        e
                    ))));
                }
            }
        }
    }

    if content.is_empty() {
        None
    } else {
        Some(Ok(content))
    }
}
