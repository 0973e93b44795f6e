//! Streaming chat HTTP handler.

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use futures::StreamExt;
use tracing::{error, info};

use crate::{ApiError, AppState};
use waymark_core::ChatRequest;

/// Stream an assistant turn as chunked plain text.
///
/// The transcript is forwarded to the chat backend and tokens are relayed
/// to the client as they arrive. A failure before the first token maps to
/// a 500; a failure mid-stream terminates the body, since the status line
/// has already been sent. Dropping the connection drops the token stream
/// and with it the upstream request; no thread state is involved.
pub async fn stream_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!(
        model = state.chat.model_name(),
        turns = req.messages.len(),
        "Streaming chat turn"
    );

    let tokens = state.chat.stream_chat(&req.messages).await?;

    let body = Body::from_stream(tokens.map(|token| match token {
        Ok(text) => Ok(text.into_bytes()),
        Err(e) => {
            error!("Chat stream failed mid-response: {}", e);
            Err(axum::BoxError::from(e))
        }
    }));

    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body))
}
