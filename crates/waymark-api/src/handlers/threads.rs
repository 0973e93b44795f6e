//! Thread lifecycle HTTP handlers.
//!
//! Message-level mutations live in [`crate::handlers::messages`]; this
//! module covers the thread record itself.

use axum::extract::{Path, State};
use axum::Json;

use crate::{ApiError, AppState};
use waymark_core::{CreateThreadRequest, RenameThreadRequest, Thread, ThreadSummary};

/// Create a thread from a journey template.
///
/// Returns 404 when the journey does not exist. When the journey defines
/// an initial message the new thread starts with one hidden seed turn.
pub async fn create_thread(
    State(state): State<AppState>,
    Json(req): Json<CreateThreadRequest>,
) -> Result<Json<Thread>, ApiError> {
    let thread = state.storage.threads.create(req).await?;
    Ok(Json(thread))
}

/// List all threads as `{id, name, journey_id}` summaries.
pub async fn list_threads(
    State(state): State<AppState>,
) -> Result<Json<Vec<ThreadSummary>>, ApiError> {
    let threads = state.storage.threads.list().await?;
    Ok(Json(threads))
}

/// Fetch one thread with its full message sequence.
pub async fn get_thread(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Thread>, ApiError> {
    let thread = state.storage.threads.get(&id).await?;
    Ok(Json(thread))
}

/// Rename a thread.
pub async fn rename_thread(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RenameThreadRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.storage.threads.rename(&id, &req.name).await?;
    Ok(Json(serde_json::json!({
        "message": "Thread renamed successfully"
    })))
}

/// Delete a thread and every media blob its messages reference.
pub async fn delete_thread(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.storage.threads.delete_thread(&id).await?;
    Ok(Json(serde_json::json!({
        "message": "Thread deleted successfully"
    })))
}
