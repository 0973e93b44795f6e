//! Journey template HTTP handlers.
//!
//! Journeys are immutable after creation: there is no update route, only
//! create, read, list, and delete. Deleting a journey leaves existing
//! threads untouched; creating new threads against it then fails with 404.

use axum::extract::{Path, State};
use axum::Json;

use crate::{ApiError, AppState};
use waymark_core::{CreateJourneyRequest, Journey};

/// Create a journey template with a server-generated id.
pub async fn create_journey(
    State(state): State<AppState>,
    Json(req): Json<CreateJourneyRequest>,
) -> Result<Json<Journey>, ApiError> {
    let journey = state.storage.journeys.create(req).await?;
    Ok(Json(journey))
}

/// List all journey templates (full records, no pagination).
pub async fn list_journeys(State(state): State<AppState>) -> Result<Json<Vec<Journey>>, ApiError> {
    let journeys = state.storage.journeys.list().await?;
    Ok(Json(journeys))
}

/// Fetch one journey by id.
pub async fn get_journey(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Journey>, ApiError> {
    let journey = state.storage.journeys.get(&id).await?;
    Ok(Json(journey))
}

/// Delete a journey template.
pub async fn delete_journey(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.storage.journeys.delete(&id).await? {
        return Err(ApiError::NotFound(format!("Journey not found: {}", id)));
    }
    Ok(Json(serde_json::json!({
        "message": "Journey deleted successfully"
    })))
}
