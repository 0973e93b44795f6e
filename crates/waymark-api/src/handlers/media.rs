//! Media attachment HTTP handlers.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;

use crate::{ApiError, AppState};
use waymark_core::{detect_content_type, SweepReport};

/// Serve a stored attachment verbatim.
///
/// The content type is detected from the blob itself rather than trusted
/// from the upload; unrecognized bytes fall back to octet-stream.
pub async fn get_media(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state.storage.media.retrieve(&filename).await?;
    let content_type = detect_content_type(&filename, &data, "application/octet-stream");

    Ok(([(header::CONTENT_TYPE, content_type)], data))
}

/// Remove media blobs no thread references.
///
/// Recovery path for crashes that landed between a record write and its
/// media cleanup. Aborts without deleting anything when a thread record
/// cannot be read.
pub async fn sweep_media(State(state): State<AppState>) -> Result<Json<SweepReport>, ApiError> {
    let report = waymark_store::sweep_orphaned_media(&state.storage.threads).await?;
    info!(
        scanned = report.scanned,
        referenced = report.referenced,
        removed = report.removed,
        "Media sweep complete"
    );
    Ok(Json(report))
}
