//! Message mutation HTTP handlers.
//!
//! Append and edit accept multipart/form-data so attachments ride along
//! with the text fields. Attachment parts may be named `files` or
//! `files[]`; both conventions appear in frontend FormData code.

use std::str::FromStr;

use axum::extract::{Multipart, Path, State};
use axum::Json;

use crate::{ApiError, AppState};
use waymark_core::{Message, MessageRole};
use waymark_store::MediaUpload;

/// Text fields and attachments pulled out of a multipart request.
#[derive(Default)]
struct MessageForm {
    content: Option<String>,
    role: Option<String>,
    message_id: Option<String>,
    files: Vec<MediaUpload>,
}

/// Drain a multipart stream into text fields and attachment uploads.
async fn read_message_form(mut multipart: Multipart) -> Result<MessageForm, ApiError> {
    let mut form = MessageForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let field_name = field.name().map(|n| n.to_string());
        match field_name.as_deref() {
            Some("content") => {
                form.content = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?,
                );
            }
            Some("role") => {
                form.role = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?,
                );
            }
            Some("message_id") => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;
                if !val.trim().is_empty() {
                    form.message_id = Some(val.trim().to_string());
                }
            }
            Some("files") | Some("files[]") => {
                let filename = field.file_name().map(|f| f.to_string()).unwrap_or_default();
                let content_type = field
                    .content_type()
                    .map(|c| c.to_string())
                    .unwrap_or_default();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?
                    .to_vec();
                form.files.push(MediaUpload {
                    filename,
                    content_type,
                    data,
                });
            }
            _ => {} // ignore unknown fields
        }
    }

    Ok(form)
}

/// Append a message to a thread.
///
/// # Multipart Fields
/// - `content`: message text (required)
/// - `role`: `user` or `assistant` (required)
/// - `message_id`: caller-supplied id for idempotent retry (optional)
/// - `files`: attachments, repeated (optional)
///
/// Retrying with the same `message_id` returns the already-appended
/// message without storing the attachments again.
pub async fn append_message(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Message>, ApiError> {
    let form = read_message_form(multipart).await?;

    let content = form
        .content
        .ok_or_else(|| ApiError::BadRequest("Missing content field".to_string()))?;
    let role = form
        .role
        .ok_or_else(|| ApiError::BadRequest("Missing role field".to_string()))?;
    let role = MessageRole::from_str(&role).map_err(ApiError::BadRequest)?;

    let message = state
        .storage
        .threads
        .append_message(&thread_id, role, content, form.message_id, &form.files)
        .await?;
    Ok(Json(message))
}

/// Edit a message, discarding every later message in the thread.
///
/// # Multipart Fields
/// - `content`: replacement text (required)
/// - `files`: replacement attachments, repeated (optional; when absent
///   the message keeps its existing attachments)
///
/// The edited message keeps its role and visibility.
pub async fn edit_message(
    State(state): State<AppState>,
    Path((thread_id, message_id)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Json<Message>, ApiError> {
    let form = read_message_form(multipart).await?;

    let content = form
        .content
        .ok_or_else(|| ApiError::BadRequest("Missing content field".to_string()))?;

    let message = state
        .storage
        .threads
        .edit_message(&thread_id, &message_id, content, &form.files)
        .await?;
    Ok(Json(message))
}

/// Delete a single message and release its attachments.
///
/// Later messages are kept; deletion does not truncate like edit does.
pub async fn delete_message(
    State(state): State<AppState>,
    Path((thread_id, message_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .storage
        .threads
        .delete_message(&thread_id, &message_id)
        .await?;
    Ok(Json(serde_json::json!({
        "message": "Message deleted successfully"
    })))
}
