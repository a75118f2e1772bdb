//! REST surface of the content board.
//!
//! Every accepted mutation is published to all live connections, the
//! originator's own tabs included — an HTTP caller has no socket of its
//! own to be excluded from.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::content::store::{ContentItem, ContentKind};
use crate::error::ServerError;
use crate::state::AppState;
use crate::uploads::routes::read_file_field;
use crate::uploads::store as files;
use crate::ws::broadcast::broadcast_to_all;
use crate::ws::protocol::ServerEvent;

#[derive(Debug, Deserialize)]
pub struct CreateTextContent {
    pub content: String,
}

/// GET /api/content — the full board in insertion order.
pub async fn list_content(State(state): State<AppState>) -> Json<Vec<ContentItem>> {
    Json(state.content.list().await)
}

/// POST /api/content/text
pub async fn add_text_content(
    State(state): State<AppState>,
    Json(body): Json<CreateTextContent>,
) -> Result<(StatusCode, Json<ContentItem>), ServerError> {
    let item = state
        .content
        .add(ContentKind::Text, body.content, None)
        .await?;

    publish_item(&state, &item);
    Ok((StatusCode::CREATED, Json(item)))
}

/// POST /api/content/image — multipart field `image`.
/// The file lands in the uploads directory and the item's `imageUrl`
/// points at its served path.
pub async fn add_image_content(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ContentItem>), ServerError> {
    let upload = read_file_field(multipart, "image").await?;

    let file_name = files::image_file_name(&upload.original_name);
    files::write_upload_file(&state.data_dir, &file_name, &upload.data)
        .await
        .map_err(|e| ServerError::Internal(format!("Failed to write image file: {e}")))?;

    let url = format!("/uploads/{file_name}");
    let item = state
        .content
        .add(ContentKind::Image, upload.original_name, Some(url))
        .await?;

    publish_item(&state, &item);
    Ok((StatusCode::CREATED, Json(item)))
}

/// DELETE /api/content/{id}
pub async fn delete_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    if !state.content.delete(&id).await? {
        return Err(ServerError::NotFound(format!("No content item with id {id}")));
    }

    broadcast_to_all(&state.connections, &ServerEvent::SyncDelete(id));
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// POST /api/content/clear
pub async fn clear_content(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ServerError> {
    state.content.clear().await?;

    broadcast_to_all(&state.connections, &ServerEvent::SyncClear);
    Ok(Json(serde_json::json!({ "cleared": true })))
}

/// The mutation is already durable at this point; a broadcast that
/// reaches nobody must not fail the request.
fn publish_item(state: &AppState, item: &ContentItem) {
    match serde_json::to_value(item) {
        Ok(payload) => broadcast_to_all(&state.connections, &ServerEvent::SyncUpdate(payload)),
        Err(e) => tracing::error!(error = %e, "Failed to encode content item for broadcast"),
    }
}
