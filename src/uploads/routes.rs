//! REST surface for raw file sharing.
//!
//! POST /api/upload/file — multipart upload, field `file`
//! GET /api/upload/files — upload records, newest first
//! DELETE /api/upload/file/{url} — remove a record and its backing file

use axum::{
    extract::{Multipart, Path, State},
    Json,
};

use crate::error::ServerError;
use crate::state::AppState;
use crate::uploads::store::{self as files, UploadRecord};

/// A single file pulled out of a multipart body.
pub struct MultipartFile {
    pub original_name: String,
    pub data: Vec<u8>,
}

/// Extract the named file field from a multipart body.
pub async fn read_file_field(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<MultipartFile, ServerError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {e}")))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        let original_name = files::sanitize_file_name(field.file_name().unwrap_or("upload"));
        let data = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {e}")))?;
        return Ok(MultipartFile {
            original_name,
            data: data.to_vec(),
        });
    }

    Err(ServerError::BadRequest(format!(
        "Missing '{field_name}' field in multipart form"
    )))
}

/// POST /api/upload/file
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadRecord>, ServerError> {
    let upload = read_file_field(multipart, "file").await?;

    let file_name = files::unique_file_name(&upload.original_name);
    files::write_upload_file(&state.data_dir, &file_name, &upload.data)
        .await
        .map_err(|e| ServerError::Internal(format!("Failed to write upload file: {e}")))?;

    let url = format!("/uploads/{file_name}");
    let record = state
        .uploads
        .add(url, upload.original_name, upload.data.len() as u64)
        .await?;

    tracing::info!(url = %record.url, size = record.size_bytes, "File uploaded");
    Ok(Json(record))
}

/// GET /api/upload/files
pub async fn list_uploads(State(state): State<AppState>) -> Json<Vec<UploadRecord>> {
    Json(state.uploads.list().await)
}

/// DELETE /api/upload/file/{url}
///
/// `url` is the record's served URL, percent-encoded into one path
/// segment (e.g. `%2Fuploads%2F1712-42.png`). Removes both the record and
/// the backing file.
pub async fn delete_upload(
    State(state): State<AppState>,
    Path(url): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    if !state.uploads.delete(&url).await? {
        return Err(ServerError::NotFound(format!("No upload record for {url}")));
    }

    files::remove_upload_file(&state.data_dir, &url).await;

    tracing::info!(url = %url, "Upload deleted");
    Ok(Json(serde_json::json!({ "deleted": true })))
}
