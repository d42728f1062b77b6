//! File routes
//!
//! Endpoints:
//! - POST /files - Upload a file (multipart field `file`), returns its hash
//! - GET /files/:hash - Download stored content
//! - GET /files/:hash/meta - Stored record for a hash
//! - DELETE /files/:hash - Remove stored content

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::ContentRecord;

/// Multipart field carrying the upload
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Create the files router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/files", post(upload_file))
        .route("/files/:hash", get(retrieve_file).delete(delete_file))
        .route("/files/:hash/meta", get(file_metadata))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// Hashes that could never have come from this store's hasher are rejected
/// up front rather than looked up
fn ensure_well_formed(state: &AppState, hash: &str) -> Result<()> {
    if state.store().hasher().is_well_formed(hash) {
        Ok(())
    } else {
        Err(AppError::NotFound("File not found".to_string()))
    }
}

/// POST /files
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(AppError::BadRequest(
                "No file selected for uploading".to_string(),
            ));
        }

        let data = field.bytes().await.map_err(multipart_error)?;
        let file_hash = state.store().store(&data, &file_name).await?;

        tracing::debug!(
            file_hash = %file_hash,
            file_name = %file_name,
            size = data.len(),
            "Upload complete"
        );

        return Ok(Json(UploadResponse { file_hash }));
    }

    Err(AppError::BadRequest(
        "No file part in the request".to_string(),
    ))
}

/// GET /files/:hash
async fn retrieve_file(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Response> {
    ensure_well_formed(&state, &hash)?;
    let (record, data) = state.store().open(&hash).await?;

    let content_type = mime_guess::from_path(&record.file_name)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, data.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", record.file_name),
        )
        .header(header::ETAG, format!("\"{}\"", record.hash))
        // Content under a hash never changes
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// GET /files/:hash/meta
async fn file_metadata(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<ContentRecord>> {
    ensure_well_formed(&state, &hash)?;
    state
        .store()
        .stat(&hash)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))
}

/// DELETE /files/:hash
async fn delete_file(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<MessageResponse>> {
    ensure_well_formed(&state, &hash)?;
    if state.store().remove(&hash).await? {
        Ok(Json(MessageResponse {
            message: "deleted".to_string(),
        }))
    } else {
        Err(AppError::NotFound("File not found".to_string()))
    }
}
