//! Request handlers.

use super::error::ApiError;
use super::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use ragdesk_knowledge::{AskRequest, AskResponse, IngestReport};
use serde_json::{json, Value};

pub async fn banner() -> &'static str {
    "ragdesk RAG server is running"
}

pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Stage and index the `file` field of a multipart form.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestReport>, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("upload")
            .to_string();
        let bytes = field.bytes().await?;
        if bytes.len() > state.max_upload_bytes {
            return Err(ApiError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!(
                    "File too large: {} bytes (limit {})",
                    bytes.len(),
                    state.max_upload_bytes
                ),
            ));
        }
        upload = Some((file_name, bytes));
    }

    let (file_name, bytes) = upload.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    tracing::info!("Upload received: {} ({} bytes)", file_name, bytes.len());

    let report = state.pipeline.ingest_upload(&bytes, &file_name).await?;
    Ok(Json(report))
}

pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(request) = payload?;
    let response = state.pipeline.ask(request).await?;
    Ok(Json(response))
}
