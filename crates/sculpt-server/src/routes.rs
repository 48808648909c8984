//! Endpoint handlers
//!
//! The pipeline is fully blocking (each stage waits on an external
//! provider), so handlers run it under `spawn_blocking` and translate the
//! outcome into JSON or a file stream.

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sculpt_gen::{ArtifactDescriptor, ImageArtifact, PipelineResult};
use serde_json::json;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::error::ApiError;
use crate::schemas::{Generate3dRequest, GenerateRequest};
use crate::state::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Full prompt-to-3D run
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<PipelineResult>, ApiError> {
    let image_model = request
        .image_model
        .unwrap_or_else(|| state.default_image_model());
    let three_d_model = request
        .three_d_model
        .unwrap_or_else(|| state.default_three_d_model());

    tracing::info!(prompt = %request.prompt, %image_model, %three_d_model, "pipeline request");

    let result = run_blocking(move || {
        state
            .pipeline()
            .run_pipeline(&request.prompt, &image_model, &three_d_model)
    })
    .await?;

    Ok(Json(result))
}

/// Image stage only; accepts an optional reference image upload
pub async fn generate_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ImageArtifact>, ApiError> {
    let mut prompt = None;
    let mut image_model = None;
    let mut reference: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("prompt") => prompt = Some(field.text().await.map_err(bad_multipart)?),
            Some("image_model") => {
                image_model = Some(field.text().await.map_err(bad_multipart)?);
            }
            Some("reference") => {
                reference = Some(field.bytes().await.map_err(bad_multipart)?.to_vec());
            }
            _ => {}
        }
    }

    let prompt = prompt
        .ok_or_else(|| ApiError::BadRequest("missing required field 'prompt'".to_string()))?;
    let image_model = image_model.unwrap_or_else(|| state.default_image_model());

    tracing::info!(%prompt, %image_model, reference = reference.is_some(), "image request");

    let result = run_blocking(move || {
        state
            .pipeline()
            .generate_image(&prompt, &image_model, reference.as_deref())
    })
    .await?;

    Ok(Json(result))
}

/// 3D stage only, from a previously persisted image
pub async fn generate_3d(
    State(state): State<Arc<AppState>>,
    Json(request): Json<Generate3dRequest>,
) -> Result<Json<ArtifactDescriptor>, ApiError> {
    let three_d_model = request
        .three_d_model
        .unwrap_or_else(|| state.default_three_d_model());

    tracing::info!(image_path = %request.image_path, %three_d_model, "3D request");

    let result = run_blocking(move || {
        state
            .pipeline()
            .generate_3d(&request.image_path, &three_d_model)
    })
    .await?;

    Ok(Json(result))
}

/// Serve a stored artifact as a raw byte stream.
///
/// Meshes and point clouds can be tens of megabytes, so the file is
/// streamed rather than buffered in memory.
pub async fn serve_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let resolved = state.resolve_file(&path)?;

    let file = tokio::fs::File::open(&resolved)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to open artifact: {}", e)))?;

    let filename = resolved
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artifact")
        .to_string();

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((headers, body).into_response())
}

async fn run_blocking<T, F>(task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> sculpt_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ApiError::Internal(format!("pipeline task failed: {}", e)))?
        .map_err(ApiError::from)
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("invalid multipart body: {}", err))
}
