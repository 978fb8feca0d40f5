//! Upload/edit workflow API handlers
//!
//! Sessions are created empty; files arrive as base64 JSON payloads. Every
//! handler returns the session snapshot after the transition so the client
//! can render without a second round trip.

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use futures::future::join_all;
use pla_common::config::UploadConfig;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{EnhancementSettings, UploadedFile},
    workflow::{
        preview::{decode_payload, validate_upload},
        UploadSnapshot,
    },
    AppState,
};

/// Room per file for the name, the `data:` prefix and JSON punctuation
const PER_FILE_OVERHEAD: usize = 1024;

/// Room for the request envelope around the file list
const REQUEST_OVERHEAD: usize = 4096;

/// Largest AddFiles body that can carry `max_files_per_request` files of
/// `max_file_bytes` each, once base64 encoded
pub fn add_files_body_limit(config: &UploadConfig) -> usize {
    let per_file = config.max_file_bytes.div_ceil(3).saturating_mul(4) + PER_FILE_OVERHEAD;
    per_file
        .saturating_mul(config.max_files_per_request.max(1))
        .saturating_add(REQUEST_OVERHEAD)
}

/// One file in an AddFiles request
#[derive(Debug, Deserialize)]
pub struct FilePayload {
    pub name: String,
    /// Base64 content, bare or as a `data:` URL
    pub data: String,
}

/// POST /api/uploads/:session_id/files request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFilesRequest {
    pub files: Vec<FilePayload>,
    /// Respond only after every preview is decoded
    #[serde(default)]
    pub wait_for_previews: bool,
}

/// POST /api/uploads/:session_id/files response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFilesResponse {
    pub image_ids: Vec<Uuid>,
    pub session: UploadSnapshot,
}

/// POST /api/uploads/:session_id/files/:index/enhance response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceResponse {
    pub enhanced_image_url: String,
    pub session: UploadSnapshot,
}

/// POST /api/uploads/:session_id/submit response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub analysis_id: String,
    /// Where the client goes next
    pub review_url: String,
}

/// POST /api/uploads
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<UploadSnapshot>) {
    (StatusCode::CREATED, Json(state.uploads.create().await))
}

/// GET /api/uploads/:session_id
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<UploadSnapshot>> {
    Ok(Json(state.uploads.snapshot(session_id).await?))
}

/// DELETE /api/uploads/:session_id
pub async fn discard_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.uploads.discard(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/uploads/:session_id/files
///
/// All files are validated before any is added: one bad file rejects the
/// whole request. A body over [`add_files_body_limit`] is a 413.
pub async fn add_files(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    payload: Result<Json<AddFilesRequest>, JsonRejection>,
) -> ApiResult<Json<AddFilesResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(
            session_id = %session_id,
            status = %rejection.status(),
            "AddFiles body rejected"
        );
        ApiError::from(rejection)
    })?;

    let limits = &state.upload_limits;
    if request.files.len() > limits.max_files_per_request {
        return Err(ApiError::BadRequest(format!(
            "Too many files: {} (at most {} per request)",
            request.files.len(),
            limits.max_files_per_request
        )));
    }

    let files = request
        .files
        .iter()
        .map(|file| {
            let bytes = decode_payload(&file.name, &file.data)?;
            validate_upload(&file.name, bytes, limits.max_file_bytes)
        })
        .collect::<Result<Vec<UploadedFile>, _>>()?;

    let outcome = state.uploads.add_files(session_id, files).await?;

    if request.wait_for_previews {
        for result in join_all(outcome.decoding).await {
            if let Err(e) = result {
                tracing::warn!(session_id = %session_id, error = %e, "Preview task panicked");
            }
        }
    }

    Ok(Json(AddFilesResponse {
        image_ids: outcome.image_ids,
        session: state.uploads.snapshot(session_id).await?,
    }))
}

/// DELETE /api/uploads/:session_id/files/:index
pub async fn remove_file(
    State(state): State<AppState>,
    Path((session_id, index)): Path<(Uuid, usize)>,
) -> ApiResult<Json<UploadSnapshot>> {
    Ok(Json(state.uploads.remove_file(session_id, index).await?))
}

/// POST /api/uploads/:session_id/select/:index
pub async fn select_for_edit(
    State(state): State<AppState>,
    Path((session_id, index)): Path<(Uuid, usize)>,
) -> ApiResult<Json<UploadSnapshot>> {
    Ok(Json(state.uploads.select_for_edit(session_id, index).await?))
}

/// POST /api/uploads/:session_id/preview
pub async fn view_preview(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<UploadSnapshot>> {
    Ok(Json(state.uploads.view_preview(session_id).await?))
}

/// POST /api/uploads/:session_id/files/:index/enhance
///
/// Body: `{"mode": "auto"}` or
/// `{"mode": "custom", "brightness": 150, "contrast": 100, "saturation": 100}`
pub async fn apply_enhancement(
    State(state): State<AppState>,
    Path((session_id, index)): Path<(Uuid, usize)>,
    Json(settings): Json<EnhancementSettings>,
) -> ApiResult<Json<EnhanceResponse>> {
    let enhanced = state
        .uploads
        .apply_enhancement(session_id, index, settings)
        .await?;

    Ok(Json(EnhanceResponse {
        enhanced_image_url: enhanced.enhanced_image_url,
        session: state.uploads.snapshot(session_id).await?,
    }))
}

/// DELETE /api/uploads/:session_id/files/:index/enhance
pub async fn reset_enhancement(
    State(state): State<AppState>,
    Path((session_id, index)): Path<(Uuid, usize)>,
) -> ApiResult<Json<UploadSnapshot>> {
    Ok(Json(state.uploads.reset_enhancement(session_id, index).await?))
}

/// POST /api/uploads/:session_id/submit
pub async fn submit(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SubmitResponse>> {
    let ticket = state.uploads.submit(session_id).await?;

    Ok(Json(SubmitResponse {
        review_url: format!("/api/reviews/{}", ticket.id),
        analysis_id: ticket.id,
    }))
}

/// Upload routes; `body_limit` caps the AddFiles request body
pub fn upload_routes(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/api/uploads", post(create_session))
        .route(
            "/api/uploads/:session_id",
            get(get_session).delete(discard_session),
        )
        .route(
            "/api/uploads/:session_id/files",
            post(add_files).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/uploads/:session_id/files/:index", delete(remove_file))
        .route(
            "/api/uploads/:session_id/files/:index/enhance",
            post(apply_enhancement).delete(reset_enhancement),
        )
        .route("/api/uploads/:session_id/select/:index", post(select_for_edit))
        .route("/api/uploads/:session_id/preview", post(view_preview))
        .route("/api/uploads/:session_id/submit", post(submit))
}
