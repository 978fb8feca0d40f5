//! Results review API handlers
//!
//! `:field` is one of `title`, `description`, `price`.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    error::ApiResult,
    models::ProductListing,
    workflow::{ReviewField, ReviewSnapshot},
    AppState,
};

/// PUT /api/reviews/:analysis_id/fields/:field request
#[derive(Debug, Deserialize)]
pub struct UpdateFieldRequest {
    pub value: String,
}

/// POST /api/reviews/:analysis_id
///
/// Fetch the analysis by identifier and start a review. Re-opening an
/// existing review discards its unsaved edits.
pub async fn open_review(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
) -> ApiResult<Json<ReviewSnapshot>> {
    Ok(Json(state.reviews.open(&analysis_id).await?))
}

/// GET /api/reviews/:analysis_id
pub async fn get_review(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
) -> ApiResult<Json<ReviewSnapshot>> {
    Ok(Json(state.reviews.snapshot(&analysis_id).await?))
}

/// POST /api/reviews/:analysis_id/fields/:field/edit
pub async fn start_edit(
    State(state): State<AppState>,
    Path((analysis_id, field)): Path<(String, ReviewField)>,
) -> ApiResult<Json<ReviewSnapshot>> {
    Ok(Json(state.reviews.start_edit(&analysis_id, field).await?))
}

/// PUT /api/reviews/:analysis_id/fields/:field
pub async fn update_field(
    State(state): State<AppState>,
    Path((analysis_id, field)): Path<(String, ReviewField)>,
    Json(request): Json<UpdateFieldRequest>,
) -> ApiResult<Json<ReviewSnapshot>> {
    Ok(Json(
        state
            .reviews
            .update(&analysis_id, field, request.value)
            .await?,
    ))
}

/// POST /api/reviews/:analysis_id/fields/:field/confirm
pub async fn confirm_field(
    State(state): State<AppState>,
    Path((analysis_id, field)): Path<(String, ReviewField)>,
) -> ApiResult<Json<ReviewSnapshot>> {
    Ok(Json(state.reviews.confirm(&analysis_id, field).await?))
}

/// POST /api/reviews/:analysis_id/fields/:field/cancel
pub async fn cancel_field(
    State(state): State<AppState>,
    Path((analysis_id, field)): Path<(String, ReviewField)>,
) -> ApiResult<Json<ReviewSnapshot>> {
    Ok(Json(state.reviews.cancel(&analysis_id, field).await?))
}

/// POST /api/reviews/:analysis_id/save
pub async fn save_listing(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
) -> ApiResult<Json<ProductListing>> {
    Ok(Json(state.reviews.save(&analysis_id).await?))
}

/// GET /api/reviews/:analysis_id/export
///
/// Downloads `product-listing-<id>.json`.
pub async fn export_listing(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let (file_name, body) = state.reviews.export(&analysis_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    ))
}

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/reviews/:analysis_id",
            get(get_review).post(open_review),
        )
        .route(
            "/api/reviews/:analysis_id/fields/:field",
            put(update_field),
        )
        .route(
            "/api/reviews/:analysis_id/fields/:field/edit",
            post(start_edit),
        )
        .route(
            "/api/reviews/:analysis_id/fields/:field/confirm",
            post(confirm_field),
        )
        .route(
            "/api/reviews/:analysis_id/fields/:field/cancel",
            post(cancel_field),
        )
        .route("/api/reviews/:analysis_id/save", post(save_listing))
        .route("/api/reviews/:analysis_id/export", get(export_listing))
}
