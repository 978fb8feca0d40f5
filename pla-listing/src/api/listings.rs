//! Saved listing read-back
//!
//! GET /api/listings/:id

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::{error::ApiResult, models::ProductListing, AppState};

/// GET /api/listings/:id
pub async fn get_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<String>,
) -> ApiResult<Json<ProductListing>> {
    let listing = state.reviews.saved_listing(&listing_id).await?;
    Ok(Json(listing))
}

pub fn listing_routes() -> Router<AppState> {
    Router::new().route("/api/listings/:id", get(get_listing))
}
