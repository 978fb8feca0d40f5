//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok")
    pub status: String,
    /// Module name ("pla-listing")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Open upload sessions
    pub upload_sessions: usize,
    /// Submitted upload sessions still answering with their final state
    pub submitted_sessions: usize,
    /// Open review sessions
    pub review_sessions: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "pla-listing".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        upload_sessions: state.uploads.session_count().await,
        submitted_sessions: state.uploads.closed_count().await,
        review_sessions: state.reviews.session_count().await,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
