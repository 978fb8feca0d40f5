//! pla-listing library interface for testing
//!
//! Exposes public APIs for integration testing

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use pla_common::config::{SessionsConfig, TomlConfig, UploadConfig};
use pla_common::events::EventBus;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::db::ListingStore;
use crate::services::{AnalysisLookup, ImageEnhancer, ProductAnalyzer};
use crate::workflow::{ReviewSessions, UploadSessions};

/// Backend capabilities the workflows run against
#[derive(Clone)]
pub struct Backends {
    pub analyzer: Arc<dyn ProductAnalyzer>,
    pub enhancer: Arc<dyn ImageEnhancer>,
    pub lookup: Arc<dyn AnalysisLookup>,
    pub store: Arc<dyn ListingStore>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Upload/edit sessions keyed by session id
    pub uploads: UploadSessions,
    /// Review sessions keyed by analysis id
    pub reviews: ReviewSessions,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Per-file and per-request upload limits
    pub upload_limits: UploadConfig,
    /// Session capacity and idle expiry
    pub session_limits: SessionsConfig,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(backends: Backends, event_bus: EventBus, config: &TomlConfig) -> Self {
        let capacity = config.sessions.capacity;
        Self {
            uploads: UploadSessions::new(
                backends.analyzer,
                backends.enhancer,
                event_bus.clone(),
                capacity,
            ),
            reviews: ReviewSessions::new(
                backends.lookup,
                backends.store,
                event_bus.clone(),
                capacity,
            ),
            event_bus,
            upload_limits: config.uploads.clone(),
            session_limits: config.sessions.clone(),
            startup_time: Utc::now(),
        }
    }

    /// Drop idle upload and review sessions every sweep interval
    ///
    /// The task runs until aborted or the runtime shuts down.
    pub fn spawn_session_sweeper(&self) -> JoinHandle<()> {
        let uploads = self.uploads.clone();
        let reviews = self.reviews.clone();
        let idle = self.session_limits.idle_timeout();
        let every = self.session_limits.sweep_interval().max(std::time::Duration::from_secs(1));

        info!(
            "Starting session sweeper (idle timeout: {}s, interval: {}s)",
            idle.as_secs(),
            every.as_secs()
        );

        tokio::spawn(async move {
            let mut timer = interval(every);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                timer.tick().await;
                let uploads_dropped = uploads.sweep_idle(idle).await;
                let reviews_dropped = reviews.sweep_idle(idle).await;
                if uploads_dropped + reviews_dropped > 0 {
                    info!(uploads_dropped, reviews_dropped, "Swept idle sessions");
                } else {
                    debug!("Session sweep found nothing idle");
                }
            }
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::upload_routes(api::add_files_body_limit(&state.upload_limits)))
        .merge(api::review_routes())
        .merge(api::listing_routes())
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
