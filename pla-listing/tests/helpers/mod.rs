//! Shared test fixtures: recording backends and request helpers

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pla_common::config::TomlConfig;
use pla_common::events::EventBus;
use pla_common::{Error, Result};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use pla_listing::db::{InMemoryListingStore, ListingStore};
use pla_listing::models::{EnhancedImage, EnhancementRequest};
use pla_listing::services::{
    AnalysisTicket, AnalysisLookup, ImageEnhancer, ProductAnalyzer, StubAnalyzer, SyntheticCatalog,
};
use pla_listing::workflow::preview::encode_data_url;
use pla_listing::{build_router, AppState, Backends};

/// Smallest byte sequence `infer` recognizes as PNG
pub const PNG_BYTES: [u8; 16] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

/// PNG of `len` bytes: the signature followed by zero padding
pub fn png_of_len(len: usize) -> Vec<u8> {
    let mut bytes = PNG_BYTES.to_vec();
    bytes.resize(len.max(PNG_BYTES.len()), 0);
    bytes
}

/// Analyzer that records every reference it is asked to analyze
#[derive(Default)]
pub struct RecordingAnalyzer {
    pub calls: Mutex<Vec<String>>,
    inner: StubAnalyzer,
}

impl RecordingAnalyzer {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProductAnalyzer for RecordingAnalyzer {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn analyze(&self, image_reference: &str) -> Result<AnalysisTicket> {
        self.calls.lock().unwrap().push(image_reference.to_string());
        self.inner.analyze(image_reference).await
    }
}

/// Analyzer that always fails
pub struct FailingAnalyzer;

#[async_trait]
impl ProductAnalyzer for FailingAnalyzer {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn analyze(&self, _image_reference: &str) -> Result<AnalysisTicket> {
        Err(Error::Service("analysis backend unavailable".to_string()))
    }
}

/// Enhancer that records requests and sleeps `brightness` milliseconds
///
/// The brightness-dependent delay lets tests order overlapping enhancements.
#[derive(Default)]
pub struct RecordingEnhancer {
    pub requests: Mutex<Vec<EnhancementRequest>>,
}

impl RecordingEnhancer {
    pub fn requests(&self) -> Vec<EnhancementRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageEnhancer for RecordingEnhancer {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn enhance(&self, request: &EnhancementRequest) -> Result<EnhancedImage> {
        self.requests.lock().unwrap().push(request.clone());
        let delay = request.brightness.max(0) as u64;
        tokio::time::sleep(Duration::from_millis(delay)).await;

        let n = self.requests.lock().unwrap().len();
        Ok(EnhancedImage {
            enhanced_image_url: format!(
                "{}?enhanced=true&id={}",
                request.source_image_reference, n
            ),
        })
    }
}

/// Enhancer that always fails
pub struct FailingEnhancer;

#[async_trait]
impl ImageEnhancer for FailingEnhancer {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn enhance(&self, _request: &EnhancementRequest) -> Result<EnhancedImage> {
        Err(Error::Service("enhancement backend unavailable".to_string()))
    }
}

/// Router plus handles on the backends behind it
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub analyzer: Arc<RecordingAnalyzer>,
    pub enhancer: Arc<RecordingEnhancer>,
    pub store: Arc<dyn ListingStore>,
}

impl TestApp {
    /// Zero-latency in-memory app with recording backends and default limits
    pub fn new() -> Self {
        Self::with_config(TomlConfig::default())
    }

    pub fn with_store(store: Arc<dyn ListingStore>) -> Self {
        Self::build(store, TomlConfig::default())
    }

    /// Recording backends under the given upload and session limits
    pub fn with_config(config: TomlConfig) -> Self {
        Self::build(Arc::new(InMemoryListingStore::new()), config)
    }

    fn build(store: Arc<dyn ListingStore>, config: TomlConfig) -> Self {
        let analyzer = Arc::new(RecordingAnalyzer::default());
        let enhancer = Arc::new(RecordingEnhancer::default());
        let backends = Backends {
            analyzer: analyzer.clone(),
            enhancer: enhancer.clone(),
            lookup: Arc::new(SyntheticCatalog::new()),
            store: store.clone(),
        };
        Self::from_backends(backends, analyzer, enhancer, &config)
    }

    pub fn with_backends(
        analyzer: Arc<dyn ProductAnalyzer>,
        enhancer: Arc<dyn ImageEnhancer>,
        lookup: Arc<dyn AnalysisLookup>,
    ) -> Self {
        let backends = Backends {
            analyzer,
            enhancer,
            lookup,
            store: Arc::new(InMemoryListingStore::new()),
        };
        Self::from_backends(
            backends,
            Arc::new(RecordingAnalyzer::default()),
            Arc::new(RecordingEnhancer::default()),
            &TomlConfig::default(),
        )
    }

    fn from_backends(
        backends: Backends,
        analyzer: Arc<RecordingAnalyzer>,
        enhancer: Arc<RecordingEnhancer>,
        config: &TomlConfig,
    ) -> Self {
        let store = backends.store.clone();
        let state = AppState::new(backends, EventBus::new(100), config);
        Self {
            router: build_router(state.clone()),
            state,
            analyzer,
            enhancer,
            store,
        }
    }

    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.dispatch(request).await
    }

    /// Send a prepared request; the body must be JSON or empty
    pub async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// New upload session id
    pub async fn create_session(&self) -> String {
        let (status, body) = self.send("POST", "/api/uploads", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["sessionId"].as_str().unwrap().to_string()
    }

    /// Add `count` PNG files and wait for their previews
    pub async fn add_pngs(&self, session_id: &str, count: usize) -> Value {
        let files: Vec<Value> = (0..count)
            .map(|i| {
                json!({
                    "name": format!("product-{}.png", i),
                    "data": encode_data_url("image/png", &PNG_BYTES),
                })
            })
            .collect();

        let (status, body) = self
            .send(
                "POST",
                &format!("/api/uploads/{}/files", session_id),
                Some(json!({ "files": files, "waitForPreviews": true })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "add files failed: {}", body);
        body
    }

    /// Upload one file, submit it and return the analysis id
    pub async fn submit_one(&self) -> String {
        let session_id = self.create_session().await;
        self.add_pngs(&session_id, 1).await;
        let (status, body) = self
            .send("POST", &format!("/api/uploads/{}/submit", session_id), None)
            .await;
        assert_eq!(status, StatusCode::OK, "submit failed: {}", body);
        body["analysisId"].as_str().unwrap().to_string()
    }
}
