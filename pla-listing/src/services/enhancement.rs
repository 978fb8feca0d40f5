//! Image enhancement capability
//!
//! A real implementation would post the image and adjustment parameters to
//! an image-processing service. The stub waits a fixed latency and tags the
//! source reference as enhanced.

use async_trait::async_trait;
use pla_common::{Error, Result};
use std::time::Duration;
use uuid::Uuid;

use crate::models::{EnhancedImage, EnhancementRequest};

/// Query marker carried by every stub-enhanced reference
pub const ENHANCED_MARKER: &str = "enhanced=true";

#[async_trait]
pub trait ImageEnhancer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn enhance(&self, request: &EnhancementRequest) -> Result<EnhancedImage>;
}

/// Returns `<source>?enhanced=true&id=<uuid>` after `latency`
#[derive(Debug, Clone)]
pub struct StubEnhancer {
    latency: Duration,
}

impl StubEnhancer {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for StubEnhancer {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

#[async_trait]
impl ImageEnhancer for StubEnhancer {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn enhance(&self, request: &EnhancementRequest) -> Result<EnhancedImage> {
        let invalid = request.out_of_range_offsets();
        if !invalid.is_empty() {
            let detail: Vec<String> = invalid
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect();
            return Err(Error::InvalidInput(format!(
                "adjustment offsets must be within [-100, 100]: {}",
                detail.join(", ")
            )));
        }
        if request.source_image_reference.is_empty() {
            return Err(Error::InvalidInput("empty source image reference".to_string()));
        }

        tokio::time::sleep(self.latency).await;

        let enhanced_image_url = format!(
            "{}?{}&id={}",
            request.source_image_reference,
            ENHANCED_MARKER,
            Uuid::new_v4()
        );
        Ok(EnhancedImage { enhanced_image_url })
    }
}
