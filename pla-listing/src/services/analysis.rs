//! Product analysis capability
//!
//! A real implementation would send the image to a vision/labeling service
//! and persist the detected labels under the returned identifier. The stub
//! performs no analysis and only mints an identifier.

use async_trait::async_trait;
use pla_common::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of stub analysis identifiers
pub const ANALYSIS_ID_LEN: usize = 13;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Opaque identifier handed to the review workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisTicket {
    pub id: String,
}

#[async_trait]
pub trait ProductAnalyzer: Send + Sync {
    /// Analyzer name for logging
    fn name(&self) -> &'static str;

    async fn analyze(&self, image_reference: &str) -> Result<AnalysisTicket>;
}

/// Mints a random base-36 identifier, synchronously
#[derive(Debug, Default, Clone)]
pub struct StubAnalyzer;

impl StubAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProductAnalyzer for StubAnalyzer {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn analyze(&self, image_reference: &str) -> Result<AnalysisTicket> {
        if image_reference.is_empty() {
            return Err(Error::InvalidInput("empty image reference".to_string()));
        }

        let mut rng = rand::thread_rng();
        let id: String = (0..ANALYSIS_ID_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();

        tracing::debug!(analysis_id = %id, "Stub analysis issued identifier");
        Ok(AnalysisTicket { id })
    }
}
