//! Backend capabilities consumed by the workflows
//!
//! Each capability is a trait so a real backend can replace the stub
//! without touching the workflow state machines.

pub mod analysis;
pub mod catalog;
pub mod enhancement;
pub mod fallback_generator;

pub use analysis::{AnalysisTicket, ProductAnalyzer, StubAnalyzer};
pub use catalog::{AnalysisLookup, SavedListingCatalog, SyntheticCatalog};
pub use enhancement::{ImageEnhancer, StubEnhancer};
pub use fallback_generator::{generate_fallback_description, generate_fallback_title};
