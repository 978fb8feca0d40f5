//! # PLA Common Library
//!
//! Shared code for the Product Listing Accelerator services:
//! - Error and result types
//! - Bootstrap configuration (TOML + environment + compiled defaults)
//! - Event types (PlaEvent enum) and the broadcast EventBus
//! - Server-Sent Events helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
pub use events::{EventBus, PlaEvent};
