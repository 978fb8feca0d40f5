//! HTTP API handlers for pla-listing
//!
//! JSON over HTTP for both workflows, plus an SSE stream carrying workflow
//! events and user-visible notifications.

pub mod health;
pub mod listings;
pub mod reviews;
pub mod sse;
pub mod uploads;

pub use health::health_routes;
pub use listings::listing_routes;
pub use reviews::review_routes;
pub use sse::event_stream;
pub use uploads::{add_files_body_limit, upload_routes};
