//! Listing workflows
//!
//! - [`upload`]: upload/edit state machine (file selection, previews, edit
//!   mode, submission gating)
//! - [`preview`]: upload validation and background preview decoding
//! - [`review`]: results review field editors, save and export
//! - [`upload_sessions`] / [`review_sessions`]: session registries that run
//!   the state machines against the backend capabilities
//! - [`registry`]: bounded, idle-expiring storage behind both

pub mod preview;
pub mod registry;
pub mod review;
pub mod review_sessions;
pub mod upload;
pub mod upload_sessions;

pub use registry::SessionRegistry;
pub use review::{FieldEditor, ReviewField, ReviewSession, ReviewSnapshot};
pub use review_sessions::ReviewSessions;
pub use upload::{UploadSnapshot, UploadWorkflow, View, WorkflowState};
pub use upload_sessions::{AddFilesOutcome, UploadSessions};

use thiserror::Error;
use uuid::Uuid;

/// Upload/edit workflow errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// Submit attempted with zero pending images; nothing was sent
    #[error("No files selected: upload at least one product image")]
    NoFilesSelected,

    /// Submit attempted while a submission is in flight
    #[error("A submission is already in progress")]
    SubmissionInFlight,

    /// The session already submitted; it accepts no further changes
    #[error("Upload session already submitted")]
    SessionClosed,

    #[error("Upload session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Image index {index} out of range (pending images: {len})")]
    InvalidIndex { index: usize, len: usize },

    /// The image at `index` has no decoded preview yet
    #[error("Preview for image {index} is still being decoded")]
    PreviewPending { index: usize },

    /// The image was removed while an enhancement for it was in flight
    #[error("Image {0} was removed before its enhancement completed")]
    ImageGone(Uuid),

    /// The upload itself is unacceptable (type, size, encoding)
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// A backend capability rejected the call; prior state is unchanged
    #[error("Service failure: {0}")]
    ServiceFailure(String),
}

/// Results review errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReviewError {
    #[error("Analysis not found: {0}")]
    NotFound(String),

    /// Price text is not a finite non-negative number
    #[error("Invalid price: {0:?}")]
    InvalidPrice(String),

    #[error("Field {0} is not being edited")]
    NotEditing(ReviewField),

    #[error("Service failure: {0}")]
    ServiceFailure(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}
