//! Images waiting for analysis

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A validated upload, before it joins a session
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    /// MIME type sniffed from the content
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// A user-selected image awaiting analysis
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingImage {
    /// Stable identity; indices shift on removal, ids do not
    pub id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: usize,
    /// Data URL of the original image, set once background decoding finishes
    pub preview: Option<String>,
    /// Enhanced variant, set by the enhancement step
    pub edited_preview: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl PendingImage {
    pub fn from_upload(file: &UploadedFile) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file.file_name.clone(),
            mime_type: file.mime_type.clone(),
            size_bytes: file.bytes.len(),
            preview: None,
            edited_preview: None,
            added_at: Utc::now(),
        }
    }

    pub fn is_enhanced(&self) -> bool {
        self.edited_preview.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Edited preview when non-empty, else the raw preview
    pub fn effective_preview(&self) -> Option<&str> {
        if self.is_enhanced() {
            self.edited_preview.as_deref()
        } else {
            self.preview.as_deref()
        }
    }
}
