//! Upload validation and background preview decoding
//!
//! Decoding is fire-and-forget: one task per file, each carrying the
//! destination image id captured when the file was added. Completion order
//! does not matter, and a result for an image removed in the meantime is
//! dropped.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use pla_common::events::{EventBus, PlaEvent};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::upload_sessions::SessionHandle;
use super::WorkflowError;
use crate::models::UploadedFile;

/// Content types accepted for upload
pub const ACCEPTED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Validate raw upload bytes and sniff their type from content
pub fn validate_upload(
    file_name: &str,
    bytes: Vec<u8>,
    max_file_bytes: usize,
) -> Result<UploadedFile, WorkflowError> {
    if bytes.is_empty() {
        return Err(WorkflowError::InvalidUpload(format!("{} is empty", file_name)));
    }
    if bytes.len() > max_file_bytes {
        return Err(WorkflowError::InvalidUpload(format!(
            "{} is {} bytes (limit {})",
            file_name,
            bytes.len(),
            max_file_bytes
        )));
    }

    let mime_type = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .filter(|mime| ACCEPTED_MIME_TYPES.contains(mime))
        .ok_or_else(|| {
            WorkflowError::InvalidUpload(format!(
                "{} is not a supported image (JPG, PNG, WEBP, GIF)",
                file_name
            ))
        })?;

    Ok(UploadedFile {
        file_name: file_name.to_string(),
        mime_type: mime_type.to_string(),
        bytes,
    })
}

/// Decode a base64 request payload
pub fn decode_payload(file_name: &str, data: &str) -> Result<Vec<u8>, WorkflowError> {
    // Accept a full data URL as well as bare base64
    let encoded = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| WorkflowError::InvalidUpload(format!("{}: invalid base64: {}", file_name, e)))
}

/// `data:<mime>;base64,<payload>`
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Decode one file off the async workers and attach it to `image_id`
pub fn spawn_preview_decoding(
    session: SessionHandle,
    session_id: Uuid,
    image_id: Uuid,
    file: UploadedFile,
    event_bus: EventBus,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let preview = match tokio::task::spawn_blocking(move || {
            encode_data_url(&file.mime_type, &file.bytes)
        })
        .await
        {
            Ok(preview) => preview,
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    image_id = %image_id,
                    error = %e,
                    "Preview decoding task failed"
                );
                return;
            }
        };

        let attached = session.lock().await.attach_preview(image_id, preview);
        if attached {
            debug!(session_id = %session_id, image_id = %image_id, "Preview ready");
            event_bus.emit_lossy(PlaEvent::PreviewReady {
                session_id,
                image_id,
                timestamp: Utc::now(),
            });
        } else {
            debug!(
                session_id = %session_id,
                image_id = %image_id,
                "Image removed before preview was ready, dropping preview"
            );
        }
    })
}
