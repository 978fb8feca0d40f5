//! Upload session registry
//!
//! Runs [`UploadWorkflow`] transitions against the analysis and enhancement
//! backends. No session lock is held across a backend call: inputs are
//! captured under the lock, the lock is released for the call, and the
//! result is committed under a fresh lock.
//!
//! A session leaves the live registry once it is submitted. Its final
//! snapshot, without image data, stays behind as a tombstone so later
//! requests still see `Submitted` and are refused with `SessionClosed`.

use chrono::Utc;
use pla_common::events::{EventBus, PlaEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::preview::spawn_preview_decoding;
use super::registry::SessionRegistry;
use super::upload::{UploadSnapshot, UploadWorkflow};
use super::WorkflowError;
use crate::models::{EnhancedImage, EnhancementSettings, UploadedFile};
use crate::services::{AnalysisTicket, ImageEnhancer, ProductAnalyzer};

pub type SessionHandle = Arc<Mutex<UploadWorkflow>>;

/// Result of `AddFiles`
#[derive(Debug)]
pub struct AddFilesOutcome {
    pub image_ids: Vec<Uuid>,
    /// Preview decoding tasks; dropping them leaves decoding running
    pub decoding: Vec<JoinHandle<()>>,
}

#[derive(Clone)]
pub struct UploadSessions {
    sessions: SessionRegistry<Uuid, SessionHandle>,
    /// Final snapshots of submitted sessions
    closed: SessionRegistry<Uuid, UploadSnapshot>,
    analyzer: Arc<dyn ProductAnalyzer>,
    enhancer: Arc<dyn ImageEnhancer>,
    event_bus: EventBus,
}

impl UploadSessions {
    pub fn new(
        analyzer: Arc<dyn ProductAnalyzer>,
        enhancer: Arc<dyn ImageEnhancer>,
        event_bus: EventBus,
        capacity: usize,
    ) -> Self {
        Self {
            sessions: SessionRegistry::new(capacity),
            closed: SessionRegistry::new(capacity),
            analyzer,
            enhancer,
            event_bus,
        }
    }

    pub async fn create(&self) -> UploadSnapshot {
        let session_id = Uuid::new_v4();
        let workflow = UploadWorkflow::new(session_id);
        let snapshot = workflow.snapshot();

        self.sessions
            .insert(session_id, Arc::new(Mutex::new(workflow)))
            .await;

        info!(session_id = %session_id, "Upload session created");
        self.event_bus.emit_lossy(PlaEvent::UploadSessionCreated {
            session_id,
            timestamp: Utc::now(),
        });
        snapshot
    }

    async fn handle(&self, session_id: Uuid) -> Result<SessionHandle, WorkflowError> {
        if let Some(session) = self.sessions.get(&session_id).await {
            return Ok(session);
        }
        if self.closed.get(&session_id).await.is_some() {
            return Err(WorkflowError::SessionClosed);
        }
        Err(WorkflowError::SessionNotFound(session_id))
    }

    pub async fn snapshot(&self, session_id: Uuid) -> Result<UploadSnapshot, WorkflowError> {
        match self.handle(session_id).await {
            Ok(session) => {
                let snapshot = session.lock().await.snapshot();
                Ok(snapshot)
            }
            Err(WorkflowError::SessionClosed) => self
                .closed
                .get(&session_id)
                .await
                .ok_or(WorkflowError::SessionNotFound(session_id)),
            Err(e) => Err(e),
        }
    }

    pub async fn discard(&self, session_id: Uuid) -> Result<(), WorkflowError> {
        let live = self.sessions.remove(&session_id).await.is_some();
        let closed = self.closed.remove(&session_id).await.is_some();
        if live || closed {
            info!(session_id = %session_id, "Upload session discarded");
            Ok(())
        } else {
            Err(WorkflowError::SessionNotFound(session_id))
        }
    }

    /// Live (not yet submitted) sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.len().await
    }

    /// Tombstones of submitted sessions
    pub async fn closed_count(&self) -> usize {
        self.closed.len().await
    }

    /// Drop sessions and tombstones idle for longer than `idle`
    pub async fn sweep_idle(&self, idle: Duration) -> usize {
        self.sessions.sweep_idle(idle).await + self.closed.sweep_idle(idle).await
    }

    /// Append files and start decoding their previews
    ///
    /// Returns as soon as the images are in the pending list.
    pub async fn add_files(
        &self,
        session_id: Uuid,
        files: Vec<UploadedFile>,
    ) -> Result<AddFilesOutcome, WorkflowError> {
        let session = self.handle(session_id).await?;
        let image_ids = session.lock().await.add_files(&files)?;

        let decoding = image_ids
            .iter()
            .zip(files)
            .map(|(image_id, file)| {
                spawn_preview_decoding(
                    session.clone(),
                    session_id,
                    *image_id,
                    file,
                    self.event_bus.clone(),
                )
            })
            .collect();

        debug!(session_id = %session_id, count = image_ids.len(), "Files added");
        self.event_bus.emit_lossy(PlaEvent::ImagesAdded {
            session_id,
            image_ids: image_ids.clone(),
            timestamp: Utc::now(),
        });

        Ok(AddFilesOutcome {
            image_ids,
            decoding,
        })
    }

    pub async fn remove_file(
        &self,
        session_id: Uuid,
        index: usize,
    ) -> Result<UploadSnapshot, WorkflowError> {
        let session = self.handle(session_id).await?;
        let mut workflow = session.lock().await;
        let removed = workflow.remove_file(index)?;

        debug!(session_id = %session_id, image_id = %removed.id, index, "Image removed");
        self.event_bus.emit_lossy(PlaEvent::ImageRemoved {
            session_id,
            image_id: removed.id,
            timestamp: Utc::now(),
        });
        Ok(workflow.snapshot())
    }

    pub async fn select_for_edit(
        &self,
        session_id: Uuid,
        index: usize,
    ) -> Result<UploadSnapshot, WorkflowError> {
        let session = self.handle(session_id).await?;
        let mut workflow = session.lock().await;
        workflow.select_for_edit(index)?;
        Ok(workflow.snapshot())
    }

    pub async fn view_preview(&self, session_id: Uuid) -> Result<UploadSnapshot, WorkflowError> {
        let session = self.handle(session_id).await?;
        let mut workflow = session.lock().await;
        workflow.view_preview()?;
        Ok(workflow.snapshot())
    }

    /// Enhance the original preview of image `index`
    ///
    /// Enhancements for different images may overlap; each commits on its
    /// own and the last result per image wins. A failure changes nothing.
    pub async fn apply_enhancement(
        &self,
        session_id: Uuid,
        index: usize,
        settings: EnhancementSettings,
    ) -> Result<EnhancedImage, WorkflowError> {
        let session = self.handle(session_id).await?;
        let (image_id, source) = session.lock().await.enhancement_source(index)?;
        let request = settings.to_request(source);

        debug!(
            session_id = %session_id,
            image_id = %image_id,
            enhancer = self.enhancer.name(),
            auto_enhance = request.auto_enhance,
            brightness = request.brightness,
            contrast = request.contrast,
            saturation = request.saturation,
            "Requesting enhancement"
        );

        let enhanced = match self.enhancer.enhance(&request).await {
            Ok(enhanced) => enhanced,
            Err(e) => {
                error!(session_id = %session_id, image_id = %image_id, error = %e, "Enhancement failed");
                self.event_bus.emit_lossy(PlaEvent::notify_error(
                    "Enhancement failed",
                    "There was an error enhancing your image. Please try again.",
                ));
                return Err(WorkflowError::ServiceFailure(e.to_string()));
            }
        };

        let stored = session
            .lock()
            .await
            .apply_enhanced(image_id, enhanced.enhanced_image_url.clone());
        if !stored {
            warn!(
                session_id = %session_id,
                image_id = %image_id,
                "Image removed during enhancement, discarding result"
            );
            return Err(WorkflowError::ImageGone(image_id));
        }

        self.event_bus.emit_lossy(PlaEvent::EnhancementApplied {
            session_id,
            image_id,
            enhanced_image_url: enhanced.enhanced_image_url.clone(),
            timestamp: Utc::now(),
        });
        Ok(enhanced)
    }

    pub async fn reset_enhancement(
        &self,
        session_id: Uuid,
        index: usize,
    ) -> Result<UploadSnapshot, WorkflowError> {
        let session = self.handle(session_id).await?;
        let mut workflow = session.lock().await;
        workflow.reset_enhancement(index)?;
        Ok(workflow.snapshot())
    }

    /// Analyze image 0 and close the session on success
    pub async fn submit(&self, session_id: Uuid) -> Result<AnalysisTicket, WorkflowError> {
        let session = self.handle(session_id).await?;

        let begun = session.lock().await.begin_submit();
        let reference = match begun {
            Ok(reference) => reference,
            Err(WorkflowError::NoFilesSelected) => {
                self.event_bus.emit_lossy(PlaEvent::notify_error(
                    "No files selected",
                    "Please upload at least one product image.",
                ));
                return Err(WorkflowError::NoFilesSelected);
            }
            Err(e) => return Err(e),
        };

        info!(session_id = %session_id, analyzer = self.analyzer.name(), "Submitting image for analysis");
        self.event_bus.emit_lossy(PlaEvent::SubmissionStarted {
            session_id,
            timestamp: Utc::now(),
        });

        match self.analyzer.analyze(&reference).await {
            Ok(ticket) => {
                let tombstone = {
                    let mut workflow = session.lock().await;
                    workflow.complete_submit(ticket.id.clone());
                    let mut snapshot = workflow.snapshot();
                    snapshot.images.clear();
                    snapshot
                };
                // Tombstone first so the id never reads as unknown
                self.closed.insert(session_id, tombstone).await;
                self.sessions.remove(&session_id).await;

                info!(session_id = %session_id, analysis_id = %ticket.id, "Submission completed");
                self.event_bus.emit_lossy(PlaEvent::SubmissionCompleted {
                    session_id,
                    analysis_id: ticket.id.clone(),
                    timestamp: Utc::now(),
                });
                Ok(ticket)
            }
            Err(e) => {
                session.lock().await.fail_submit();
                error!(session_id = %session_id, error = %e, "Submission failed");
                self.event_bus.emit_lossy(PlaEvent::SubmissionFailed {
                    session_id,
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
                self.event_bus.emit_lossy(PlaEvent::notify_error(
                    "Upload failed",
                    "There was an error processing your images. Please try again.",
                ));
                Err(WorkflowError::ServiceFailure(e.to_string()))
            }
        }
    }
}
