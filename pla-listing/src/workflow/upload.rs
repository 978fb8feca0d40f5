//! Upload/edit workflow state machine
//!
//! States: `Empty` → `HasImages` ⇄ `Editing { index }` → `Submitting` →
//! `Submitted` (terminal), or back to `HasImages` when analysis fails.
//!
//! The state is derived from the pending list, the selection, the current
//! view and the submission phase, so it can never disagree with them.
//! Only image 0 is ever submitted for analysis.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::WorkflowError;
use crate::models::{PendingImage, UploadedFile};

/// Which tab the client is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Preview,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowState {
    Empty,
    HasImages,
    Editing { index: usize },
    Submitting,
    Submitted {
        #[serde(rename = "analysisId")]
        analysis_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    Submitting,
    Submitted { analysis_id: String },
}

/// Serializable view of a session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSnapshot {
    pub session_id: Uuid,
    pub state: WorkflowState,
    pub view: View,
    pub selected_index: Option<usize>,
    pub images: Vec<PendingImage>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UploadWorkflow {
    session_id: Uuid,
    images: Vec<PendingImage>,
    /// Unset, or a valid index into `images`
    selected: Option<usize>,
    view: View,
    phase: Phase,
    created_at: DateTime<Utc>,
}

impl UploadWorkflow {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            images: Vec::new(),
            selected: None,
            view: View::Preview,
            phase: Phase::Idle,
            created_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> WorkflowState {
        match &self.phase {
            Phase::Submitted { analysis_id } => WorkflowState::Submitted {
                analysis_id: analysis_id.clone(),
            },
            Phase::Submitting => WorkflowState::Submitting,
            Phase::Idle if self.images.is_empty() => WorkflowState::Empty,
            Phase::Idle => match (self.view, self.selected) {
                (View::Edit, Some(index)) => WorkflowState::Editing { index },
                _ => WorkflowState::HasImages,
            },
        }
    }

    pub fn images(&self) -> &[PendingImage] {
        &self.images
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_image(&self) -> Option<&PendingImage> {
        self.selected.and_then(|i| self.images.get(i))
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Raw previews, parallel to the pending list
    pub fn previews(&self) -> Vec<Option<&str>> {
        self.images.iter().map(|i| i.preview.as_deref()).collect()
    }

    /// Edited previews, parallel to the pending list
    pub fn edited_previews(&self) -> Vec<Option<&str>> {
        self.images.iter().map(|i| i.edited_preview.as_deref()).collect()
    }

    pub fn snapshot(&self) -> UploadSnapshot {
        UploadSnapshot {
            session_id: self.session_id,
            state: self.state(),
            view: self.view,
            selected_index: self.selected,
            images: self.images.clone(),
            created_at: self.created_at,
        }
    }

    fn ensure_open(&self) -> Result<(), WorkflowError> {
        match self.phase {
            Phase::Submitted { .. } => Err(WorkflowError::SessionClosed),
            _ => Ok(()),
        }
    }

    fn check_index(&self, index: usize) -> Result<(), WorkflowError> {
        if index < self.images.len() {
            Ok(())
        } else {
            Err(WorkflowError::InvalidIndex {
                index,
                len: self.images.len(),
            })
        }
    }

    fn position_of(&self, image_id: Uuid) -> Option<usize> {
        self.images.iter().position(|i| i.id == image_id)
    }

    /// Append files in order; previews arrive later via [`Self::attach_preview`]
    pub fn add_files(&mut self, files: &[UploadedFile]) -> Result<Vec<Uuid>, WorkflowError> {
        self.ensure_open()?;

        let ids = files
            .iter()
            .map(|file| {
                let image = PendingImage::from_upload(file);
                let id = image.id;
                self.images.push(image);
                id
            })
            .collect();
        Ok(ids)
    }

    /// Store a decoded preview; false when the image has been removed
    pub fn attach_preview(&mut self, image_id: Uuid, preview: String) -> bool {
        match self.position_of(image_id) {
            Some(pos) => {
                self.images[pos].preview = Some(preview);
                true
            }
            None => false,
        }
    }

    /// Remove the image at `index`
    ///
    /// Removing the selected image clears the selection. Removing an image
    /// before it shifts the selected index so the same image stays selected.
    pub fn remove_file(&mut self, index: usize) -> Result<PendingImage, WorkflowError> {
        self.ensure_open()?;
        self.check_index(index)?;

        let removed = self.images.remove(index);
        match self.selected {
            Some(selected) if selected == index => {
                self.selected = None;
                self.view = View::Preview;
            }
            Some(selected) if selected > index => {
                self.selected = Some(selected - 1);
            }
            _ => {}
        }
        Ok(removed)
    }

    pub fn select_for_edit(&mut self, index: usize) -> Result<(), WorkflowError> {
        self.ensure_open()?;
        if self.phase == Phase::Submitting {
            return Err(WorkflowError::SubmissionInFlight);
        }
        self.check_index(index)?;

        self.selected = Some(index);
        self.view = View::Edit;
        Ok(())
    }

    /// Back to the preview grid; the selection is kept
    pub fn view_preview(&mut self) -> Result<(), WorkflowError> {
        self.ensure_open()?;
        self.view = View::Preview;
        Ok(())
    }

    /// Image id and original preview to enhance
    ///
    /// Enhancement always starts from the original, never from a previous
    /// enhancement.
    pub fn enhancement_source(&self, index: usize) -> Result<(Uuid, String), WorkflowError> {
        self.ensure_open()?;
        self.check_index(index)?;

        let image = &self.images[index];
        let preview = image
            .preview
            .clone()
            .ok_or(WorkflowError::PreviewPending { index })?;
        Ok((image.id, preview))
    }

    /// Store an enhancement result; false when the image has been removed
    ///
    /// Last write wins per image.
    pub fn apply_enhanced(&mut self, image_id: Uuid, enhanced_url: String) -> bool {
        match self.position_of(image_id) {
            Some(pos) => {
                self.images[pos].edited_preview = Some(enhanced_url);
                true
            }
            None => false,
        }
    }

    pub fn reset_enhancement(&mut self, index: usize) -> Result<(), WorkflowError> {
        self.ensure_open()?;
        self.check_index(index)?;
        self.images[index].edited_preview = None;
        Ok(())
    }

    /// Gate and enter `Submitting`
    ///
    /// Returns the image reference to analyze: image 0's edited preview when
    /// non-empty, else its raw preview.
    pub fn begin_submit(&mut self) -> Result<String, WorkflowError> {
        self.ensure_open()?;
        if self.phase == Phase::Submitting {
            return Err(WorkflowError::SubmissionInFlight);
        }

        let first = self.images.first().ok_or(WorkflowError::NoFilesSelected)?;
        let reference = first
            .effective_preview()
            .map(str::to_string)
            .ok_or(WorkflowError::PreviewPending { index: 0 })?;

        self.phase = Phase::Submitting;
        Ok(reference)
    }

    /// Analysis succeeded: enter the terminal `Submitted` state
    pub fn complete_submit(&mut self, analysis_id: String) {
        if self.phase == Phase::Submitting {
            self.phase = Phase::Submitted { analysis_id };
        }
    }

    /// Analysis failed: back to the pre-submit state, images untouched
    pub fn fail_submit(&mut self) {
        if self.phase == Phase::Submitting {
            self.phase = Phase::Idle;
        }
    }
}
