//! Event types for the PLA event system
//!
//! Events are broadcast via [`EventBus`] and serialized for SSE delivery.
//! `Notification` events carry the user-visible messages a browser client
//! shows as toasts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Visual weight of a user-visible notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    Default,
    Destructive,
}

/// PLA event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlaEvent {
    /// A new upload session was opened
    UploadSessionCreated {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Files were appended to the pending list
    ImagesAdded {
        session_id: Uuid,
        image_ids: Vec<Uuid>,
        timestamp: DateTime<Utc>,
    },

    /// Background decoding attached a preview to an image
    PreviewReady {
        session_id: Uuid,
        image_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// An image was removed from the pending list
    ImageRemoved {
        session_id: Uuid,
        image_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// An enhanced preview was stored for an image
    EnhancementApplied {
        session_id: Uuid,
        image_id: Uuid,
        enhanced_image_url: String,
        timestamp: DateTime<Utc>,
    },

    /// Analysis request left for the analyzer
    SubmissionStarted {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Analysis succeeded; the client navigates to the review page
    SubmissionCompleted {
        session_id: Uuid,
        analysis_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Analysis failed; pending images are untouched
    SubmissionFailed {
        session_id: Uuid,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// A listing was written to the listing store
    ListingSaved {
        listing_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A listing export was produced
    ListingExported {
        listing_id: String,
        timestamp: DateTime<Utc>,
    },

    /// User-visible message
    Notification {
        title: String,
        description: String,
        variant: NotificationVariant,
        timestamp: DateTime<Utc>,
    },
}

impl PlaEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            PlaEvent::UploadSessionCreated { .. } => "UploadSessionCreated",
            PlaEvent::ImagesAdded { .. } => "ImagesAdded",
            PlaEvent::PreviewReady { .. } => "PreviewReady",
            PlaEvent::ImageRemoved { .. } => "ImageRemoved",
            PlaEvent::EnhancementApplied { .. } => "EnhancementApplied",
            PlaEvent::SubmissionStarted { .. } => "SubmissionStarted",
            PlaEvent::SubmissionCompleted { .. } => "SubmissionCompleted",
            PlaEvent::SubmissionFailed { .. } => "SubmissionFailed",
            PlaEvent::ListingSaved { .. } => "ListingSaved",
            PlaEvent::ListingExported { .. } => "ListingExported",
            PlaEvent::Notification { .. } => "Notification",
        }
    }

    /// Plain notification
    pub fn notify(title: impl Into<String>, description: impl Into<String>) -> Self {
        PlaEvent::Notification {
            title: title.into(),
            description: description.into(),
            variant: NotificationVariant::Default,
            timestamp: Utc::now(),
        }
    }

    /// Error notification
    pub fn notify_error(title: impl Into<String>, description: impl Into<String>) -> Self {
        PlaEvent::Notification {
            title: title.into(),
            description: description.into(),
            variant: NotificationVariant::Destructive,
            timestamp: Utc::now(),
        }
    }
}

/// Broadcast channel shared by all handlers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlaEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering `capacity` events per subscriber
    ///
    /// # Examples
    ///
    /// ```
    /// use pla_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, returning the subscriber count
    ///
    /// Fails when nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: PlaEvent) -> Result<usize, broadcast::error::SendError<PlaEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PlaEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
