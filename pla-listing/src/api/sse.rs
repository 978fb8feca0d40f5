//! Server-Sent Events stream for workflow events and notifications

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use pla_common::sse::create_event_sse_stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /events
///
/// Streams every [`pla_common::PlaEvent`]: upload progress (`ImagesAdded`,
/// `PreviewReady`, `EnhancementApplied`), submission outcome, listing
/// save/export and `Notification` toasts.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    create_event_sse_stream("pla-listing", &state.event_bus)
}
