//! Server-Sent Events endpoint

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /api/events
///
/// Streams CampusEvents (enrollments, quiz submissions, live-class changes)
/// plus heartbeats to connected dashboards.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    campus_common::sse::create_event_sse_stream("campus-api", &state.bus)
}
