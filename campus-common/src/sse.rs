//! Server-Sent Events (SSE) utilities
//!
//! Shared SSE implementations for CAMPUS services.

use crate::events::EventBus;
use axum::response::sse::{Event, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Create an SSE stream of CampusEvents with heartbeats
///
/// Every connected client gets its own broadcast receiver; lagged clients
/// skip missed events rather than blocking producers.
pub fn create_event_sse_stream(
    service_name: &'static str,
    bus: &EventBus,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);
    let mut rx = bus.subscribe();

    let stream = async_stream::stream! {
        // Send initial connected status
        yield Ok(Event::default().event("ConnectionStatus").data("connected"));

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Ok(event) => {
                        match serde_json::to_string(&event) {
                            Ok(json) => yield Ok(Event::default().event("CampusEvent").data(json)),
                            Err(e) => warn!("SSE: failed to serialize event: {}", e),
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("SSE: {} client lagged, skipped {} events", service_name, missed);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                },
                _ = tokio::time::sleep(Duration::from_secs(15)) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
