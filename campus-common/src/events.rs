//! Event types for the CAMPUS event system
//!
//! Provides shared event definitions and the EventBus used by both services.
//! Events are broadcast in-process and serialized for SSE transmission to
//! connected dashboards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// CAMPUS event types
///
/// All services publish through this central enum so subscribers can match
/// exhaustively and SSE clients receive one tagged JSON shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CampusEvent {
    /// A student enrolled in a course (payment verified or free enroll)
    CourseEnrolled {
        user_id: String,
        course_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A quiz submission was graded
    QuizSubmitted {
        quiz_id: String,
        user_id: String,
        percentage: f64,
        timestamp: DateTime<Utc>,
    },

    /// A live lecture was scheduled
    LiveLectureScheduled {
        course_id: String,
        meeting_id: String,
        start_time: DateTime<Utc>,
    },

    /// A live lecture ended
    LiveLectureEnded {
        meeting_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Notes indexing started for a lecture
    NotesIndexingStarted {
        lecture_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Chunk-level indexing progress
    NotesIndexingProgress {
        lecture_id: String,
        chunks_done: usize,
        chunks_total: usize,
    },

    /// Notes indexing finished
    NotesIndexingCompleted {
        lecture_id: String,
        chunk_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Notes indexing failed (missing notes, extraction error, ...)
    NotesIndexingFailed {
        lecture_id: String,
        reason: String,
    },

    /// The attention tracker decided a playback action for a session
    AttentionAction {
        session_id: String,
        action: String,
        score: f64,
    },
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CampusEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<CampusEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns the number of subscribers that received it; an event with no
    /// subscribers is not an error.
    pub fn emit(&self, event: CampusEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}
