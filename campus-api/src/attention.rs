//! Attention tracking state
//!
//! Per-session counters deciding when lecture playback should pause or
//! resume. A run of low-attention frames triggers a pause; after a pause, a
//! run of high-attention frames resumes. Scores between the two thresholds
//! reset both runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Playback action the client should take after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackAction {
    None,
    Pause,
    Resume,
}

impl PlaybackAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackAction::None => "none",
            PlaybackAction::Pause => "pause",
            PlaybackAction::Resume => "resume",
        }
    }
}

/// Threshold configuration, loaded from the settings table
#[derive(Debug, Clone, Copy)]
pub struct AttentionThresholds {
    /// Scores strictly below this count toward a pause
    pub low: f64,
    /// Scores strictly above this count toward a resume
    pub high: f64,
    /// Consecutive low scores that trigger a pause
    pub low_trigger: u32,
    /// Consecutive high scores that trigger a resume (only while paused)
    pub high_trigger: u32,
}

impl Default for AttentionThresholds {
    fn default() -> Self {
        Self { low: 40.0, high: 60.0, low_trigger: 3, high_trigger: 2 }
    }
}

/// Counter state machine for one tracking session
#[derive(Debug, Default)]
pub struct AttentionTracker {
    low_count: u32,
    high_count: u32,
    paused: bool,
}

impl AttentionTracker {
    /// Feed one score, returning the playback action it produced
    pub fn observe(&mut self, score: f64, thresholds: &AttentionThresholds) -> PlaybackAction {
        if score < thresholds.low {
            self.low_count += 1;
            self.high_count = 0;
        } else if score > thresholds.high {
            self.high_count += 1;
            self.low_count = 0;
        } else {
            // Middle band: neither run survives
            self.low_count = 0;
            self.high_count = 0;
        }

        if !self.paused && self.low_count >= thresholds.low_trigger {
            self.paused = true;
            self.low_count = 0;
            return PlaybackAction::Pause;
        }

        if self.paused && self.high_count >= thresholds.high_trigger {
            self.paused = false;
            self.high_count = 0;
            return PlaybackAction::Resume;
        }

        PlaybackAction::None
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

#[derive(Default)]
struct SessionState {
    tracker: AttentionTracker,
    /// Frame upload currently in flight for this session
    busy: bool,
}

/// In-process registry of active attention sessions.
///
/// Holds the tracker counters and the per-session busy flag that drops
/// overlapping frame uploads instead of queueing them.
#[derive(Clone, Default)]
pub struct AttentionSessions {
    inner: Arc<Mutex<HashMap<String, SessionState>>>,
}

impl AttentionSessions {
    /// Register a session; replaces any stale state from a reused id
    pub fn start(&self, session_id: &str) {
        let mut map = self.inner.lock().expect("attention sessions lock");
        map.insert(session_id.to_string(), SessionState::default());
    }

    /// Try to claim the in-flight slot for a session.
    ///
    /// Returns false when the session is unknown or a frame is already being
    /// processed; the caller then drops the frame.
    pub fn try_begin_frame(&self, session_id: &str) -> bool {
        let mut map = self.inner.lock().expect("attention sessions lock");
        match map.get_mut(session_id) {
            Some(state) if !state.busy => {
                state.busy = true;
                true
            }
            _ => false,
        }
    }

    /// Feed a score to the session tracker and release the in-flight slot
    pub fn finish_frame(
        &self,
        session_id: &str,
        score: Option<f64>,
        thresholds: &AttentionThresholds,
    ) -> PlaybackAction {
        let mut map = self.inner.lock().expect("attention sessions lock");
        match map.get_mut(session_id) {
            Some(state) => {
                state.busy = false;
                match score {
                    Some(score) => state.tracker.observe(score, thresholds),
                    None => PlaybackAction::None,
                }
            }
            None => PlaybackAction::None,
        }
    }

    /// Drop a session's in-memory state
    pub fn end(&self, session_id: &str) {
        let mut map = self.inner.lock().expect("attention sessions lock");
        map.remove(session_id);
    }

    pub fn is_active(&self, session_id: &str) -> bool {
        let map = self.inner.lock().expect("attention sessions lock");
        map.contains_key(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> AttentionThresholds {
        AttentionThresholds { low: 40.0, high: 60.0, low_trigger: 3, high_trigger: 2 }
    }

    #[test]
    fn test_pause_after_low_run() {
        let mut tracker = AttentionTracker::default();
        let t = thresholds();

        assert_eq!(tracker.observe(20.0, &t), PlaybackAction::None);
        assert_eq!(tracker.observe(30.0, &t), PlaybackAction::None);
        assert_eq!(tracker.observe(10.0, &t), PlaybackAction::Pause);
        assert!(tracker.is_paused());
    }

    #[test]
    fn test_high_frame_breaks_low_run() {
        let mut tracker = AttentionTracker::default();
        let t = thresholds();

        tracker.observe(20.0, &t);
        tracker.observe(20.0, &t);
        // Attention recovered; the run restarts
        tracker.observe(80.0, &t);
        assert_eq!(tracker.observe(20.0, &t), PlaybackAction::None);
        assert_eq!(tracker.observe(20.0, &t), PlaybackAction::None);
        assert_eq!(tracker.observe(20.0, &t), PlaybackAction::Pause);
    }

    #[test]
    fn test_resume_after_high_run_while_paused() {
        let mut tracker = AttentionTracker::default();
        let t = thresholds();

        for _ in 0..3 {
            tracker.observe(10.0, &t);
        }
        assert!(tracker.is_paused());

        assert_eq!(tracker.observe(90.0, &t), PlaybackAction::None);
        assert_eq!(tracker.observe(90.0, &t), PlaybackAction::Resume);
        assert!(!tracker.is_paused());
    }

    #[test]
    fn test_high_run_without_pause_does_nothing() {
        let mut tracker = AttentionTracker::default();
        let t = thresholds();

        for _ in 0..10 {
            assert_eq!(tracker.observe(95.0, &t), PlaybackAction::None);
        }
        assert!(!tracker.is_paused());
    }

    #[test]
    fn test_middle_band_resets_runs() {
        let mut tracker = AttentionTracker::default();
        let t = thresholds();

        tracker.observe(10.0, &t);
        tracker.observe(10.0, &t);
        tracker.observe(50.0, &t); // between thresholds
        assert_eq!(tracker.observe(10.0, &t), PlaybackAction::None);
        assert_eq!(tracker.observe(10.0, &t), PlaybackAction::None);
        assert_eq!(tracker.observe(10.0, &t), PlaybackAction::Pause);
    }

    #[test]
    fn test_busy_flag_drops_overlapping_frames() {
        let sessions = AttentionSessions::default();
        sessions.start("s1");

        assert!(sessions.try_begin_frame("s1"));
        // A second frame while the first is in flight is dropped
        assert!(!sessions.try_begin_frame("s1"));

        sessions.finish_frame("s1", Some(80.0), &thresholds());
        assert!(sessions.try_begin_frame("s1"));
    }

    #[test]
    fn test_unknown_session_rejected() {
        let sessions = AttentionSessions::default();
        assert!(!sessions.try_begin_frame("nope"));
    }
}
