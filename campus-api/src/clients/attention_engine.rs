//! Attention Engine client
//!
//! Forwards webcam frames to the external frame-analysis service and folds
//! its three confidences into one 0-100 attention score. The engine runs
//! face detection and landmark analysis; this side never touches pixels.
//!
//! # API
//! - Endpoint: `POST {base}/analyze`, multipart field `frame`
//! - Response: `{ "face_conf": f, "gaze_conf": g, "head_conf": h }`, each 0.0-1.0

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Confidences returned by the engine for one frame
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FrameScores {
    pub face_conf: f64,
    pub gaze_conf: f64,
    pub head_conf: f64,
}

/// Errors from the frame-analysis boundary
#[derive(Debug)]
pub enum AttentionEngineError {
    /// Request failed or timed out
    Unreachable(String),
    /// Engine answered with a non-success status
    Rejected(String),
}

impl std::fmt::Display for AttentionEngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttentionEngineError::Unreachable(msg) => {
                write!(f, "Attention engine unreachable: {}", msg)
            }
            AttentionEngineError::Rejected(msg) => {
                write!(f, "Attention engine rejected frame: {}", msg)
            }
        }
    }
}

impl std::error::Error for AttentionEngineError {}

/// Frame-analysis engine HTTP client
#[derive(Clone)]
pub struct AttentionEngineClient {
    http: Client,
    base_url: String,
}

impl AttentionEngineClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            http: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            base_url,
        }
    }

    /// Analyze one JPEG frame
    pub async fn analyze_frame(&self, frame: Vec<u8>) -> Result<FrameScores, AttentionEngineError> {
        debug!(bytes = frame.len(), "Forwarding frame to attention engine");

        let part = reqwest::multipart::Part::bytes(frame)
            .file_name("frame.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| AttentionEngineError::Rejected(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("frame", part);

        let response = self
            .http
            .post(format!("{}/analyze", self.base_url.trim_end_matches('/')))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AttentionEngineError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AttentionEngineError::Rejected(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AttentionEngineError::Rejected(format!("Bad response: {}", e)))
    }
}

/// Fold engine confidences into one 0-100 score.
///
/// Face presence dominates; gaze and head pose refine. A frame with no face
/// detected scores near zero regardless of the other terms.
pub fn attention_score(scores: &FrameScores) -> f64 {
    let weighted =
        0.5 * scores.face_conf + 0.25 * scores.gaze_conf + 0.25 * scores.head_conf;
    (weighted.clamp(0.0, 1.0) * 100.0 * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_attention() {
        let score = attention_score(&FrameScores {
            face_conf: 1.0,
            gaze_conf: 1.0,
            head_conf: 1.0,
        });
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_no_face_scores_low() {
        let score = attention_score(&FrameScores {
            face_conf: 0.0,
            gaze_conf: 0.9,
            head_conf: 0.9,
        });
        assert!(score < 50.0, "score {} should be below the pause band", score);
    }

    #[test]
    fn test_out_of_range_confidences_clamped() {
        let score = attention_score(&FrameScores {
            face_conf: 2.0,
            gaze_conf: 2.0,
            head_conf: 2.0,
        });
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_single_decimal_rounding() {
        let score = attention_score(&FrameScores {
            face_conf: 0.333,
            gaze_conf: 0.333,
            head_conf: 0.333,
        });
        assert_eq!(score, 33.3);
    }
}
