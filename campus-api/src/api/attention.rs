//! Attention tracking handlers
//!
//! The browser uploads webcam frames while a lecture plays; each frame is
//! scored by the external engine, folded into the session tracker, and
//! answered with the playback action the player should take.

use axum::extract::{Multipart, Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use campus_common::db::get_setting_or;
use campus_common::events::CampusEvent;

use crate::api::auth::CurrentUser;
use crate::api::ApiError;
use crate::attention::{AttentionThresholds, PlaybackAction};
use crate::clients::attention_engine::attention_score;
use crate::db;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub lecture_id: String,
}

/// POST /api/attention/session
pub async fn start_session(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<StartSessionRequest>,
) -> Result<Json<Value>, ApiError> {
    if db::lectures::find(&state.db, &req.lecture_id).await?.is_none() {
        return Err(ApiError::not_found("Lecture"));
    }

    let guid = Uuid::new_v4().to_string();
    db::attention::create_session(&state.db, &guid, &user.id, &req.lecture_id).await?;
    state.attention_sessions.start(&guid);

    Ok(Json(json!({ "session_id": guid })))
}

/// POST /api/attention/frame
///
/// Multipart form: `session_id` text field and a `frame` JPEG. While a
/// frame for the session is still being analyzed, further frames are
/// dropped rather than queued.
pub async fn submit_frame(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut session_id: Option<String> = None;
    let mut frame: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("session_id") => {
                session_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?,
                );
            }
            Some("frame") => {
                frame = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    let session_id =
        session_id.ok_or_else(|| ApiError::BadRequest("Missing session_id".to_string()))?;
    let frame = frame.ok_or_else(|| ApiError::BadRequest("Missing frame".to_string()))?;
    if frame.is_empty() {
        return Err(ApiError::BadRequest("Empty frame".to_string()));
    }

    let session = db::attention::find_session(&state.db, &session_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Session"))?;
    if session.user_id != user.id {
        return Err(ApiError::Forbidden("Session belongs to another user".to_string()));
    }
    if session.ended_at.is_some() {
        return Err(ApiError::Conflict("Session already ended".to_string()));
    }

    // Claim the per-session slot; an overlapping upload is dropped.
    if !state.attention_sessions.try_begin_frame(&session_id) {
        return Ok(Json(json!({ "action": "none", "dropped": true })));
    }

    let thresholds = load_thresholds(&state).await?;

    let scores = match state.attention_engine.analyze_frame(frame).await {
        Ok(scores) => scores,
        Err(e) => {
            // Release the slot; the engine being down must not wedge the session
            state.attention_sessions.finish_frame(&session_id, None, &thresholds);
            warn!("Frame analysis failed: {}", e);
            return Err(ApiError::Upstream(e.to_string()));
        }
    };

    let score = attention_score(&scores);
    let action = state
        .attention_sessions
        .finish_frame(&session_id, Some(score), &thresholds);

    db::attention::record_sample(
        &state.db,
        &session_id,
        score,
        scores.face_conf,
        scores.gaze_conf,
        scores.head_conf,
        action == PlaybackAction::Pause,
    )
    .await?;

    if action != PlaybackAction::None {
        state.bus.emit(CampusEvent::AttentionAction {
            session_id: session_id.clone(),
            action: action.as_str().to_string(),
            score,
        });
    }

    Ok(Json(json!({
        "action": action.as_str(),
        "score": score,
        "dropped": false,
    })))
}

/// POST /api/attention/session/:session_id/end
pub async fn end_session(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let session = db::attention::find_session(&state.db, &session_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Session"))?;
    if session.user_id != user.id {
        return Err(ApiError::Forbidden("Session belongs to another user".to_string()));
    }

    let average = db::attention::end_session(&state.db, &session_id).await?;
    state.attention_sessions.end(&session_id);

    Ok(Json(json!({ "average_score": average })))
}

/// GET /api/attention/lecture/:lecture_id/summary
///
/// Per-lecture aggregate, for the course creator.
pub async fn lecture_summary(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(lecture_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let lecture = db::lectures::find(&state.db, &lecture_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lecture"))?;
    let course = db::courses::find(&state.db, &lecture.course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?;
    if course.creator_id != user.id {
        return Err(ApiError::Forbidden(
            "Only the course creator can view attention data".to_string(),
        ));
    }

    let summary = db::attention::lecture_summary(&state.db, &lecture_id).await?;
    Ok(Json(json!({ "summary": summary })))
}

async fn load_thresholds(state: &AppState) -> Result<AttentionThresholds, ApiError> {
    let defaults = AttentionThresholds::default();
    Ok(AttentionThresholds {
        low: get_setting_or(&state.db, "attention_low_threshold", "40.0")
            .await?
            .parse()
            .unwrap_or(defaults.low),
        high: get_setting_or(&state.db, "attention_high_threshold", "60.0")
            .await?
            .parse()
            .unwrap_or(defaults.high),
        low_trigger: get_setting_or(&state.db, "attention_low_trigger", "3")
            .await?
            .parse()
            .unwrap_or(defaults.low_trigger),
        high_trigger: get_setting_or(&state.db, "attention_high_trigger", "2")
            .await?
            .parse()
            .unwrap_or(defaults.high_trigger),
    })
}
