//! Live lecture handlers

use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use campus_common::events::CampusEvent;

use crate::api::auth::CurrentUser;
use crate::api::ApiError;
use crate::clients::video_token::VideoTokenError;
use crate::db;
use crate::media::MediaKind;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateLiveRequest {
    pub course_id: String,
    pub topic: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default = "default_duration")]
    pub duration_minutes: i64,
}

fn default_duration() -> i64 {
    60
}

#[derive(Debug, Deserialize)]
pub struct EndLiveRequest {
    pub meeting_id: String,
}

/// POST /api/live/create
///
/// Schedules a live lecture with a generated meeting id of the form
/// `live-{courseId}-{unix_millis}`.
pub async fn create_live_lecture(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateLiveRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.topic.trim().is_empty() {
        return Err(ApiError::BadRequest("Topic required".to_string()));
    }
    if req.duration_minutes <= 0 {
        return Err(ApiError::BadRequest("Duration must be positive".to_string()));
    }

    let course = db::courses::find(&state.db, &req.course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?;
    if course.creator_id != user.id {
        return Err(ApiError::Forbidden(
            "Only the course creator can schedule live classes".to_string(),
        ));
    }

    let guid = Uuid::new_v4().to_string();
    let meeting_id = format!("live-{}-{}", req.course_id, Utc::now().timestamp_millis());

    db::live::create(
        &state.db,
        &guid,
        &req.course_id,
        &user.id,
        req.topic.trim(),
        req.description.as_deref(),
        req.start_time,
        req.duration_minutes,
        &meeting_id,
    )
    .await?;

    state.bus.emit(CampusEvent::LiveLectureScheduled {
        course_id: req.course_id.clone(),
        meeting_id: meeting_id.clone(),
        start_time: req.start_time,
    });

    let lecture = db::live::find_by_meeting(&state.db, &meeting_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Live lecture"))?;

    Ok(Json(json!({ "lecture": lecture })))
}

/// GET /api/live/course/:course_id
pub async fn course_schedule(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let lectures = db::live::for_course(&state.db, &course_id).await?;
    Ok(Json(json!({ "lectures": lectures })))
}

/// GET /api/live/all
pub async fn all_live_lectures(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let lectures = db::live::all(&state.db).await?;
    Ok(Json(json!({ "lectures": lectures })))
}

/// POST /api/live/end
pub async fn end_live_lecture(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<EndLiveRequest>,
) -> Result<Json<Value>, ApiError> {
    let lecture = db::live::find_by_meeting(&state.db, &req.meeting_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Live lecture"))?;
    if lecture.instructor_id != user.id {
        return Err(ApiError::Forbidden("Only the instructor can end the class".to_string()));
    }

    let ended = db::live::end(&state.db, &req.meeting_id).await?;
    if ended == 0 {
        return Err(ApiError::Conflict("Class already ended".to_string()));
    }

    state.bus.emit(CampusEvent::LiveLectureEnded {
        meeting_id: req.meeting_id.clone(),
        timestamp: Utc::now(),
    });

    Ok(Json(json!({ "message": "Class ended" })))
}

/// GET /api/live/token
///
/// Signed video-service token for the current user, plus the public API key
/// the browser SDK needs. Joining earns attendance XP.
pub async fn video_token(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let token = state.video.sign_user_token(&user.id).map_err(|e| match e {
        VideoTokenError::NotConfigured => {
            ApiError::BadRequest("Live classes are not configured on this server".to_string())
        }
    })?;

    let award: i64 =
        campus_common::db::get_setting_or(&state.db, "xp_live_attendance_award", "15")
            .await?
            .parse()
            .unwrap_or(15);
    db::users::add_xp(&state.db, &user.id, award).await?;

    Ok(Json(json!({
        "token": token,
        "api_key": state.video.api_key(),
    })))
}

/// POST /api/live/:meeting_id/recording
///
/// Multipart video upload; replaces any previous recording.
pub async fn upload_recording(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(meeting_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let lecture = require_instructor(&state, &meeting_id, &user.id).await?;

    let (file_name, bytes) = read_single_file(multipart, "video").await?;
    let max: usize =
        campus_common::db::get_setting_or(&state.db, "media_max_video_bytes", "524288000")
            .await?
            .parse()
            .unwrap_or(524_288_000);
    if bytes.len() > max {
        return Err(ApiError::BadRequest("Recording too large".to_string()));
    }

    if let Some(old) = &lecture.recording_path {
        state.media.remove(old)?;
    }
    let rel = state.media.save(MediaKind::Recording, &meeting_id, &file_name, &bytes)?;
    db::live::set_recording(&state.db, &meeting_id, &rel).await?;

    Ok(Json(json!({ "recording_path": rel })))
}

/// POST /api/live/:meeting_id/notes
pub async fn upload_notes(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(meeting_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let lecture = require_instructor(&state, &meeting_id, &user.id).await?;

    let (file_name, bytes) = read_single_file(multipart, "notes").await?;
    let max: usize =
        campus_common::db::get_setting_or(&state.db, "media_max_notes_bytes", "52428800")
            .await?
            .parse()
            .unwrap_or(52_428_800);
    if bytes.len() > max {
        return Err(ApiError::BadRequest("Notes file too large".to_string()));
    }

    if let Some(old) = &lecture.notes_path {
        state.media.remove(old)?;
    }
    let rel = state.media.save(MediaKind::LiveNotes, &meeting_id, &file_name, &bytes)?;
    db::live::set_notes(&state.db, &meeting_id, Some(&rel)).await?;

    Ok(Json(json!({ "notes_path": rel })))
}

/// DELETE /api/live/:meeting_id/notes
pub async fn delete_notes(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(meeting_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let lecture = require_instructor(&state, &meeting_id, &user.id).await?;

    if let Some(notes) = &lecture.notes_path {
        state.media.remove(notes)?;
    }
    db::live::set_notes(&state.db, &meeting_id, None).await?;

    Ok(Json(json!({ "message": "Notes deleted" })))
}

/// GET /api/live/:meeting_id/notes
pub async fn download_notes(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
) -> Result<Response, ApiError> {
    let lecture = db::live::find_by_meeting(&state.db, &meeting_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Live lecture"))?;

    let notes_path = lecture
        .notes_path
        .as_deref()
        .ok_or_else(|| ApiError::not_found("Notes"))?;

    let bytes = tokio::fs::read(state.media.absolute(notes_path))
        .await
        .map_err(|_| ApiError::not_found("Notes file"))?;

    let response = (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}-notes.pdf\"", meeting_id),
            ),
        ],
        bytes,
    )
        .into_response();

    Ok(response)
}

async fn require_instructor(
    state: &AppState,
    meeting_id: &str,
    user_id: &str,
) -> Result<campus_common::db::models::LiveLecture, ApiError> {
    let lecture = db::live::find_by_meeting(&state.db, meeting_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Live lecture"))?;
    if lecture.instructor_id != user_id {
        return Err(ApiError::Forbidden("Only the instructor can do that".to_string()));
    }
    Ok(lecture)
}

/// Read one named file field from a multipart form
async fn read_single_file(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some(field_name) {
            let file_name = field.file_name().unwrap_or("upload.bin").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;
            return Ok((file_name, bytes.to_vec()));
        }
    }

    Err(ApiError::BadRequest(format!("Missing {} file in multipart form", field_name)))
}
