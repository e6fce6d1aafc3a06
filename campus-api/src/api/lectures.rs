//! Lecture handlers, including media and notes uploads

use axum::extract::{Multipart, Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use campus_common::db::models::{Course, Lecture};

use crate::api::auth::CurrentUser;
use crate::api::ApiError;
use crate::db;
use crate::media::MediaKind;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateLectureRequest {
    pub title: String,
}

/// POST /api/courses/:course_id/lectures
pub async fn create_lecture(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(course_id): Path<String>,
    Json(req): Json<CreateLectureRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Lecture title required".to_string()));
    }

    require_creator(&state, &course_id, &user.id).await?;

    let guid = Uuid::new_v4().to_string();
    db::lectures::create(&state.db, &guid, &course_id, req.title.trim()).await?;

    let lecture = db::lectures::find(&state.db, &guid)
        .await?
        .ok_or_else(|| ApiError::not_found("Lecture"))?;
    let lectures = db::lectures::for_course(&state.db, &course_id).await?;

    Ok(Json(json!({ "lecture": lecture, "lectures": lectures })))
}

/// GET /api/courses/:course_id/lectures
pub async fn list_lectures(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if db::courses::find(&state.db, &course_id).await?.is_none() {
        return Err(ApiError::not_found("Course"));
    }

    let lectures = db::lectures::for_course(&state.db, &course_id).await?;
    Ok(Json(json!({ "lectures": lectures })))
}

/// PUT /api/lectures/:lecture_id
///
/// Multipart form: optional title, is_preview_free, and a video file.
/// Re-uploading video replaces the previous file.
pub async fn update_lecture(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(lecture_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let lecture = find_owned_lecture(&state, &lecture_id, &user.id).await?;

    let mut title = None;
    let mut is_preview_free = None;
    let mut video: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("video") => {
                let file_name = field.file_name().unwrap_or("video.mp4").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;
                let max: usize = campus_common::db::get_setting_or(
                    &state.db,
                    "media_max_video_bytes",
                    "524288000",
                )
                .await?
                .parse()
                .unwrap_or(524_288_000);
                if bytes.len() > max {
                    return Err(ApiError::BadRequest("Video too large".to_string()));
                }
                video = Some((file_name, bytes.to_vec()));
            }
            Some("title") => {
                title = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?,
                );
            }
            Some("is_preview_free") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;
                is_preview_free = Some(text.parse::<bool>().map_err(|_| {
                    ApiError::BadRequest("is_preview_free must be true/false".to_string())
                })?);
            }
            _ => {}
        }
    }

    db::lectures::update(&state.db, &lecture_id, title.as_deref(), is_preview_free).await?;

    if let Some((file_name, bytes)) = video {
        if let Some(old) = &lecture.video_path {
            state.media.remove(old)?;
        }
        let rel = state.media.save(MediaKind::LectureVideo, &lecture_id, &file_name, &bytes)?;
        db::lectures::set_media(&state.db, &lecture_id, &rel, None).await?;
    }

    let updated = db::lectures::find(&state.db, &lecture_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lecture"))?;

    Ok(Json(json!({ "lecture": updated })))
}

/// POST /api/lectures/:lecture_id/notes
///
/// Multipart PDF upload. Replaces any previous notes and queues re-indexing
/// in the AI tutor service.
pub async fn upload_notes(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(lecture_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let lecture = find_owned_lecture(&state, &lecture_id, &user.id).await?;

    let mut notes: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("notes") {
            let file_name = field.file_name().unwrap_or("notes.pdf").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;
            notes = Some((file_name, bytes.to_vec()));
        }
    }

    let (file_name, bytes) =
        notes.ok_or_else(|| ApiError::BadRequest("Missing notes file".to_string()))?;

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
    let rel = state.media.save(MediaKind::LectureNotes, &lecture_id, &file_name, &bytes)?;
    db::lectures::set_notes(&state.db, &lecture_id, &rel).await?;

    // Best-effort: ask the AI tutor service to re-index. A failure here only
    // delays indexing; the notes themselves are already saved.
    notify_ai_indexer(&state, &lecture_id).await;

    let updated = db::lectures::find(&state.db, &lecture_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lecture"))?;

    Ok(Json(json!({ "lecture": updated })))
}

/// DELETE /api/lectures/:lecture_id
pub async fn remove_lecture(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(lecture_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let lecture = find_owned_lecture(&state, &lecture_id, &user.id).await?;

    for path in [&lecture.video_path, &lecture.audio_path, &lecture.notes_path]
        .into_iter()
        .flatten()
    {
        state.media.remove(path)?;
    }
    db::lectures::delete(&state.db, &lecture_id).await?;

    Ok(Json(json!({ "message": "Lecture removed" })))
}

/// Fetch a lecture and require the caller to own its course
async fn find_owned_lecture(
    state: &AppState,
    lecture_id: &str,
    user_id: &str,
) -> Result<Lecture, ApiError> {
    let lecture = db::lectures::find(&state.db, lecture_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lecture"))?;
    require_creator(state, &lecture.course_id, user_id).await?;
    Ok(lecture)
}

async fn require_creator(
    state: &AppState,
    course_id: &str,
    user_id: &str,
) -> Result<Course, ApiError> {
    let course = db::courses::find(&state.db, course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?;
    if course.creator_id != user_id {
        return Err(ApiError::Forbidden(
            "Only the course creator can manage lectures".to_string(),
        ));
    }
    Ok(course)
}

/// Fire-and-forget reindex request to the AI tutor service
async fn notify_ai_indexer(state: &AppState, lecture_id: &str) {
    let module = match campus_common::config::load_module_config(&state.db, "ai_tutor").await {
        Ok(module) => module,
        Err(e) => {
            warn!("AI tutor module config unavailable, skipping reindex: {}", e);
            return;
        }
    };

    let url = format!("http://{}:{}/api/ai/index/{}", module.host, module.port, lecture_id);
    tokio::spawn(async move {
        let client = match reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to build reindex client: {}", e);
                return;
            }
        };
        if let Err(e) = client.post(&url).send().await {
            warn!("Notes reindex request failed: {}", e);
        }
    });
}
