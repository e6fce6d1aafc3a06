//! Course handlers

use axum::extract::{Multipart, Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::auth::CurrentUser;
use crate::api::ApiError;
use crate::db;
use crate::media::MediaKind;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    pub category: String,
}

/// POST /api/courses
pub async fn create_course(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateCourseRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.title.trim().is_empty() || req.category.trim().is_empty() {
        return Err(ApiError::BadRequest("Title and category are required".to_string()));
    }

    let guid = Uuid::new_v4().to_string();
    db::courses::create(&state.db, &guid, req.title.trim(), req.category.trim(), &user.id).await?;

    let course = db::courses::find(&state.db, &guid)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?;

    Ok(Json(json!({ "course": course })))
}

/// GET /api/courses/published
pub async fn published_courses(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let courses = db::courses::published_with_stats(&state.db).await?;
    Ok(Json(json!({ "courses": courses })))
}

/// GET /api/courses/creator
pub async fn creator_courses(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let courses = db::courses::by_creator(&state.db, &user.id).await?;
    Ok(Json(json!({ "courses": courses })))
}

/// GET /api/courses/:course_id
///
/// Includes the lecture list. Callers who are neither enrolled nor the
/// creator only get media links on free-preview lectures.
pub async fn get_course(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(course_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let course = db::courses::find(&state.db, &course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?;

    let enrolled = db::enrollments::is_enrolled(&state.db, &user.id, &course_id).await?;
    let full_access = enrolled || course.creator_id == user.id;

    let mut lectures = db::lectures::for_course(&state.db, &course_id).await?;
    if !full_access {
        for lecture in &mut lectures {
            if !lecture.is_preview_free {
                lecture.video_path = None;
                lecture.audio_path = None;
                lecture.notes_path = None;
            }
        }
    }

    let average_rating = db::reviews::average_rating(&state.db, &course_id).await?;

    Ok(Json(json!({
        "course": course,
        "lectures": lectures,
        "enrolled": enrolled,
        "average_rating": average_rating,
    })))
}

/// PUT /api/courses/:course_id
///
/// Multipart form: any of title, subtitle, description, category, level,
/// price_cents, is_published, plus an optional thumbnail file. Creator only.
pub async fn update_course(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(course_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let course = db::courses::find(&state.db, &course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?;
    if course.creator_id != user.id {
        return Err(ApiError::Forbidden("Only the course creator can edit it".to_string()));
    }

    let mut title = None;
    let mut subtitle = None;
    let mut description = None;
    let mut category = None;
    let mut level = None;
    let mut price_cents = None;
    let mut is_published = None;
    let mut thumbnail: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("thumbnail") => {
                let file_name = field.file_name().unwrap_or("thumbnail.jpg").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;
                let max: usize =
                    campus_common::db::get_setting_or(&state.db, "media_max_image_bytes", "10485760")
                        .await?
                        .parse()
                        .unwrap_or(10_485_760);
                if bytes.len() > max {
                    return Err(ApiError::BadRequest("Thumbnail too large".to_string()));
                }
                thumbnail = Some((file_name, bytes.to_vec()));
            }
            Some(other) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;
                match other {
                    "title" => title = Some(text),
                    "subtitle" => subtitle = Some(text),
                    "description" => description = Some(text),
                    "category" => category = Some(text),
                    "level" => {
                        if !matches!(text.as_str(), "beginner" | "intermediate" | "advanced") {
                            return Err(ApiError::BadRequest(format!("Unknown level: {}", text)));
                        }
                        level = Some(text);
                    }
                    "price_cents" => {
                        let value: i64 = text.parse().map_err(|_| {
                            ApiError::BadRequest("price_cents must be an integer".to_string())
                        })?;
                        if value < 0 {
                            return Err(ApiError::BadRequest(
                                "price_cents must be non-negative".to_string(),
                            ));
                        }
                        price_cents = Some(value);
                    }
                    "is_published" => {
                        is_published = Some(text.parse::<bool>().map_err(|_| {
                            ApiError::BadRequest("is_published must be true/false".to_string())
                        })?);
                    }
                    _ => {} // ignore unknown fields
                }
            }
            None => {}
        }
    }

    db::courses::update(
        &state.db,
        &course_id,
        title.as_deref(),
        subtitle.as_deref(),
        description.as_deref(),
        category.as_deref(),
        level.as_deref(),
        price_cents,
        is_published,
    )
    .await?;

    if let Some((file_name, bytes)) = thumbnail {
        // Re-upload replaces the previous file
        if let Some(old) = &course.thumbnail_path {
            state.media.remove(old)?;
        }
        let rel = state.media.save(MediaKind::Thumbnail, &course_id, &file_name, &bytes)?;
        db::courses::set_thumbnail(&state.db, &course_id, &rel).await?;
    }

    let updated = db::courses::find(&state.db, &course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?;

    Ok(Json(json!({ "course": updated })))
}

/// DELETE /api/courses/:course_id
pub async fn remove_course(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(course_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let course = db::courses::find(&state.db, &course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?;
    if course.creator_id != user.id {
        return Err(ApiError::Forbidden("Only the course creator can remove it".to_string()));
    }

    if let Some(thumbnail) = &course.thumbnail_path {
        state.media.remove(thumbnail)?;
    }
    db::courses::delete(&state.db, &course_id).await?;

    Ok(Json(json!({ "message": "Course removed" })))
}
