//! Review handlers

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::auth::CurrentUser;
use crate::api::ApiError;
use crate::db;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub course_id: String,
    pub rating: i64,
    pub comment: Option<String>,
}

/// POST /api/reviews
pub async fn create_review(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<Json<Value>, ApiError> {
    if !(1..=5).contains(&req.rating) {
        return Err(ApiError::BadRequest("Rating must be between 1 and 5".to_string()));
    }

    if db::courses::find(&state.db, &req.course_id).await?.is_none() {
        return Err(ApiError::not_found("Course"));
    }

    if db::reviews::exists_for(&state.db, &req.course_id, &user.id).await? {
        return Err(ApiError::Conflict("You already reviewed this course".to_string()));
    }

    let guid = Uuid::new_v4().to_string();
    db::reviews::create(
        &state.db,
        &guid,
        &req.course_id,
        &user.id,
        req.rating,
        req.comment.as_deref(),
    )
    .await?;

    // First review earns XP
    let award: i64 = campus_common::db::get_setting_or(&state.db, "xp_review_award", "20")
        .await?
        .parse()
        .unwrap_or(20);
    db::users::add_xp(&state.db, &user.id, award).await?;

    let review = db::reviews::find(&state.db, &guid)
        .await?
        .ok_or_else(|| ApiError::not_found("Review"))?;

    Ok(Json(json!({ "review": review })))
}

/// GET /api/reviews/course/:course_id
pub async fn course_reviews(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let reviews = db::reviews::for_course(&state.db, &course_id).await?;
    let average = db::reviews::average_rating(&state.db, &course_id).await?;

    Ok(Json(json!({ "reviews": reviews, "average_rating": average })))
}

/// DELETE /api/reviews/:review_id
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(review_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let review = db::reviews::find(&state.db, &review_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Review"))?;
    if review.user_id != user.id {
        return Err(ApiError::Forbidden("Only the author can delete a review".to_string()));
    }

    db::reviews::delete(&state.db, &review_id).await?;
    Ok(Json(json!({ "message": "Review deleted" })))
}
