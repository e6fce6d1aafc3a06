//! Course discussion handlers

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::auth::CurrentUser;
use crate::api::ApiError;
use crate::db;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// POST /api/chat/:course_id
pub async fn post_message(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(course_id): Path<String>,
    Json(req): Json<PostMessageRequest>,
) -> Result<Json<Value>, ApiError> {
    let body = req.body.trim();
    if body.is_empty() {
        return Err(ApiError::BadRequest("Message body required".to_string()));
    }

    if db::courses::find(&state.db, &course_id).await?.is_none() {
        return Err(ApiError::not_found("Course"));
    }

    let guid = Uuid::new_v4().to_string();
    db::chat::post(&state.db, &guid, &course_id, &user.id, body).await?;

    let message = db::chat::find(&state.db, &guid)
        .await?
        .ok_or_else(|| ApiError::not_found("Message"))?;

    Ok(Json(json!({ "message": message })))
}

/// GET /api/chat/:course_id
pub async fn list_messages(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = query.limit.clamp(1, 200);
    let offset = query.offset.max(0);

    let messages = db::chat::for_course(&state.db, &course_id, limit, offset).await?;
    Ok(Json(json!({ "messages": messages })))
}

/// POST /api/chat/message/:message_id/upvote
///
/// Idempotent per user: a second upvote leaves the count unchanged.
pub async fn upvote_message(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(message_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if db::chat::find(&state.db, &message_id).await?.is_none() {
        return Err(ApiError::not_found("Message"));
    }

    match db::chat::upvote(&state.db, &message_id, &user.id).await? {
        Some(upvotes) => Ok(Json(json!({ "upvotes": upvotes, "voted": true }))),
        None => {
            let message = db::chat::find(&state.db, &message_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Message"))?;
            Ok(Json(json!({ "upvotes": message.upvotes, "voted": false })))
        }
    }
}
