//! Chat history handlers

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::api::{ApiError, CurrentUser};
use crate::db;
use crate::AppState;

/// GET /api/ai/chat/:course_id
pub async fn chat_history(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(course_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let chat_id = db::get_or_create_chat(&state.db, &course_id, &user.id).await?;
    let messages = db::messages_for_chat(&state.db, &chat_id).await?;

    Ok(Json(json!({ "messages": messages })))
}

/// DELETE /api/ai/chat/:course_id
pub async fn clear_chat(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(course_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let cleared = db::clear_chat(&state.db, &course_id, &user.id).await?;
    Ok(Json(json!({ "cleared": cleared > 0 })))
}
