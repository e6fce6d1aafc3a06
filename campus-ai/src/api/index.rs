//! Notes indexing endpoint

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use crate::api::ApiError;
use crate::indexer::{index_lecture, IndexError};
use crate::AppState;

/// POST /api/ai/index/:lecture_id
///
/// Re-indexes a lecture's notes. Called by campus-api after a notes upload;
/// safe to call repeatedly.
pub async fn index_lecture_notes(
    State(state): State<AppState>,
    Path(lecture_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let chunk_count = index_lecture(&state, &lecture_id).await.map_err(|e| match e {
        IndexError::LectureNotFound => ApiError::NotFound("Lecture not found".to_string()),
        IndexError::NoNotes => ApiError::BadRequest("Lecture has no notes".to_string()),
        IndexError::Extraction(msg) | IndexError::Embedding(msg) => ApiError::Upstream(msg),
        IndexError::Database(msg) => ApiError::Database(msg),
    })?;

    info!("Indexed lecture {}: {} chunks", lecture_id, chunk_count);
    Ok(Json(json!({ "lecture_id": lecture_id, "chunks": chunk_count })))
}
