//! Lecture notes indexing
//!
//! Pipeline: stored PDF → text → ≤N-char chunks → one embedding per chunk →
//! replace the lecture's rows. Progress is broadcast on the event bus so
//! dashboards can watch long indexing runs over SSE.

use chrono::Utc;
use tracing::{info, warn};

use campus_common::db::get_setting_or;
use campus_common::events::CampusEvent;

use crate::chunker::chunk_text;
use crate::db::{self, NewEmbedding};
use crate::embeddings::select_provider;
use crate::pdf;
use crate::AppState;

/// Indexing errors surfaced to the HTTP layer
#[derive(Debug)]
pub enum IndexError {
    LectureNotFound,
    NoNotes,
    Extraction(String),
    Embedding(String),
    Database(String),
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexError::LectureNotFound => write!(f, "Lecture not found"),
            IndexError::NoNotes => write!(f, "Lecture has no notes to index"),
            IndexError::Extraction(msg) => write!(f, "Text extraction failed: {}", msg),
            IndexError::Embedding(msg) => write!(f, "Embedding failed: {}", msg),
            IndexError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for IndexError {}

impl From<sqlx::Error> for IndexError {
    fn from(e: sqlx::Error) -> Self {
        IndexError::Database(e.to_string())
    }
}

impl From<campus_common::Error> for IndexError {
    fn from(e: campus_common::Error) -> Self {
        IndexError::Database(e.to_string())
    }
}

/// Index one lecture's notes, returning the stored chunk count
pub async fn index_lecture(state: &AppState, lecture_id: &str) -> Result<usize, IndexError> {
    let lecture = db::find_lecture(&state.db, lecture_id)
        .await?
        .ok_or(IndexError::LectureNotFound)?;

    let notes_path = lecture.notes_path.as_deref().ok_or(IndexError::NoNotes)?;
    let pdf_path = state.media_root.join(notes_path);

    state.bus.emit(CampusEvent::NotesIndexingStarted {
        lecture_id: lecture_id.to_string(),
        timestamp: Utc::now(),
    });

    let text = match pdf::extract_text(&pdf_path).await {
        Ok(text) => text,
        Err(e) => {
            state.bus.emit(CampusEvent::NotesIndexingFailed {
                lecture_id: lecture_id.to_string(),
                reason: e.to_string(),
            });
            return Err(IndexError::Extraction(e.to_string()));
        }
    };
    info!("Extracted {} chars from {}", text.len(), pdf_path.display());

    let chunk_size: usize = get_setting_or(&state.db, "ai_chunk_size", "500")
        .await?
        .parse()
        .unwrap_or(500);
    let chunks = chunk_text(&text, chunk_size);
    let total = chunks.len();

    let provider = select_provider(&state.ollama, state.fallback_dim).await;
    info!(
        "Indexing {} chunks for lecture {} with {}",
        total,
        lecture_id,
        provider.model_name()
    );

    let mut embeddings = Vec::with_capacity(total);
    for (done, chunk) in chunks.into_iter().enumerate() {
        let vector = match provider.embed(&chunk).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!("Embedding chunk {}/{} failed: {}", done + 1, total, e);
                state.bus.emit(CampusEvent::NotesIndexingFailed {
                    lecture_id: lecture_id.to_string(),
                    reason: e.to_string(),
                });
                return Err(IndexError::Embedding(e.to_string()));
            }
        };
        embeddings.push(NewEmbedding {
            chunk,
            vector,
            model: provider.model_name().to_string(),
        });

        state.bus.emit(CampusEvent::NotesIndexingProgress {
            lecture_id: lecture_id.to_string(),
            chunks_done: done + 1,
            chunks_total: total,
        });
    }

    db::replace_lecture_embeddings(&state.db, &lecture.course_id, lecture_id, &embeddings).await?;

    state.bus.emit(CampusEvent::NotesIndexingCompleted {
        lecture_id: lecture_id.to_string(),
        chunk_count: embeddings.len(),
        timestamp: Utc::now(),
    });

    Ok(embeddings.len())
}
