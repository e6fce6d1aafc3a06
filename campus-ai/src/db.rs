//! Database queries for the AI tutor service

use campus_common::db::models::{ChatMessage, EmbeddingRow, Lecture};
use sqlx::SqlitePool;
use uuid::Uuid;

const EMBEDDING_COLUMNS: &str = "guid, course_id, lecture_id, chunk, embedding, model, dim";

pub async fn find_lecture(pool: &SqlitePool, guid: &str) -> Result<Option<Lecture>, sqlx::Error> {
    sqlx::query_as(
        "SELECT guid, course_id, title, position, video_path, audio_path, notes_path, is_preview_free
         FROM lectures WHERE guid = ?",
    )
    .bind(guid)
    .fetch_optional(pool)
    .await
}

/// One chunk ready to store
pub struct NewEmbedding {
    pub chunk: String,
    pub vector: Vec<f32>,
    pub model: String,
}

/// Replace all embeddings of a lecture in one transaction.
///
/// Indexing is idempotent: re-running it for a lecture drops the previous
/// chunks instead of accumulating duplicates.
pub async fn replace_lecture_embeddings(
    pool: &SqlitePool,
    course_id: &str,
    lecture_id: &str,
    embeddings: &[NewEmbedding],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM ai_embeddings WHERE lecture_id = ?")
        .bind(lecture_id)
        .execute(&mut *tx)
        .await?;

    for embedding in embeddings {
        let json = serde_json::to_string(&embedding.vector)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        sqlx::query(
            "INSERT INTO ai_embeddings (guid, course_id, lecture_id, chunk, embedding, model, dim)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(course_id)
        .bind(lecture_id)
        .bind(&embedding.chunk)
        .bind(json)
        .bind(&embedding.model)
        .bind(embedding.vector.len() as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

/// All indexed chunks of a course
pub async fn embeddings_for_course(
    pool: &SqlitePool,
    course_id: &str,
) -> Result<Vec<EmbeddingRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {} FROM ai_embeddings WHERE course_id = ?",
        EMBEDDING_COLUMNS
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub async fn course_has_embeddings(
    pool: &SqlitePool,
    course_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM ai_embeddings WHERE course_id = ?)")
        .bind(course_id)
        .fetch_one(pool)
        .await
}

/// Find or create the per-(course, user) chat, returning its guid
pub async fn get_or_create_chat(
    pool: &SqlitePool,
    course_id: &str,
    user_id: &str,
) -> Result<String, sqlx::Error> {
    let existing: Option<(String,)> =
        sqlx::query_as("SELECT guid FROM ai_chats WHERE course_id = ? AND user_id = ?")
            .bind(course_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    if let Some((guid,)) = existing {
        return Ok(guid);
    }

    let guid = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO ai_chats (guid, course_id, user_id) VALUES (?, ?, ?)")
        .bind(&guid)
        .bind(course_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(guid)
}

/// Append one user/assistant exchange to a chat
pub async fn append_exchange(
    pool: &SqlitePool,
    chat_id: &str,
    question: &str,
    answer: &str,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for (role, content) in [("user", question), ("assistant", answer)] {
        sqlx::query(
            "INSERT INTO ai_chat_messages (guid, chat_id, role, content) VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(chat_id)
        .bind(role)
        .bind(content)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

/// Chat history oldest-first
pub async fn messages_for_chat(
    pool: &SqlitePool,
    chat_id: &str,
) -> Result<Vec<ChatMessage>, sqlx::Error> {
    sqlx::query_as(
        "SELECT guid, chat_id, role, content, created_at
         FROM ai_chat_messages WHERE chat_id = ?
         ORDER BY created_at ASC, rowid ASC",
    )
    .bind(chat_id)
    .fetch_all(pool)
    .await
}

/// Delete a user's chat for a course (messages cascade)
pub async fn clear_chat(
    pool: &SqlitePool,
    course_id: &str,
    user_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM ai_chats WHERE course_id = ? AND user_id = ?")
        .bind(course_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
