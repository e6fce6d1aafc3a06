//! Attention session queries

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

/// Attention session row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AttentionSession {
    pub guid: String,
    pub user_id: String,
    pub lecture_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub sample_count: i64,
    pub pause_count: i64,
    pub average_score: Option<f64>,
}

/// Per-lecture aggregate for instructors
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LectureAttentionSummary {
    pub lecture_id: String,
    pub session_count: i64,
    pub total_samples: i64,
    pub total_pauses: i64,
    pub average_score: Option<f64>,
}

pub async fn create_session(
    pool: &SqlitePool,
    guid: &str,
    user_id: &str,
    lecture_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO attention_sessions (guid, user_id, lecture_id) VALUES (?, ?, ?)")
        .bind(guid)
        .bind(user_id)
        .bind(lecture_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn find_session(
    pool: &SqlitePool,
    guid: &str,
) -> Result<Option<AttentionSession>, sqlx::Error> {
    sqlx::query_as(
        "SELECT guid, user_id, lecture_id, started_at, ended_at, sample_count, pause_count, average_score
         FROM attention_sessions WHERE guid = ?",
    )
    .bind(guid)
    .fetch_optional(pool)
    .await
}

/// Record one scored frame; bumps the sample counter and, when the tracker
/// paused playback, the pause counter.
pub async fn record_sample(
    pool: &SqlitePool,
    session_id: &str,
    score: f64,
    face_conf: f64,
    gaze_conf: f64,
    head_conf: f64,
    paused: bool,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO attention_samples (session_id, seq, score, face_conf, gaze_conf, head_conf)
         VALUES (?, (SELECT COALESCE(MAX(seq) + 1, 0) FROM attention_samples WHERE session_id = ?),
                 ?, ?, ?, ?)",
    )
    .bind(session_id)
    .bind(session_id)
    .bind(score)
    .bind(face_conf)
    .bind(gaze_conf)
    .bind(head_conf)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE attention_sessions SET
            sample_count = sample_count + 1,
            pause_count = pause_count + ?
         WHERE guid = ?",
    )
    .bind(if paused { 1 } else { 0 })
    .bind(session_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

/// Close a session and store its average score
pub async fn end_session(pool: &SqlitePool, guid: &str) -> Result<Option<f64>, sqlx::Error> {
    let average: Option<f64> = sqlx::query_scalar(
        "SELECT AVG(score) FROM attention_samples WHERE session_id = ?",
    )
    .bind(guid)
    .fetch_one(pool)
    .await?;

    sqlx::query(
        "UPDATE attention_sessions SET ended_at = CURRENT_TIMESTAMP, average_score = ?
         WHERE guid = ? AND ended_at IS NULL",
    )
    .bind(average)
    .bind(guid)
    .execute(pool)
    .await?;

    Ok(average)
}

pub async fn lecture_summary(
    pool: &SqlitePool,
    lecture_id: &str,
) -> Result<LectureAttentionSummary, sqlx::Error> {
    sqlx::query_as(
        "SELECT ? AS lecture_id,
                COUNT(*) AS session_count,
                COALESCE(SUM(s.sample_count), 0) AS total_samples,
                COALESCE(SUM(s.pause_count), 0) AS total_pauses,
                AVG(s.average_score) AS average_score
         FROM attention_sessions s
         WHERE s.lecture_id = ?",
    )
    .bind(lecture_id)
    .bind(lecture_id)
    .fetch_one(pool)
    .await
}
