//! Live lecture queries

use campus_common::db::models::LiveLecture;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

const LIVE_COLUMNS: &str = "guid, course_id, instructor_id, topic, description, start_time, \
                            duration_minutes, meeting_id, is_active, recording_path, notes_path, \
                            ended_at";

#[allow(clippy::too_many_arguments)]
pub async fn create(
    pool: &SqlitePool,
    guid: &str,
    course_id: &str,
    instructor_id: &str,
    topic: &str,
    description: Option<&str>,
    start_time: DateTime<Utc>,
    duration_minutes: i64,
    meeting_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO live_lectures
            (guid, course_id, instructor_id, topic, description, start_time, duration_minutes, meeting_id, is_active)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1)",
    )
    .bind(guid)
    .bind(course_id)
    .bind(instructor_id)
    .bind(topic)
    .bind(description)
    .bind(start_time)
    .bind(duration_minutes)
    .bind(meeting_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find_by_meeting(
    pool: &SqlitePool,
    meeting_id: &str,
) -> Result<Option<LiveLecture>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {} FROM live_lectures WHERE meeting_id = ?",
        LIVE_COLUMNS
    ))
    .bind(meeting_id)
    .fetch_optional(pool)
    .await
}

/// Schedule for one course, earliest first
pub async fn for_course(
    pool: &SqlitePool,
    course_id: &str,
) -> Result<Vec<LiveLecture>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {} FROM live_lectures WHERE course_id = ? ORDER BY start_time ASC",
        LIVE_COLUMNS
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

/// Every scheduled lecture (dashboard view), latest first
pub async fn all(pool: &SqlitePool) -> Result<Vec<LiveLecture>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {} FROM live_lectures ORDER BY start_time DESC",
        LIVE_COLUMNS
    ))
    .fetch_all(pool)
    .await
}

pub async fn end(pool: &SqlitePool, meeting_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE live_lectures SET is_active = 0, ended_at = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
         WHERE meeting_id = ? AND is_active = 1",
    )
    .bind(meeting_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn set_recording(
    pool: &SqlitePool,
    meeting_id: &str,
    recording_path: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE live_lectures SET recording_path = ?, updated_at = CURRENT_TIMESTAMP
         WHERE meeting_id = ?",
    )
    .bind(recording_path)
    .bind(meeting_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn set_notes(
    pool: &SqlitePool,
    meeting_id: &str,
    notes_path: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE live_lectures SET notes_path = ?, updated_at = CURRENT_TIMESTAMP
         WHERE meeting_id = ?",
    )
    .bind(notes_path)
    .bind(meeting_id)
    .execute(pool)
    .await?;

    Ok(())
}
