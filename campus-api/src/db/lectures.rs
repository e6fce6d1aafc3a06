//! Lecture queries

use campus_common::db::models::Lecture;
use sqlx::SqlitePool;

const LECTURE_COLUMNS: &str =
    "guid, course_id, title, position, video_path, audio_path, notes_path, is_preview_free";

pub async fn create(
    pool: &SqlitePool,
    guid: &str,
    course_id: &str,
    title: &str,
) -> Result<(), sqlx::Error> {
    // Appended at the end of the course's ordering
    sqlx::query(
        "INSERT INTO lectures (guid, course_id, title, position)
         VALUES (?, ?, ?,
                 (SELECT COALESCE(MAX(position) + 1, 0) FROM lectures WHERE course_id = ?))",
    )
    .bind(guid)
    .bind(course_id)
    .bind(title)
    .bind(course_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find(pool: &SqlitePool, guid: &str) -> Result<Option<Lecture>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {} FROM lectures WHERE guid = ?", LECTURE_COLUMNS))
        .bind(guid)
        .fetch_optional(pool)
        .await
}

pub async fn for_course(pool: &SqlitePool, course_id: &str) -> Result<Vec<Lecture>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {} FROM lectures WHERE course_id = ? ORDER BY position ASC",
        LECTURE_COLUMNS
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub async fn update(
    pool: &SqlitePool,
    guid: &str,
    title: Option<&str>,
    is_preview_free: Option<bool>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE lectures SET
            title = COALESCE(?, title),
            is_preview_free = COALESCE(?, is_preview_free),
            updated_at = CURRENT_TIMESTAMP
         WHERE guid = ?",
    )
    .bind(title)
    .bind(is_preview_free)
    .bind(guid)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn set_media(
    pool: &SqlitePool,
    guid: &str,
    video_path: &str,
    audio_path: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE lectures SET video_path = ?, audio_path = ?, updated_at = CURRENT_TIMESTAMP
         WHERE guid = ?",
    )
    .bind(video_path)
    .bind(audio_path)
    .bind(guid)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn set_notes(
    pool: &SqlitePool,
    guid: &str,
    notes_path: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE lectures SET notes_path = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(notes_path)
    .bind(guid)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete(pool: &SqlitePool, guid: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM lectures WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
