//! Course discussion queries

use campus_common::db::models::CourseMessage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

/// Message joined with the sender's username
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MessageWithSender {
    pub guid: String,
    pub course_id: String,
    pub sender_id: String,
    pub username: String,
    pub body: String,
    pub upvotes: i64,
    pub created_at: DateTime<Utc>,
}

pub async fn post(
    pool: &SqlitePool,
    guid: &str,
    course_id: &str,
    sender_id: &str,
    body: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO course_messages (guid, course_id, sender_id, body) VALUES (?, ?, ?, ?)")
        .bind(guid)
        .bind(course_id)
        .bind(sender_id)
        .bind(body)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn find(pool: &SqlitePool, guid: &str) -> Result<Option<CourseMessage>, sqlx::Error> {
    sqlx::query_as(
        "SELECT guid, course_id, sender_id, body, upvotes, created_at
         FROM course_messages WHERE guid = ?",
    )
    .bind(guid)
    .fetch_optional(pool)
    .await
}

/// Newest messages first
pub async fn for_course(
    pool: &SqlitePool,
    course_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<MessageWithSender>, sqlx::Error> {
    sqlx::query_as(
        "SELECT m.guid, m.course_id, m.sender_id, u.username, m.body, m.upvotes, m.created_at
         FROM course_messages m
         JOIN users u ON u.guid = m.sender_id
         WHERE m.course_id = ?
         ORDER BY m.created_at DESC, m.rowid DESC
         LIMIT ? OFFSET ?",
    )
    .bind(course_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Record an upvote; one per user per message.
///
/// Returns the new vote count, or None when this user already voted.
pub async fn upvote(
    pool: &SqlitePool,
    message_id: &str,
    user_id: &str,
) -> Result<Option<i64>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query("INSERT OR IGNORE INTO message_votes (message_id, user_id) VALUES (?, ?)")
        .bind(message_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if inserted == 0 {
        tx.rollback().await?;
        return Ok(None);
    }

    sqlx::query("UPDATE course_messages SET upvotes = upvotes + 1 WHERE guid = ?")
        .bind(message_id)
        .execute(&mut *tx)
        .await?;

    let upvotes: i64 = sqlx::query_scalar("SELECT upvotes FROM course_messages WHERE guid = ?")
        .bind(message_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(upvotes))
}
