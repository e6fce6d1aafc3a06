//! Review queries

use campus_common::db::models::Review;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

/// Review joined with the reviewer's username
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReviewWithAuthor {
    pub guid: String,
    pub course_id: String,
    pub user_id: String,
    pub username: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub async fn create(
    pool: &SqlitePool,
    guid: &str,
    course_id: &str,
    user_id: &str,
    rating: i64,
    comment: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO reviews (guid, course_id, user_id, rating, comment) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(guid)
    .bind(course_id)
    .bind(user_id)
    .bind(rating)
    .bind(comment)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find(pool: &SqlitePool, guid: &str) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as(
        "SELECT guid, course_id, user_id, rating, comment, created_at FROM reviews WHERE guid = ?",
    )
    .bind(guid)
    .fetch_optional(pool)
    .await
}

pub async fn exists_for(
    pool: &SqlitePool,
    course_id: &str,
    user_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM reviews WHERE course_id = ? AND user_id = ?)")
        .bind(course_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn for_course(
    pool: &SqlitePool,
    course_id: &str,
) -> Result<Vec<ReviewWithAuthor>, sqlx::Error> {
    sqlx::query_as(
        "SELECT r.guid, r.course_id, r.user_id, u.username, r.rating, r.comment, r.created_at
         FROM reviews r
         JOIN users u ON u.guid = r.user_id
         WHERE r.course_id = ?
         ORDER BY r.created_at DESC",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub async fn average_rating(
    pool: &SqlitePool,
    course_id: &str,
) -> Result<Option<f64>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT AVG(CAST(rating AS REAL)) FROM reviews WHERE course_id = ?",
    )
    .bind(course_id)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &SqlitePool, guid: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reviews WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
