//! Course queries

use campus_common::db::models::Course;
use serde::Serialize;
use sqlx::SqlitePool;

const COURSE_COLUMNS: &str = "guid, title, subtitle, description, category, level, price_cents, \
                              thumbnail_path, creator_id, is_published";

/// Course row with catalog statistics
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CourseSummary {
    pub guid: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub category: String,
    pub level: Option<String>,
    pub price_cents: i64,
    pub thumbnail_path: Option<String>,
    pub creator_id: String,
    pub lecture_count: i64,
    pub review_count: i64,
    pub average_rating: Option<f64>,
}

pub async fn create(
    pool: &SqlitePool,
    guid: &str,
    title: &str,
    category: &str,
    creator_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO courses (guid, title, category, creator_id) VALUES (?, ?, ?, ?)")
        .bind(guid)
        .bind(title)
        .bind(category)
        .bind(creator_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn find(pool: &SqlitePool, guid: &str) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {} FROM courses WHERE guid = ?", COURSE_COLUMNS))
        .bind(guid)
        .fetch_optional(pool)
        .await
}

/// Published courses with lecture/review counts and average rating
pub async fn published_with_stats(pool: &SqlitePool) -> Result<Vec<CourseSummary>, sqlx::Error> {
    sqlx::query_as(
        "SELECT c.guid, c.title, c.subtitle, c.category, c.level, c.price_cents,
                c.thumbnail_path, c.creator_id,
                (SELECT COUNT(*) FROM lectures l WHERE l.course_id = c.guid) AS lecture_count,
                (SELECT COUNT(*) FROM reviews r WHERE r.course_id = c.guid) AS review_count,
                (SELECT AVG(CAST(r.rating AS REAL)) FROM reviews r WHERE r.course_id = c.guid) AS average_rating
         FROM courses c
         WHERE c.is_published = 1
         ORDER BY c.created_at DESC",
    )
    .fetch_all(pool)
    .await
}

pub async fn by_creator(pool: &SqlitePool, creator_id: &str) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {} FROM courses WHERE creator_id = ? ORDER BY created_at DESC",
        COURSE_COLUMNS
    ))
    .bind(creator_id)
    .fetch_all(pool)
    .await
}

/// Partial update; None leaves the column untouched
#[allow(clippy::too_many_arguments)]
pub async fn update(
    pool: &SqlitePool,
    guid: &str,
    title: Option<&str>,
    subtitle: Option<&str>,
    description: Option<&str>,
    category: Option<&str>,
    level: Option<&str>,
    price_cents: Option<i64>,
    is_published: Option<bool>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE courses SET
            title = COALESCE(?, title),
            subtitle = COALESCE(?, subtitle),
            description = COALESCE(?, description),
            category = COALESCE(?, category),
            level = COALESCE(?, level),
            price_cents = COALESCE(?, price_cents),
            is_published = COALESCE(?, is_published),
            updated_at = CURRENT_TIMESTAMP
         WHERE guid = ?",
    )
    .bind(title)
    .bind(subtitle)
    .bind(description)
    .bind(category)
    .bind(level)
    .bind(price_cents)
    .bind(is_published)
    .bind(guid)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn set_thumbnail(
    pool: &SqlitePool,
    guid: &str,
    thumbnail_path: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE courses SET thumbnail_path = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(thumbnail_path)
    .bind(guid)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a course; child rows cascade via foreign keys
pub async fn delete(pool: &SqlitePool, guid: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM courses WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
