//! Enrollment and payment order queries

use campus_common::db::models::Course;
use serde::Serialize;
use sqlx::SqlitePool;

/// Payment order row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PaymentOrder {
    pub order_id: String,
    pub user_id: String,
    pub course_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub provider_order_id: Option<String>,
    pub status: String,
}

pub async fn create_order(
    pool: &SqlitePool,
    order_id: &str,
    user_id: &str,
    course_id: &str,
    amount_cents: i64,
    currency: &str,
    provider_order_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO payment_orders (order_id, user_id, course_id, amount_cents, currency, provider_order_id)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(order_id)
    .bind(user_id)
    .bind(course_id)
    .bind(amount_cents)
    .bind(currency)
    .bind(provider_order_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find_order(
    pool: &SqlitePool,
    order_id: &str,
) -> Result<Option<PaymentOrder>, sqlx::Error> {
    sqlx::query_as(
        "SELECT order_id, user_id, course_id, amount_cents, currency, provider_order_id, status
         FROM payment_orders WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await
}

pub async fn mark_order(
    pool: &SqlitePool,
    order_id: &str,
    status: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE payment_orders SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE order_id = ?",
    )
    .bind(status)
    .bind(order_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Enroll a user; duplicate enrollment is a no-op
pub async fn enroll(
    pool: &SqlitePool,
    user_id: &str,
    course_id: &str,
    order_id: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT OR IGNORE INTO enrollments (user_id, course_id, order_id) VALUES (?, ?, ?)",
    )
    .bind(user_id)
    .bind(course_id)
    .bind(order_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn is_enrolled(
    pool: &SqlitePool,
    user_id: &str,
    course_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM enrollments WHERE user_id = ? AND course_id = ?)",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(pool)
    .await
}

/// Courses the user is enrolled in, most recent enrollment first
pub async fn courses_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as(
        "SELECT c.guid, c.title, c.subtitle, c.description, c.category, c.level, c.price_cents,
                c.thumbnail_path, c.creator_id, c.is_published
         FROM enrollments e
         JOIN courses c ON c.guid = e.course_id
         WHERE e.user_id = ?
         ORDER BY e.enrolled_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
