//! User queries

use campus_common::db::models::User;
use sqlx::SqlitePool;

const USER_COLUMNS: &str =
    "guid, username, email, password_hash, password_salt, role, bio, photo_path, xp";

pub async fn create_user(
    pool: &SqlitePool,
    guid: &str,
    username: &str,
    email: &str,
    password_hash: &str,
    password_salt: &str,
    role: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (guid, username, email, password_hash, password_salt, role)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(guid)
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(password_salt)
    .bind(role)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {} FROM users WHERE username = ?",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_guid(pool: &SqlitePool, guid: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {} FROM users WHERE guid = ?", USER_COLUMNS))
        .bind(guid)
        .fetch_optional(pool)
        .await
}

pub async fn update_profile(
    pool: &SqlitePool,
    guid: &str,
    bio: Option<&str>,
    photo_path: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET
            bio = COALESCE(?, bio),
            photo_path = COALESCE(?, photo_path),
            updated_at = CURRENT_TIMESTAMP
         WHERE guid = ?",
    )
    .bind(bio)
    .bind(photo_path)
    .bind(guid)
    .execute(pool)
    .await?;

    Ok(())
}

/// Add XP to a user; awards are always non-negative
pub async fn add_xp(pool: &SqlitePool, guid: &str, amount: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET xp = xp + ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?")
        .bind(amount.max(0))
        .bind(guid)
        .execute(pool)
        .await?;

    Ok(())
}

/// Top users by XP for the leaderboard
pub async fn leaderboard(pool: &SqlitePool, limit: i64) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {} FROM users ORDER BY xp DESC, username ASC LIMIT ?",
        USER_COLUMNS
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}
