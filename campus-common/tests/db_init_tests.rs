//! Integration tests for database initialization
//!
//! Covers schema creation, default settings, and session lifecycle against
//! a real on-disk SQLite database.

use campus_common::auth;
use campus_common::db;
use tempfile::TempDir;

async fn fresh_db() -> (TempDir, sqlx::SqlitePool) {
    let dir = TempDir::new().expect("create temp dir");
    let pool = db::init_database(&dir.path().join("campus.db"))
        .await
        .expect("init database");
    (dir, pool)
}

#[tokio::test]
async fn test_init_creates_all_tables() {
    let (_dir, pool) = fresh_db().await;

    let tables: Vec<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(&pool)
            .await
            .unwrap();
    let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();

    for expected in [
        "settings",
        "module_config",
        "users",
        "sessions",
        "courses",
        "lectures",
        "enrollments",
        "payment_orders",
        "quizzes",
        "quiz_questions",
        "quiz_results",
        "quiz_responses",
        "reviews",
        "course_messages",
        "message_votes",
        "live_lectures",
        "attention_sessions",
        "attention_samples",
        "ai_embeddings",
        "ai_chats",
        "ai_chat_messages",
    ] {
        assert!(names.contains(&expected), "missing table {}", expected);
    }
}

#[tokio::test]
async fn test_init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("campus.db");

    let pool1 = db::init_database(&path).await.unwrap();
    drop(pool1);
    // Second init over the same file must not fail or duplicate defaults
    let pool2 = db::init_database(&path).await.unwrap();

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM module_config WHERE module_name = 'api'")
            .fetch_one(&pool2)
            .await
            .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_default_settings_present() {
    let (_dir, pool) = fresh_db().await;

    let chunk = db::get_setting_or(&pool, "ai_chunk_size", "0").await.unwrap();
    assert_eq!(chunk, "500");

    let model = db::get_setting_or(&pool, "ollama_model", "").await.unwrap();
    assert_eq!(model, "phi3:mini");

    let low = db::get_setting_or(&pool, "attention_low_threshold", "0").await.unwrap();
    assert_eq!(low, "40.0");
}

#[tokio::test]
async fn test_ensure_setting_preserves_existing_value() {
    let (_dir, pool) = fresh_db().await;

    db::set_setting(&pool, "ai_top_k", "9").await.unwrap();
    db::ensure_setting(&pool, "ai_top_k", "5").await.unwrap();

    let value = db::get_setting_or(&pool, "ai_top_k", "5").await.unwrap();
    assert_eq!(value, "9");
}

#[tokio::test]
async fn test_ensure_setting_resets_null() {
    let (_dir, pool) = fresh_db().await;

    sqlx::query("UPDATE settings SET value = NULL WHERE key = 'ai_top_k'")
        .execute(&pool)
        .await
        .unwrap();
    db::ensure_setting(&pool, "ai_top_k", "5").await.unwrap();

    let value = db::get_setting_or(&pool, "ai_top_k", "0").await.unwrap();
    assert_eq!(value, "5");
}

#[tokio::test]
async fn test_session_lifecycle() {
    let (_dir, pool) = fresh_db().await;

    sqlx::query(
        "INSERT INTO users (guid, username, email, password_hash, password_salt)
         VALUES ('u1', 'alice', 'alice@example.com', 'h', 's')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let token = auth::create_session(&pool, "u1", 3600).await.unwrap();
    let user_id = auth::validate_session(&pool, &token).await.unwrap();
    assert_eq!(user_id, "u1");

    auth::delete_session(&pool, &token).await.unwrap();
    assert!(auth::validate_session(&pool, &token).await.is_err());
}

#[tokio::test]
async fn test_expired_session_rejected_and_removed() {
    let (_dir, pool) = fresh_db().await;

    sqlx::query(
        "INSERT INTO users (guid, username, email, password_hash, password_salt)
         VALUES ('u1', 'alice', 'alice@example.com', 'h', 's')",
    )
    .execute(&pool)
    .await
    .unwrap();

    // Negative timeout puts the expiry in the past
    let token = auth::create_session(&pool, "u1", -10).await.unwrap();
    assert!(auth::validate_session(&pool, &token).await.is_err());

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_quiz_lecture_uniqueness_enforced() {
    let (_dir, pool) = fresh_db().await;

    sqlx::query(
        "INSERT INTO users (guid, username, email, password_hash, password_salt)
         VALUES ('u1', 'alice', 'alice@example.com', 'h', 's')",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO courses (guid, title, category, creator_id) VALUES ('c1', 'Rust', 'dev', 'u1')",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO lectures (guid, course_id, title) VALUES ('l1', 'c1', 'Intro')")
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query(
        "INSERT INTO quizzes (guid, course_id, lecture_id, title, created_by)
         VALUES ('q1', 'c1', 'l1', 'Quiz 1', 'u1')",
    )
    .execute(&pool)
    .await
    .unwrap();

    // A second quiz for the same lecture violates the unique constraint
    let dup = sqlx::query(
        "INSERT INTO quizzes (guid, course_id, lecture_id, title, created_by)
         VALUES ('q2', 'c1', 'l1', 'Quiz 2', 'u1')",
    )
    .execute(&pool)
    .await;
    assert!(dup.is_err());
}
