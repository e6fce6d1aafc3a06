//! Database initialization
//!
//! Creates the shared `campus.db` schema on first run and keeps runtime
//! defaults present in the `settings` table. All statements are idempotent,
//! so every service can call `init_database` at startup regardless of which
//! one starts first.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers with one writer; two services share this file
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema_version_table(&pool).await?;
    create_settings_table(&pool).await?;
    create_module_config_table(&pool).await?;

    create_users_table(&pool).await?;
    create_sessions_table(&pool).await?;

    create_courses_table(&pool).await?;
    create_lectures_table(&pool).await?;
    create_enrollments_table(&pool).await?;
    create_payment_orders_table(&pool).await?;

    create_quizzes_table(&pool).await?;
    create_quiz_questions_table(&pool).await?;
    create_quiz_results_table(&pool).await?;
    create_quiz_responses_table(&pool).await?;

    create_reviews_table(&pool).await?;
    create_course_messages_table(&pool).await?;
    create_message_votes_table(&pool).await?;

    create_live_lectures_table(&pool).await?;
    create_attention_sessions_table(&pool).await?;
    create_attention_samples_table(&pool).await?;

    // AI tutor tables (campus-ai specific)
    create_ai_embeddings_table(&pool).await?;
    create_ai_chats_table(&pool).await?;
    create_ai_chat_messages_table(&pool).await?;

    init_default_settings(&pool).await?;

    Ok(pool)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores application configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_module_config_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS module_config (
            module_name TEXT PRIMARY KEY CHECK (module_name IN ('api', 'ai_tutor', 'attention_engine')),
            host TEXT NOT NULL,
            port INTEGER NOT NULL CHECK (port > 0 AND port <= 65535),
            enabled INTEGER NOT NULL DEFAULT 1,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Initialize default module configurations. The attention engine is an
    // external process; its entry only records where to reach it.
    let defaults = vec![
        ("api", "127.0.0.1", 5730),
        ("ai_tutor", "127.0.0.1", 5731),
        ("attention_engine", "127.0.0.1", 7001),
    ];

    for (module_name, host, port) in defaults {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO module_config (module_name, host, port, enabled)
            VALUES (?, ?, ?, 1)
            "#,
        )
        .bind(module_name)
        .bind(host)
        .bind(port)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Create the users table
///
/// Rank is derived from xp at read time and never stored.
pub async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            password_salt TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'student' CHECK (role IN ('student', 'instructor')),
            bio TEXT,
            photo_path TEXT,
            xp INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (xp >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_xp ON users(xp)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            expires_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the courses table
pub async fn create_courses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS courses (
            guid TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            subtitle TEXT,
            description TEXT,
            category TEXT NOT NULL,
            level TEXT CHECK (level IS NULL OR level IN ('beginner', 'intermediate', 'advanced')),
            price_cents INTEGER NOT NULL DEFAULT 0,
            thumbnail_path TEXT,
            creator_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            is_published INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (price_cents >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_courses_creator ON courses(creator_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_courses_published ON courses(is_published)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the lectures table
///
/// Media columns hold paths relative to the media folder. Re-uploading
/// replaces the previous file on disk and the path here.
pub async fn create_lectures_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lectures (
            guid TEXT PRIMARY KEY,
            course_id TEXT NOT NULL REFERENCES courses(guid) ON DELETE CASCADE,
            title TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            video_path TEXT,
            audio_path TEXT,
            notes_path TEXT,
            is_preview_free INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (position >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_lectures_course ON lectures(course_id, position)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_enrollments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS enrollments (
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            course_id TEXT NOT NULL REFERENCES courses(guid) ON DELETE CASCADE,
            order_id TEXT,
            enrolled_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (user_id, course_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_enrollments_course ON enrollments(course_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_payment_orders_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payment_orders (
            order_id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            course_id TEXT NOT NULL REFERENCES courses(guid) ON DELETE CASCADE,
            amount_cents INTEGER NOT NULL,
            currency TEXT NOT NULL,
            provider_order_id TEXT,
            status TEXT NOT NULL DEFAULT 'created' CHECK (status IN ('created', 'paid', 'failed')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (amount_cents >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_payment_orders_user ON payment_orders(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the quizzes table
///
/// Aggregate columns are maintained on every submission so course analytics
/// never rescan quiz_results.
pub async fn create_quizzes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quizzes (
            guid TEXT PRIMARY KEY,
            course_id TEXT NOT NULL REFERENCES courses(guid) ON DELETE CASCADE,
            lecture_id TEXT NOT NULL UNIQUE REFERENCES lectures(guid) ON DELETE CASCADE,
            title TEXT NOT NULL,
            created_by TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            total_attempts INTEGER NOT NULL DEFAULT 0,
            total_score_sum REAL NOT NULL DEFAULT 0.0,
            highest_score REAL NOT NULL DEFAULT 0.0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (total_attempts >= 0),
            CHECK (total_score_sum >= 0.0),
            CHECK (highest_score >= 0.0 AND highest_score <= 100.0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_quizzes_course ON quizzes(course_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_quiz_questions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quiz_questions (
            guid TEXT PRIMARY KEY,
            quiz_id TEXT NOT NULL REFERENCES quizzes(guid) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            option_a TEXT NOT NULL,
            option_b TEXT NOT NULL,
            option_c TEXT NOT NULL,
            option_d TEXT NOT NULL,
            correct_option INTEGER NOT NULL CHECK (correct_option >= 0 AND correct_option <= 3),
            CHECK (position >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_quiz_questions_quiz ON quiz_questions(quiz_id, position)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_quiz_results_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quiz_results (
            guid TEXT PRIMARY KEY,
            quiz_id TEXT NOT NULL REFERENCES quizzes(guid) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            score INTEGER NOT NULL,
            total_questions INTEGER NOT NULL,
            percentage REAL NOT NULL,
            submitted_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (score >= 0),
            CHECK (total_questions > 0),
            CHECK (score <= total_questions),
            CHECK (percentage >= 0.0 AND percentage <= 100.0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_quiz_results_quiz ON quiz_results(quiz_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_quiz_results_user ON quiz_results(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_quiz_responses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quiz_responses (
            result_id TEXT NOT NULL REFERENCES quiz_results(guid) ON DELETE CASCADE,
            question_id TEXT NOT NULL REFERENCES quiz_questions(guid) ON DELETE CASCADE,
            selected_option INTEGER NOT NULL CHECK (selected_option >= -1 AND selected_option <= 3),
            correct_option INTEGER NOT NULL CHECK (correct_option >= 0 AND correct_option <= 3),
            is_correct INTEGER NOT NULL,
            PRIMARY KEY (result_id, question_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_reviews_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            guid TEXT PRIMARY KEY,
            course_id TEXT NOT NULL REFERENCES courses(guid) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            rating INTEGER NOT NULL CHECK (rating >= 1 AND rating <= 5),
            comment TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (course_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_course ON reviews(course_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_course_messages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS course_messages (
            guid TEXT PRIMARY KEY,
            course_id TEXT NOT NULL REFERENCES courses(guid) ON DELETE CASCADE,
            sender_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            body TEXT NOT NULL,
            upvotes INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (upvotes >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_course_messages_course ON course_messages(course_id, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_message_votes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS message_votes (
            message_id TEXT NOT NULL REFERENCES course_messages(guid) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (message_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the live_lectures table
pub async fn create_live_lectures_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS live_lectures (
            guid TEXT PRIMARY KEY,
            course_id TEXT NOT NULL REFERENCES courses(guid) ON DELETE CASCADE,
            instructor_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            topic TEXT NOT NULL,
            description TEXT,
            start_time TIMESTAMP NOT NULL,
            duration_minutes INTEGER NOT NULL DEFAULT 60,
            meeting_id TEXT NOT NULL UNIQUE,
            is_active INTEGER NOT NULL DEFAULT 0,
            recording_path TEXT,
            notes_path TEXT,
            ended_at TIMESTAMP,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (duration_minutes > 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_live_lectures_course ON live_lectures(course_id, start_time)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_attention_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attention_sessions (
            guid TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            lecture_id TEXT NOT NULL REFERENCES lectures(guid) ON DELETE CASCADE,
            started_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            ended_at TIMESTAMP,
            sample_count INTEGER NOT NULL DEFAULT 0,
            pause_count INTEGER NOT NULL DEFAULT 0,
            average_score REAL,
            CHECK (sample_count >= 0),
            CHECK (pause_count >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_attention_sessions_lecture ON attention_sessions(lecture_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_attention_samples_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attention_samples (
            session_id TEXT NOT NULL REFERENCES attention_sessions(guid) ON DELETE CASCADE,
            seq INTEGER NOT NULL,
            score REAL NOT NULL,
            face_conf REAL NOT NULL,
            gaze_conf REAL NOT NULL,
            head_conf REAL NOT NULL,
            sampled_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (session_id, seq),
            CHECK (score >= 0.0 AND score <= 100.0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the ai_embeddings table
///
/// The vector is stored as a JSON array of f32; dim is recorded so vectors
/// produced by different providers never get compared.
pub async fn create_ai_embeddings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ai_embeddings (
            guid TEXT PRIMARY KEY,
            course_id TEXT NOT NULL REFERENCES courses(guid) ON DELETE CASCADE,
            lecture_id TEXT NOT NULL REFERENCES lectures(guid) ON DELETE CASCADE,
            chunk TEXT NOT NULL,
            embedding TEXT NOT NULL,
            model TEXT NOT NULL,
            dim INTEGER NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (dim > 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ai_embeddings_course ON ai_embeddings(course_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ai_embeddings_lecture ON ai_embeddings(lecture_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_ai_chats_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ai_chats (
            guid TEXT PRIMARY KEY,
            course_id TEXT NOT NULL REFERENCES courses(guid) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (course_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_ai_chat_messages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ai_chat_messages (
            guid TEXT PRIMARY KEY,
            chat_id TEXT NOT NULL REFERENCES ai_chats(guid) ON DELETE CASCADE,
            role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
            content TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_ai_chat_messages_chat ON ai_chat_messages(chat_id, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize or update default settings
///
/// Ensures all required settings exist with default values, and resets NULL
/// values back to defaults.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    // Session and authentication settings
    ensure_setting(pool, "session_timeout_seconds", "31536000").await?; // 1 year

    // Upload limits (videos are large, notes are PDFs)
    ensure_setting(pool, "media_max_video_bytes", "524288000").await?; // 500 MB
    ensure_setting(pool, "media_max_notes_bytes", "52428800").await?; // 50 MB
    ensure_setting(pool, "media_max_image_bytes", "10485760").await?; // 10 MB

    // Gamification
    ensure_setting(pool, "xp_quiz_factor", "0.5").await?; // xp = percentage * factor
    ensure_setting(pool, "xp_review_award", "20").await?;
    ensure_setting(pool, "xp_live_attendance_award", "15").await?;
    ensure_setting(pool, "leaderboard_size", "20").await?;

    // Attention tracking thresholds
    ensure_setting(pool, "attention_low_threshold", "40.0").await?;
    ensure_setting(pool, "attention_high_threshold", "60.0").await?;
    ensure_setting(pool, "attention_low_trigger", "3").await?;
    ensure_setting(pool, "attention_high_trigger", "2").await?;
    ensure_setting(pool, "attention_engine_timeout_ms", "5000").await?;

    // Payment provider
    ensure_setting(pool, "payment_currency", "INR").await?;
    ensure_setting(pool, "payment_api_url", "https://api.razorpay.com/v1").await?;

    // Video service tokens
    ensure_setting(pool, "video_token_ttl_seconds", "3600").await?;

    // AI tutor settings
    ensure_setting(pool, "ollama_url", "http://127.0.0.1:11434").await?;
    ensure_setting(pool, "ollama_model", "phi3:mini").await?;
    ensure_setting(pool, "ollama_embed_model", "nomic-embed-text").await?;
    ensure_setting(pool, "ollama_timeout_ms", "60000").await?;
    ensure_setting(pool, "ollama_probe_timeout_ms", "1500").await?;
    ensure_setting(pool, "ai_chunk_size", "500").await?;
    ensure_setting(pool, "ai_top_k", "5").await?;
    ensure_setting(pool, "ai_fallback_embedding_dim", "384").await?;

    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it will be created with the default.
/// If the setting exists but has a NULL value, it will be reset to the default.
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if !exists {
        // Use INSERT OR IGNORE to handle concurrent initialization race conditions
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(default_value)
            .execute(pool)
            .await?;
        return Ok(());
    }

    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if value.is_none() {
        sqlx::query("UPDATE settings SET value = ? WHERE key = ?")
            .bind(default_value)
            .bind(key)
            .execute(pool)
            .await?;
        warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
    }

    Ok(())
}

/// Read a setting value, falling back to the given default when missing
pub async fn get_setting_or(pool: &SqlitePool, key: &str, default: &str) -> Result<String> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?
        .flatten();

    Ok(value.unwrap_or_else(|| default.to_string()))
}

/// Write a setting value
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}
