//! Database models shared across services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub guid: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub password_salt: String,
    pub role: String,
    pub bio: Option<String>,
    pub photo_path: Option<String>,
    pub xp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Course {
    pub guid: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub level: Option<String>,
    pub price_cents: i64,
    pub thumbnail_path: Option<String>,
    pub creator_id: String,
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Lecture {
    pub guid: String,
    pub course_id: String,
    pub title: String,
    pub position: i64,
    pub video_path: Option<String>,
    pub audio_path: Option<String>,
    pub notes_path: Option<String>,
    pub is_preview_free: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Quiz {
    pub guid: String,
    pub course_id: String,
    pub lecture_id: String,
    pub title: String,
    pub created_by: String,
    pub total_attempts: i64,
    pub total_score_sum: f64,
    pub highest_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct QuizQuestion {
    pub guid: String,
    pub quiz_id: String,
    pub position: i64,
    pub text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_option: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct QuizResult {
    pub guid: String,
    pub quiz_id: String,
    pub user_id: String,
    pub score: i64,
    pub total_questions: i64,
    pub percentage: f64,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LiveLecture {
    pub guid: String,
    pub course_id: String,
    pub instructor_id: String,
    pub topic: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub meeting_id: String,
    pub is_active: bool,
    pub recording_path: Option<String>,
    pub notes_path: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Review {
    pub guid: String,
    pub course_id: String,
    pub user_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CourseMessage {
    pub guid: String,
    pub course_id: String,
    pub sender_id: String,
    pub body: String,
    pub upvotes: i64,
    pub created_at: DateTime<Utc>,
}

/// One indexed chunk of lecture notes with its embedding vector.
///
/// The vector is stored as a JSON array; decode with [`EmbeddingRow::vector`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct EmbeddingRow {
    pub guid: String,
    pub course_id: String,
    pub lecture_id: String,
    pub chunk: String,
    pub embedding: String,
    pub model: String,
    pub dim: i64,
}

impl EmbeddingRow {
    /// Decode the stored JSON vector
    pub fn vector(&self) -> Result<Vec<f32>, serde_json::Error> {
        serde_json::from_str(&self.embedding)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ChatMessage {
    pub guid: String,
    pub chat_id: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
