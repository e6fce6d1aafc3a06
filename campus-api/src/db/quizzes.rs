//! Quiz queries
//!
//! Submissions write the result, its graded responses, and the quiz's
//! running aggregates in one transaction so the analytics counters can never
//! drift from the stored results.

use campus_common::db::models::{Quiz, QuizQuestion, QuizResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

const QUIZ_COLUMNS: &str = "guid, course_id, lecture_id, title, created_by, total_attempts, \
                            total_score_sum, highest_score";

const QUESTION_COLUMNS: &str =
    "guid, quiz_id, position, text, option_a, option_b, option_c, option_d, correct_option";

const RESULT_COLUMNS: &str =
    "guid, quiz_id, user_id, score, total_questions, percentage, submitted_at";

/// New question payload for create/replace
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub text: String,
    pub options: [String; 4],
    pub correct_option: i64,
}

/// Graded response row to persist with a result
#[derive(Debug, Clone, Serialize)]
pub struct GradedResponse {
    pub question_id: String,
    pub selected_option: i64,
    pub correct_option: i64,
    pub is_correct: bool,
}

/// Per-user attempt joined with quiz metadata, for analytics
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AttemptWithQuiz {
    pub quiz_id: String,
    pub quiz_title: String,
    pub course_id: String,
    pub score: i64,
    pub total_questions: i64,
    pub percentage: f64,
    pub submitted_at: DateTime<Utc>,
}

/// Create a quiz with its questions
pub async fn create(
    pool: &SqlitePool,
    guid: &str,
    course_id: &str,
    lecture_id: &str,
    title: &str,
    created_by: &str,
    questions: &[NewQuestion],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO quizzes (guid, course_id, lecture_id, title, created_by)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(guid)
    .bind(course_id)
    .bind(lecture_id)
    .bind(title)
    .bind(created_by)
    .execute(&mut *tx)
    .await?;

    insert_questions(&mut tx, guid, questions).await?;

    tx.commit().await
}

async fn insert_questions(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    quiz_id: &str,
    questions: &[NewQuestion],
) -> Result<(), sqlx::Error> {
    for (position, question) in questions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO quiz_questions
                (guid, quiz_id, position, text, option_a, option_b, option_c, option_d, correct_option)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(quiz_id)
        .bind(position as i64)
        .bind(&question.text)
        .bind(&question.options[0])
        .bind(&question.options[1])
        .bind(&question.options[2])
        .bind(&question.options[3])
        .bind(question.correct_option)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

pub async fn find(pool: &SqlitePool, guid: &str) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {} FROM quizzes WHERE guid = ?", QUIZ_COLUMNS))
        .bind(guid)
        .fetch_optional(pool)
        .await
}

pub async fn by_lecture(pool: &SqlitePool, lecture_id: &str) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {} FROM quizzes WHERE lecture_id = ?", QUIZ_COLUMNS))
        .bind(lecture_id)
        .fetch_optional(pool)
        .await
}

pub async fn for_course(pool: &SqlitePool, course_id: &str) -> Result<Vec<Quiz>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {} FROM quizzes WHERE course_id = ? ORDER BY created_at ASC",
        QUIZ_COLUMNS
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub async fn questions(pool: &SqlitePool, quiz_id: &str) -> Result<Vec<QuizQuestion>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {} FROM quiz_questions WHERE quiz_id = ? ORDER BY position ASC",
        QUESTION_COLUMNS
    ))
    .bind(quiz_id)
    .fetch_all(pool)
    .await
}

/// Replace a quiz's title and question set
pub async fn replace(
    pool: &SqlitePool,
    quiz_id: &str,
    title: &str,
    questions: &[NewQuestion],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE quizzes SET title = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?")
        .bind(title)
        .bind(quiz_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM quiz_questions WHERE quiz_id = ?")
        .bind(quiz_id)
        .execute(&mut *tx)
        .await?;

    insert_questions(&mut tx, quiz_id, questions).await?;

    tx.commit().await
}

pub async fn delete(pool: &SqlitePool, quiz_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM quizzes WHERE guid = ?")
        .bind(quiz_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Persist a graded submission and update the quiz aggregates
pub async fn record_submission(
    pool: &SqlitePool,
    result_guid: &str,
    quiz_id: &str,
    user_id: &str,
    score: i64,
    total_questions: i64,
    percentage: f64,
    responses: &[GradedResponse],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO quiz_results (guid, quiz_id, user_id, score, total_questions, percentage)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(result_guid)
    .bind(quiz_id)
    .bind(user_id)
    .bind(score)
    .bind(total_questions)
    .bind(percentage)
    .execute(&mut *tx)
    .await?;

    for response in responses {
        sqlx::query(
            "INSERT INTO quiz_responses (result_id, question_id, selected_option, correct_option, is_correct)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(result_guid)
        .bind(&response.question_id)
        .bind(response.selected_option)
        .bind(response.correct_option)
        .bind(response.is_correct)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        "UPDATE quizzes SET
            total_attempts = total_attempts + 1,
            total_score_sum = total_score_sum + ?,
            highest_score = MAX(highest_score, ?),
            updated_at = CURRENT_TIMESTAMP
         WHERE guid = ?",
    )
    .bind(percentage)
    .bind(percentage)
    .bind(quiz_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

/// The user's most recent attempt at a quiz
pub async fn latest_attempt(
    pool: &SqlitePool,
    quiz_id: &str,
    user_id: &str,
) -> Result<Option<QuizResult>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {} FROM quiz_results WHERE quiz_id = ? AND user_id = ?
         ORDER BY submitted_at DESC, rowid DESC LIMIT 1",
        RESULT_COLUMNS
    ))
    .bind(quiz_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn responses_for_result(
    pool: &SqlitePool,
    result_id: &str,
) -> Result<Vec<GradedResponse>, sqlx::Error> {
    let rows: Vec<(String, i64, i64, bool)> = sqlx::query_as(
        "SELECT r.question_id, r.selected_option, r.correct_option, r.is_correct
         FROM quiz_responses r
         JOIN quiz_questions q ON q.guid = r.question_id
         WHERE r.result_id = ?
         ORDER BY q.position ASC",
    )
    .bind(result_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(question_id, selected_option, correct_option, is_correct)| GradedResponse {
            question_id,
            selected_option,
            correct_option,
            is_correct,
        })
        .collect())
}

/// All attempts by a user, newest first, joined with quiz metadata
pub async fn attempts_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<AttemptWithQuiz>, sqlx::Error> {
    sqlx::query_as(
        "SELECT r.quiz_id, q.title AS quiz_title, q.course_id,
                r.score, r.total_questions, r.percentage, r.submitted_at
         FROM quiz_results r
         JOIN quizzes q ON q.guid = r.quiz_id
         WHERE r.user_id = ?
         ORDER BY r.submitted_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
