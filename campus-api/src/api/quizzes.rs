//! Quiz handlers and grading
//!
//! Grading happens server-side against the stored correct options; clients
//! only ever send selected option indexes.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use campus_common::db::models::QuizQuestion;
use campus_common::events::CampusEvent;
use campus_common::rank::quiz_xp;

use crate::api::auth::CurrentUser;
use crate::api::ApiError;
use crate::db;
use crate::db::quizzes::{GradedResponse, NewQuestion};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct QuestionPayload {
    pub text: String,
    pub options: Vec<String>,
    pub correct_option: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateQuizRequest {
    pub title: String,
    pub course_id: String,
    pub lecture_id: String,
    pub questions: Vec<QuestionPayload>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuizRequest {
    pub title: String,
    pub questions: Vec<QuestionPayload>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    /// Selected option index per question, in question order; -1 = skipped
    pub answers: Vec<i64>,
}

fn validate_questions(payload: &[QuestionPayload]) -> Result<Vec<NewQuestion>, ApiError> {
    if payload.is_empty() {
        return Err(ApiError::BadRequest("A quiz needs at least one question".to_string()));
    }

    payload
        .iter()
        .map(|q| {
            if q.text.trim().is_empty() {
                return Err(ApiError::BadRequest("Question text required".to_string()));
            }
            let options: [String; 4] = q
                .options
                .clone()
                .try_into()
                .map_err(|_| ApiError::BadRequest("Each question needs exactly 4 options".to_string()))?;
            if !(0..=3).contains(&q.correct_option) {
                return Err(ApiError::BadRequest("correct_option must be 0..=3".to_string()));
            }
            Ok(NewQuestion { text: q.text.clone(), options, correct_option: q.correct_option })
        })
        .collect()
}

/// POST /api/quiz
pub async fn create_quiz(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateQuizRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Quiz title required".to_string()));
    }
    let questions = validate_questions(&req.questions)?;

    let course = db::courses::find(&state.db, &req.course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?;

    let lecture = db::lectures::find(&state.db, &req.lecture_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lecture"))?;
    if lecture.course_id != course.guid {
        return Err(ApiError::BadRequest("Lecture does not belong to this course".to_string()));
    }

    if db::quizzes::by_lecture(&state.db, &req.lecture_id).await?.is_some() {
        return Err(ApiError::Conflict("Quiz already exists for this lecture".to_string()));
    }

    let guid = Uuid::new_v4().to_string();
    db::quizzes::create(
        &state.db,
        &guid,
        &req.course_id,
        &req.lecture_id,
        req.title.trim(),
        &user.id,
        &questions,
    )
    .await?;

    let quiz = db::quizzes::find(&state.db, &guid)
        .await?
        .ok_or_else(|| ApiError::not_found("Quiz"))?;

    Ok(Json(json!({ "quiz": quiz })))
}

/// GET /api/quiz/lecture/:lecture_id
///
/// Students get the questions without correct options; the quiz creator
/// also gets the answer key.
pub async fn get_quiz_by_lecture(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(lecture_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let quiz = db::quizzes::by_lecture(&state.db, &lecture_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Quiz"))?;

    let questions = db::quizzes::questions(&state.db, &quiz.guid).await?;
    let include_answers = quiz.created_by == user.id;

    let questions: Vec<Value> = questions
        .iter()
        .map(|q| {
            let mut item = json!({
                "guid": q.guid,
                "position": q.position,
                "text": q.text,
                "options": [q.option_a, q.option_b, q.option_c, q.option_d],
            });
            if include_answers {
                item["correct_option"] = json!(q.correct_option);
            }
            item
        })
        .collect();

    Ok(Json(json!({ "quiz": quiz, "questions": questions })))
}

/// PUT /api/quiz/:quiz_id
pub async fn update_quiz(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(quiz_id): Path<String>,
    Json(req): Json<UpdateQuizRequest>,
) -> Result<Json<Value>, ApiError> {
    let quiz = db::quizzes::find(&state.db, &quiz_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Quiz"))?;
    if quiz.created_by != user.id {
        return Err(ApiError::Forbidden("Only the quiz creator can edit it".to_string()));
    }

    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Quiz title required".to_string()));
    }
    let questions = validate_questions(&req.questions)?;

    db::quizzes::replace(&state.db, &quiz_id, req.title.trim(), &questions).await?;

    let updated = db::quizzes::find(&state.db, &quiz_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Quiz"))?;

    Ok(Json(json!({ "quiz": updated })))
}

/// DELETE /api/quiz/:quiz_id
pub async fn delete_quiz(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(quiz_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let quiz = db::quizzes::find(&state.db, &quiz_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Quiz"))?;
    if quiz.created_by != user.id {
        return Err(ApiError::Forbidden("Only the quiz creator can delete it".to_string()));
    }

    db::quizzes::delete(&state.db, &quiz_id).await?;
    Ok(Json(json!({ "message": "Quiz deleted" })))
}

/// POST /api/quiz/:quiz_id/submit
pub async fn submit_quiz(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(quiz_id): Path<String>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<Json<Value>, ApiError> {
    let quiz = db::quizzes::find(&state.db, &quiz_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Quiz"))?;

    let questions = db::quizzes::questions(&state.db, &quiz_id).await?;
    if req.answers.len() != questions.len() {
        return Err(ApiError::BadRequest(format!(
            "Expected {} answers, got {}",
            questions.len(),
            req.answers.len()
        )));
    }

    let graded = grade(&questions, &req.answers);

    let result_guid = Uuid::new_v4().to_string();
    db::quizzes::record_submission(
        &state.db,
        &result_guid,
        &quiz_id,
        &user.id,
        graded.score,
        questions.len() as i64,
        graded.percentage,
        &graded.responses,
    )
    .await?;

    // XP scales with the graded percentage
    let factor: f64 = campus_common::db::get_setting_or(&state.db, "xp_quiz_factor", "0.5")
        .await?
        .parse()
        .unwrap_or(0.5);
    db::users::add_xp(&state.db, &user.id, quiz_xp(graded.percentage, factor)).await?;

    state.bus.emit(CampusEvent::QuizSubmitted {
        quiz_id: quiz_id.clone(),
        user_id: user.id.clone(),
        percentage: graded.percentage,
        timestamp: Utc::now(),
    });

    Ok(Json(json!({
        "result_id": result_guid,
        "score": graded.score,
        "total_questions": questions.len(),
        "percentage": graded.percentage,
        "responses": graded.responses,
    })))
}

/// GET /api/quiz/:quiz_id/attempt
pub async fn get_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(quiz_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let result = db::quizzes::latest_attempt(&state.db, &quiz_id, &user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Attempt"))?;

    let responses = db::quizzes::responses_for_result(&state.db, &result.guid).await?;

    Ok(Json(json!({ "result": result, "responses": responses })))
}

/// GET /api/quiz/course/:course_id
///
/// Quizzes of a course with their aggregate statistics.
pub async fn course_quizzes(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let quizzes = db::quizzes::for_course(&state.db, &course_id).await?;

    let entries: Vec<Value> = quizzes
        .iter()
        .map(|q| {
            let average = if q.total_attempts > 0 {
                Some(q.total_score_sum / q.total_attempts as f64)
            } else {
                None
            };
            json!({
                "quiz": q,
                "attempts": q.total_attempts,
                "average_percentage": average,
                "highest_score": q.highest_score,
            })
        })
        .collect();

    Ok(Json(json!({ "quizzes": entries })))
}

/// GET /api/quiz/user/analytics
///
/// The caller's performance across all quizzes.
pub async fn student_performance(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let attempts = db::quizzes::attempts_for_user(&state.db, &user.id).await?;

    let total = attempts.len();
    let average = if total > 0 {
        Some(attempts.iter().map(|a| a.percentage).sum::<f64>() / total as f64)
    } else {
        None
    };
    let best = attempts.iter().map(|a| a.percentage).fold(None, |acc: Option<f64>, p| {
        Some(acc.map_or(p, |b| b.max(p)))
    });

    Ok(Json(json!({
        "total_attempts": total,
        "average_percentage": average,
        "best_percentage": best,
        "attempts": attempts,
    })))
}

// ========================================
// Grading
// ========================================

struct GradedSubmission {
    score: i64,
    percentage: f64,
    responses: Vec<GradedResponse>,
}

/// Grade answers against the stored questions.
///
/// `percentage = round(correct / total * 100, 2)` — two decimals, matching
/// the documented API contract.
fn grade(questions: &[QuizQuestion], answers: &[i64]) -> GradedSubmission {
    let mut score = 0i64;
    let mut responses = Vec::with_capacity(questions.len());

    for (question, &selected) in questions.iter().zip(answers) {
        let is_correct = selected == question.correct_option;
        if is_correct {
            score += 1;
        }
        responses.push(GradedResponse {
            question_id: question.guid.clone(),
            selected_option: selected.clamp(-1, 3),
            correct_option: question.correct_option,
            is_correct,
        });
    }

    let percentage = if questions.is_empty() {
        0.0
    } else {
        round2(score as f64 / questions.len() as f64 * 100.0)
    };

    GradedSubmission { score, percentage, responses }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(guid: &str, correct: i64) -> QuizQuestion {
        QuizQuestion {
            guid: guid.to_string(),
            quiz_id: "quiz".to_string(),
            position: 0,
            text: "?".to_string(),
            option_a: "a".to_string(),
            option_b: "b".to_string(),
            option_c: "c".to_string(),
            option_d: "d".to_string(),
            correct_option: correct,
        }
    }

    #[test]
    fn test_all_correct() {
        let questions = vec![question("q1", 0), question("q2", 3)];
        let graded = grade(&questions, &[0, 3]);
        assert_eq!(graded.score, 2);
        assert_eq!(graded.percentage, 100.0);
        assert!(graded.responses.iter().all(|r| r.is_correct));
    }

    #[test]
    fn test_partial_score_rounds_to_two_decimals() {
        let questions = vec![question("q1", 0), question("q2", 1), question("q3", 2)];
        // 2 of 3 correct = 66.666... -> 66.67
        let graded = grade(&questions, &[0, 1, 0]);
        assert_eq!(graded.score, 2);
        assert_eq!(graded.percentage, 66.67);
    }

    #[test]
    fn test_one_of_three() {
        let questions = vec![question("q1", 0), question("q2", 1), question("q3", 2)];
        // 1 of 3 correct = 33.333... -> 33.33
        let graded = grade(&questions, &[0, 0, 0]);
        assert_eq!(graded.score, 1);
        assert_eq!(graded.percentage, 33.33);
    }

    #[test]
    fn test_skipped_answers_marked_wrong() {
        let questions = vec![question("q1", 2)];
        let graded = grade(&questions, &[-1]);
        assert_eq!(graded.score, 0);
        assert_eq!(graded.percentage, 0.0);
        assert_eq!(graded.responses[0].selected_option, -1);
        assert!(!graded.responses[0].is_correct);
    }

    #[test]
    fn test_out_of_range_answer_clamped_and_wrong() {
        let questions = vec![question("q1", 1)];
        let graded = grade(&questions, &[9]);
        assert!(!graded.responses[0].is_correct);
        assert_eq!(graded.responses[0].selected_option, 3);
    }
}
