//! Retrieval-augmented course Q&A

use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use campus_common::db::get_setting_or;
use campus_common::db::models::EmbeddingRow;

use crate::api::{ApiError, CurrentUser};
use crate::db;
use crate::embeddings::{cosine_similarity, select_provider};
use crate::AppState;

/// Shown when the course has no indexed notes
const NO_NOTES_ANSWER: &str = "This course has no notes indexed yet.";
/// Shown when the model server is down mid-request
const UNAVAILABLE_ANSWER: &str = "AI is currently unavailable";

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub course_id: String,
}

/// POST /api/ai/ask
///
/// Embeds the question, ranks the course's indexed chunks by cosine
/// similarity, prompts the tutor model with the top matches as context, and
/// appends the exchange to the caller's course chat. Model-server outages
/// degrade to a fixed answer instead of an error.
pub async fn ask_course_ai(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<AskRequest>,
) -> Result<Json<Value>, ApiError> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("Question required".to_string()));
    }

    if !db::course_has_embeddings(&state.db, &req.course_id).await? {
        return Ok(Json(json!({ "answer": NO_NOTES_ANSWER })));
    }

    let provider = select_provider(&state.ollama, state.fallback_dim).await;
    let query_vector = match provider.embed(question).await {
        Ok(vector) => vector,
        Err(e) => {
            warn!("Question embedding failed: {}", e);
            return Ok(Json(json!({ "answer": UNAVAILABLE_ANSWER })));
        }
    };

    let docs = db::embeddings_for_course(&state.db, &req.course_id).await?;
    let top_k: usize = get_setting_or(&state.db, "ai_top_k", "5")
        .await?
        .parse()
        .unwrap_or(5);

    let context = rank_context(&docs, &query_vector, top_k);
    if context.is_empty() {
        // Indexed with a different provider than the one answering now
        return Ok(Json(json!({ "answer": NO_NOTES_ANSWER })));
    }

    let prompt = tutor_prompt(&context, question);

    let answer = match state.ollama.generate(&prompt).await {
        Ok(answer) => answer,
        Err(e) => {
            warn!("Completion failed: {}", e);
            return Ok(Json(json!({ "answer": UNAVAILABLE_ANSWER })));
        }
    };

    let chat_id = db::get_or_create_chat(&state.db, &req.course_id, &user.id).await?;
    db::append_exchange(&state.db, &chat_id, question, &answer).await?;
    let messages = db::messages_for_chat(&state.db, &chat_id).await?;

    Ok(Json(json!({ "messages": messages })))
}

/// Top-k chunks by cosine similarity against the query vector.
///
/// Rows whose vector length differs from the query (indexed by another
/// provider) score 0 and drop out naturally.
fn rank_context(docs: &[EmbeddingRow], query: &[f32], top_k: usize) -> Vec<String> {
    let mut ranked: Vec<(f32, &EmbeddingRow)> = docs
        .iter()
        .filter_map(|doc| {
            let vector = doc.vector().ok()?;
            let score = cosine_similarity(query, &vector);
            (score > 0.0).then_some((score, doc))
        })
        .collect();

    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    ranked.into_iter().take(top_k).map(|(_, doc)| doc.chunk.clone()).collect()
}

/// The tutor prompt: answer only from the retrieved notes
fn tutor_prompt(context: &[String], question: &str) -> String {
    format!(
        "You are a course tutor.\n\
         Answer ONLY from the notes below.\n\
         If not found, say: \"Not covered in course notes.\"\n\
         \n\
         NOTES:\n\
         {}\n\
         \n\
         QUESTION:\n\
         {}",
        context.join("\n\n"),
        question
    )
}
