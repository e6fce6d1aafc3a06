//! campus-ai library - AI tutor service
//!
//! Indexes lecture notes into chunk embeddings and answers course questions
//! from them with a local model server, falling back to a deterministic
//! offline embedder when the model server is down.

use axum::Router;
use sqlx::SqlitePool;
use std::path::PathBuf;

use campus_common::events::EventBus;

pub mod api;
pub mod chunker;
pub mod db;
pub mod embeddings;
pub mod indexer;
pub mod ollama;
pub mod pdf;

use ollama::OllamaClient;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Shared database connection pool
    pub db: SqlitePool,
    /// Indexing progress events, exposed over SSE
    pub bus: EventBus,
    /// Local model server client
    pub ollama: OllamaClient,
    /// Media folder holding uploaded lecture notes
    pub media_root: PathBuf,
    /// Vector length of the offline fallback embedder
    pub fallback_dim: usize,
}

impl AppState {
    pub fn new(db: SqlitePool, ollama: OllamaClient, media_root: PathBuf, fallback_dim: usize) -> Self {
        Self {
            db,
            bus: EventBus::new(1000),
            ollama,
            media_root,
            fallback_dim,
        }
    }
}

/// Build application router
///
/// The indexing endpoint is unauthenticated: it is called service-to-service
/// by campus-api after a notes upload and is idempotent. Ask/chat need the
/// caller's session.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    let protected = Router::new()
        .route("/api/ai/ask", post(api::ask::ask_course_ai))
        .route(
            "/api/ai/chat/:course_id",
            get(api::chats::chat_history).delete(api::chats::clear_chat),
        )
        .layer(middleware::from_fn_with_state(state.clone(), api::auth_middleware));

    let public = Router::new()
        .route("/api/ai/index/:lecture_id", post(api::index::index_lecture_notes))
        .route("/api/events", get(api::sse::event_stream))
        .merge(api::health::health_routes());

    Router::new().merge(protected).merge(public).with_state(state)
}
