//! Health check endpoint

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// Whether the model server answered the liveness probe
    pub model_server: bool,
}

/// GET /health
///
/// Health check endpoint for monitoring. Does NOT require authentication.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "campus-ai".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_server: state.ollama.is_running().await,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
