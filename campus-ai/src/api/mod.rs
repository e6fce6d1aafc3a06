//! HTTP API handlers for campus-ai

pub mod ask;
pub mod chats;
pub mod health;
pub mod index;
pub mod sse;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use campus_common::auth::{parse_session_cookie, validate_session};

use crate::AppState;

/// Authenticated user, inserted by the middleware as a request extension
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
}

/// API errors
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Upstream(String),
    Database(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Database(msg) => {
                error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<campus_common::Error> for ApiError {
    fn from(err: campus_common::Error) -> Self {
        ApiError::Database(err.to_string())
    }
}

/// Require a valid session cookie on every request passing through
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let cookie_header = request
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Not logged in".to_string()))?;

    let token = parse_session_cookie(cookie_header)
        .ok_or_else(|| ApiError::Unauthorized("Not logged in".to_string()))?;

    let user_id = validate_session(&state.db, token)
        .await
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    request.extensions_mut().insert(CurrentUser { id: user_id });
    Ok(next.run(request).await)
}
