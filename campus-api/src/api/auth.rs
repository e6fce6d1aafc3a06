//! Signup/login/logout handlers and the session middleware

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use campus_common::auth::{
    clear_session_cookie_value, create_session, delete_session, hash_password,
    parse_session_cookie, session_cookie_value, validate_session, verify_password, generate_salt,
};
use campus_common::db::get_setting_or;
use campus_common::rank::Rank;

use crate::api::ApiError;
use crate::db;
use crate::AppState;

/// Authenticated user, inserted by the middleware as a request extension
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
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

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Response, ApiError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Username required and password must be at least 8 characters".to_string(),
        ));
    }
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }

    let role = match req.role.as_deref() {
        None | Some("student") => "student",
        Some("instructor") => "instructor",
        Some(other) => {
            return Err(ApiError::BadRequest(format!("Unknown role: {}", other)));
        }
    };

    if db::users::find_by_username(&state.db, username).await?.is_some() {
        return Err(ApiError::Conflict("Username already taken".to_string()));
    }

    let guid = Uuid::new_v4().to_string();
    let salt = generate_salt();
    let hash = hash_password(&req.password, &salt);

    db::users::create_user(&state.db, &guid, username, req.email.trim(), &hash, &salt, role)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.message().contains("UNIQUE") => {
                ApiError::Conflict("Username or email already taken".to_string())
            }
            other => other.into(),
        })?;

    info!("New {} account: {}", role, username);

    issue_session(&state, &guid).await
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let user = db::users::find_by_username(&state.db, req.username.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    if !verify_password(&req.password, &user.password_salt, &user.password_hash) {
        return Err(ApiError::Unauthorized("Invalid username or password".to_string()));
    }

    issue_session(&state, &user.guid).await
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ApiError> {
    if let Some(token) = request
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_session_cookie)
    {
        delete_session(&state.db, token)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;
    }

    let mut response = Json(json!({ "message": "Logged out" })).into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        clear_session_cookie_value()
            .parse()
            .map_err(|_| ApiError::Internal("Bad cookie header".to_string()))?,
    );
    Ok(response)
}

/// Create a session and return the profile with the session cookie attached
async fn issue_session(state: &AppState, user_id: &str) -> Result<Response, ApiError> {
    let timeout: i64 = get_setting_or(&state.db, "session_timeout_seconds", "31536000")
        .await?
        .parse()
        .unwrap_or(31_536_000);

    let token = create_session(&state.db, user_id, timeout)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = db::users::find_by_guid(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let mut response = Json(json!({
        "user": {
            "guid": user.guid,
            "username": user.username,
            "email": user.email,
            "role": user.role,
            "xp": user.xp,
            "rank": Rank::from_xp(user.xp).title(),
        }
    }))
    .into_response();

    response.headers_mut().insert(
        header::SET_COOKIE,
        session_cookie_value(&token, timeout)
            .parse()
            .map_err(|_| ApiError::Internal("Bad cookie header".to_string()))?,
    );

    Ok(response)
}
