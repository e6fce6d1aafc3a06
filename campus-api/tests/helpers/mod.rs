//! Shared helpers for campus-api integration tests

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt;

use campus_api::clients::attention_engine::AttentionEngineClient;
use campus_api::clients::payment::PaymentClient;
use campus_api::clients::video_token::VideoTokenSigner;
use campus_api::{build_router, AppState};

/// Fresh state over a temp root folder. External clients point nowhere: the
/// payment client is disabled and the attention engine targets a dead port.
pub async fn test_state() -> (TempDir, AppState) {
    let dir = TempDir::new().expect("create temp dir");
    let pool = campus_common::db::init_database(&dir.path().join("campus.db"))
        .await
        .expect("init database");

    let media_dir = dir.path().join("media");
    std::fs::create_dir_all(&media_dir).expect("create media dir");

    let state = AppState::new(
        pool,
        media_dir,
        PaymentClient::disabled("http://127.0.0.1:9".to_string()),
        AttentionEngineClient::new(
            "http://127.0.0.1:9".to_string(),
            std::time::Duration::from_millis(250),
        ),
        VideoTokenSigner::new("test-key".to_string(), "test-secret".to_string(), 3600),
    );
    (dir, state)
}

pub async fn test_app() -> (TempDir, AppState, Router) {
    let (dir, state) = test_state().await;
    let app = build_router(state.clone());
    (dir, state, app)
}

/// Build a JSON request, optionally authenticated
pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Build a bodyless request, optionally authenticated
pub fn bare_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Extract the JSON body from a response
pub async fn json_body(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}

/// Sign up a user through the API, returning the session cookie
pub async fn signup(app: &Router, username: &str, role: &str) -> String {
    let request = json_request(
        "POST",
        "/api/auth/signup",
        None,
        serde_json::json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "correct-horse",
            "role": role,
        }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK, "signup should succeed");

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("signup sets session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

/// Create a course through the API, returning its guid
pub async fn create_course(app: &Router, cookie: &str, title: &str) -> String {
    let request = json_request(
        "POST",
        "/api/courses",
        Some(cookie),
        serde_json::json!({ "title": title, "category": "programming" }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    body["course"]["guid"].as_str().unwrap().to_string()
}

/// Create a lecture through the API, returning its guid
pub async fn create_lecture(app: &Router, cookie: &str, course_id: &str, title: &str) -> String {
    let request = json_request(
        "POST",
        &format!("/api/courses/{}/lectures", course_id),
        Some(cookie),
        serde_json::json!({ "title": title }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    body["lecture"]["guid"].as_str().unwrap().to_string()
}

/// Assemble a multipart/form-data body from (name, filename, value) parts
pub fn multipart_request(
    method: &str,
    uri: &str,
    cookie: &str,
    parts: &[(&str, Option<&str>, &[u8])],
) -> Request<Body> {
    const BOUNDARY: &str = "campus-test-boundary";

    let mut body = Vec::new();
    for (name, filename, value) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(value);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}
