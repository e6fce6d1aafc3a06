//! Integration tests for campus-api: auth, courses, lectures, reviews,
//! chat, enrollment, and live classes.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;
use tower::util::ServiceExt;

use helpers::*;

// =============================================================================
// Health & auth
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let (_dir, _state, app) = test_app().await;

    let response = app.oneshot(bare_request("GET", "/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "campus-api");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_protected_route_requires_session() {
    let (_dir, _state, app) = test_app().await;

    let response = app.oneshot(bare_request("GET", "/api/users/me", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_login_me_roundtrip() {
    let (_dir, _state, app) = test_app().await;

    let cookie = signup(&app, "alice", "student").await;

    let response = app
        .clone()
        .oneshot(bare_request("GET", "/api/users/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "student");
    assert_eq!(body["xp"], 0);
    assert_eq!(body["rank"], "Bronze");

    // Fresh login works with the same password
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": "alice", "password": "correct-horse" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Wrong password is rejected
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": "alice", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_duplicate_username_conflicts() {
    let (_dir, _state, app) = test_app().await;

    signup(&app, "bob", "student").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/signup",
            None,
            json!({
                "username": "bob",
                "email": "other@example.com",
                "password": "correct-horse",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let (_dir, _state, app) = test_app().await;

    let cookie = signup(&app, "carol", "student").await;

    let response = app
        .clone()
        .oneshot(bare_request("POST", "/api/auth/logout", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(bare_request("GET", "/api/users/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Courses & lectures
// =============================================================================

#[tokio::test]
async fn test_course_create_and_publish_flow() {
    let (_dir, _state, app) = test_app().await;
    let cookie = signup(&app, "teach", "instructor").await;

    let course_id = create_course(&app, &cookie, "Rust Basics").await;

    // Unpublished courses don't show in the catalog
    let response = app
        .clone()
        .oneshot(bare_request("GET", "/api/courses/published", None))
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["courses"].as_array().unwrap().len(), 0);

    // Publish via multipart update
    let response = app
        .clone()
        .oneshot(multipart_request(
            "PUT",
            &format!("/api/courses/{}", course_id),
            &cookie,
            &[
                ("is_published", None, b"true"),
                ("price_cents", None, b"0"),
                ("level", None, b"beginner"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["course"]["is_published"], true);
    assert_eq!(body["course"]["level"], "beginner");

    let response = app
        .oneshot(bare_request("GET", "/api/courses/published", None))
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["title"], "Rust Basics");
    assert_eq!(courses[0]["lecture_count"], 0);
}

#[tokio::test]
async fn test_course_edit_requires_creator() {
    let (_dir, _state, app) = test_app().await;
    let owner = signup(&app, "owner", "instructor").await;
    let other = signup(&app, "other", "instructor").await;

    let course_id = create_course(&app, &owner, "Mine").await;

    let response = app
        .oneshot(multipart_request(
            "PUT",
            &format!("/api/courses/{}", course_id),
            &other,
            &[("title", None, b"Stolen")],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_thumbnail_reupload_replaces_file() {
    let (_dir, state, app) = test_app().await;
    let cookie = signup(&app, "teach", "instructor").await;
    let course_id = create_course(&app, &cookie, "Media").await;

    let response = app
        .clone()
        .oneshot(multipart_request(
            "PUT",
            &format!("/api/courses/{}", course_id),
            &cookie,
            &[("thumbnail", Some("one.png"), b"first-bytes")],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    let first_path = body["course"]["thumbnail_path"].as_str().unwrap().to_string();
    assert_eq!(std::fs::read(state.media.absolute(&first_path)).unwrap(), b"first-bytes");

    // Re-upload with a different extension replaces the previous file
    let response = app
        .oneshot(multipart_request(
            "PUT",
            &format!("/api/courses/{}", course_id),
            &cookie,
            &[("thumbnail", Some("two.jpg"), b"second-bytes")],
        ))
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    let second_path = body["course"]["thumbnail_path"].as_str().unwrap().to_string();

    assert_ne!(first_path, second_path);
    assert!(!state.media.absolute(&first_path).exists(), "old thumbnail removed");
    assert_eq!(std::fs::read(state.media.absolute(&second_path)).unwrap(), b"second-bytes");
}

#[tokio::test]
async fn test_lectures_ordered_and_preview_gated() {
    let (_dir, _state, app) = test_app().await;
    let teacher = signup(&app, "teach", "instructor").await;
    let student = signup(&app, "student", "student").await;

    let course_id = create_course(&app, &teacher, "Gated").await;
    let l1 = create_lecture(&app, &teacher, &course_id, "Intro").await;
    let l2 = create_lecture(&app, &teacher, &course_id, "Deep Dive").await;

    // Upload video to both, mark the first preview-free
    for (lecture_id, preview) in [(&l1, "true"), (&l2, "false")] {
        let response = app
            .clone()
            .oneshot(multipart_request(
                "PUT",
                &format!("/api/lectures/{}", lecture_id),
                &teacher,
                &[
                    ("is_preview_free", None, preview.as_bytes()),
                    ("video", Some("lesson.mp4"), b"video-bytes"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // A non-enrolled student sees media only on the preview lecture
    let response = app
        .clone()
        .oneshot(bare_request(
            "GET",
            &format!("/api/courses/{}", course_id),
            Some(&student),
        ))
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    let lectures = body["lectures"].as_array().unwrap();
    assert_eq!(lectures.len(), 2);
    assert_eq!(lectures[0]["title"], "Intro");
    assert!(lectures[0]["video_path"].is_string());
    assert_eq!(lectures[1]["title"], "Deep Dive");
    assert!(lectures[1]["video_path"].is_null());

    // The creator sees everything
    let response = app
        .oneshot(bare_request(
            "GET",
            &format!("/api/courses/{}", course_id),
            Some(&teacher),
        ))
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    assert!(body["lectures"][1]["video_path"].is_string());
}

// =============================================================================
// Reviews & chat
// =============================================================================

#[tokio::test]
async fn test_review_once_per_user_and_average() {
    let (_dir, _state, app) = test_app().await;
    let teacher = signup(&app, "teach", "instructor").await;
    let s1 = signup(&app, "s1", "student").await;
    let s2 = signup(&app, "s2", "student").await;

    let course_id = create_course(&app, &teacher, "Reviewed").await;

    for (cookie, rating) in [(&s1, 5), (&s2, 2)] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/reviews",
                Some(cookie),
                json!({ "course_id": course_id, "rating": rating, "comment": "ok" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // A second review from the same user conflicts
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/reviews",
            Some(&s1),
            json!({ "course_id": course_id, "rating": 1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Rating out of range is rejected
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/reviews",
            Some(&s2),
            json!({ "course_id": course_id, "rating": 6 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(bare_request(
            "GET",
            &format!("/api/reviews/course/{}", course_id),
            Some(&s1),
        ))
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["reviews"].as_array().unwrap().len(), 2);
    assert_eq!(body["average_rating"], 3.5);
}

#[tokio::test]
async fn test_chat_upvote_is_idempotent_per_user() {
    let (_dir, _state, app) = test_app().await;
    let teacher = signup(&app, "teach", "instructor").await;
    let s1 = signup(&app, "s1", "student").await;
    let s2 = signup(&app, "s2", "student").await;

    let course_id = create_course(&app, &teacher, "Chatty").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/chat/{}", course_id),
            Some(&s1),
            json!({ "body": "When is the next live class?" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    let message_id = body["message"]["guid"].as_str().unwrap().to_string();

    let upvote_uri = format!("/api/chat/message/{}/upvote", message_id);

    let response = app
        .clone()
        .oneshot(bare_request("POST", &upvote_uri, Some(&s2)))
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["upvotes"], 1);
    assert_eq!(body["voted"], true);

    // Same voter again: count unchanged
    let response = app
        .clone()
        .oneshot(bare_request("POST", &upvote_uri, Some(&s2)))
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["upvotes"], 1);
    assert_eq!(body["voted"], false);

    let response = app
        .oneshot(bare_request(
            "GET",
            &format!("/api/chat/{}", course_id),
            Some(&s1),
        ))
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["messages"][0]["upvotes"], 1);
    assert_eq!(body["messages"][0]["username"], "s1");
}

// =============================================================================
// Enrollment
// =============================================================================

#[tokio::test]
async fn test_free_course_enrolls_directly() {
    let (_dir, _state, app) = test_app().await;
    let teacher = signup(&app, "teach", "instructor").await;
    let student = signup(&app, "student", "student").await;

    let course_id = create_course(&app, &teacher, "Free Course").await;
    let response = app
        .clone()
        .oneshot(multipart_request(
            "PUT",
            &format!("/api/courses/{}", course_id),
            &teacher,
            &[("is_published", None, b"true")],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/payment/order",
            Some(&student),
            json!({ "course_id": course_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["enrolled"], true);

    // Enrolling twice conflicts
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/payment/order",
            Some(&student),
            json!({ "course_id": course_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .oneshot(bare_request("GET", "/api/enrollments/me", Some(&student)))
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["courses"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_paid_order_without_provider_fails_cleanly() {
    let (_dir, _state, app) = test_app().await;
    let teacher = signup(&app, "teach", "instructor").await;
    let student = signup(&app, "student", "student").await;

    let course_id = create_course(&app, &teacher, "Paid Course").await;
    app.clone()
        .oneshot(multipart_request(
            "PUT",
            &format!("/api/courses/{}", course_id),
            &teacher,
            &[("is_published", None, b"true"), ("price_cents", None, b"49900")],
        ))
        .await
        .unwrap();

    // Payment client is disabled in the test state
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/payment/order",
            Some(&student),
            json!({ "course_id": course_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Live lectures
// =============================================================================

#[tokio::test]
async fn test_live_lecture_lifecycle() {
    let (_dir, _state, app) = test_app().await;
    let teacher = signup(&app, "teach", "instructor").await;

    let course_id = create_course(&app, &teacher, "Live Course").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/live/create",
            Some(&teacher),
            json!({
                "course_id": course_id,
                "topic": "Office hours",
                "start_time": "2026-09-01T15:00:00Z",
                "duration_minutes": 45,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    let meeting_id = body["lecture"]["meeting_id"].as_str().unwrap().to_string();
    assert!(
        meeting_id.starts_with(&format!("live-{}-", course_id)),
        "meeting id {} should embed the course id",
        meeting_id
    );
    assert_eq!(body["lecture"]["is_active"], true);

    // Schedule listing is ordered by start time
    let response = app
        .clone()
        .oneshot(bare_request(
            "GET",
            &format!("/api/live/course/{}", course_id),
            Some(&teacher),
        ))
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["lectures"].as_array().unwrap().len(), 1);

    // End it; ending twice conflicts
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/live/end",
            Some(&teacher),
            json!({ "meeting_id": meeting_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/live/end",
            Some(&teacher),
            json!({ "meeting_id": meeting_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .oneshot(bare_request("GET", "/api/live/all", Some(&teacher)))
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["lectures"][0]["is_active"], false);
    assert!(body["lectures"][0]["ended_at"].is_string());
}

#[tokio::test]
async fn test_live_notes_upload_download_delete() {
    let (_dir, _state, app) = test_app().await;
    let teacher = signup(&app, "teach", "instructor").await;
    let course_id = create_course(&app, &teacher, "Notes Course").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/live/create",
            Some(&teacher),
            json!({
                "course_id": course_id,
                "topic": "Session",
                "start_time": "2026-09-01T15:00:00Z",
            }),
        ))
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    let meeting_id = body["lecture"]["meeting_id"].as_str().unwrap().to_string();
    let notes_uri = format!("/api/live/{}/notes", meeting_id);

    // No notes yet
    let response = app
        .clone()
        .oneshot(bare_request("GET", &notes_uri, Some(&teacher)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Upload then download round-trips the bytes
    let response = app
        .clone()
        .oneshot(multipart_request(
            "POST",
            &notes_uri,
            &teacher,
            &[("notes", Some("session.pdf"), b"pdf-bytes")],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(bare_request("GET", &notes_uri, Some(&teacher)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"pdf-bytes");

    // Delete clears it
    let response = app
        .clone()
        .oneshot(bare_request("DELETE", &notes_uri, Some(&teacher)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(bare_request("GET", &notes_uri, Some(&teacher)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_video_token_issued_and_awards_xp() {
    let (_dir, _state, app) = test_app().await;
    let student = signup(&app, "joiner", "student").await;

    let response = app
        .clone()
        .oneshot(bare_request("GET", "/api/live/token", Some(&student)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["api_key"], "test-key");
    assert_eq!(body["token"].as_str().unwrap().split('.').count(), 3);

    let response = app
        .oneshot(bare_request("GET", "/api/users/me", Some(&student)))
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["xp"], 15);
}
