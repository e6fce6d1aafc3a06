//! campus-api library - main REST service
//!
//! Serves the learning-platform API: auth, users, courses, lectures, media,
//! quizzes, reviews, course chat, payments/enrollment, live lectures, and
//! attention tracking.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use std::path::PathBuf;

use campus_common::events::EventBus;

pub mod api;
pub mod attention;
pub mod clients;
pub mod config;
pub mod db;
pub mod media;

use attention::AttentionSessions;
use clients::attention_engine::AttentionEngineClient;
use clients::payment::PaymentClient;
use clients::video_token::VideoTokenSigner;
use media::MediaStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Shared database connection pool
    pub db: SqlitePool,
    /// In-process event bus, exposed over SSE
    pub bus: EventBus,
    /// Uploaded-media storage under the root folder
    pub media: MediaStore,
    /// Payment provider REST client
    pub payment: PaymentClient,
    /// External frame-analysis engine client
    pub attention_engine: AttentionEngineClient,
    /// Video service token signer
    pub video: VideoTokenSigner,
    /// Per-session attention trackers and in-flight frame flags
    pub attention_sessions: AttentionSessions,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        media_dir: PathBuf,
        payment: PaymentClient,
        attention_engine: AttentionEngineClient,
        video: VideoTokenSigner,
    ) -> Self {
        Self {
            db,
            bus: EventBus::new(1000),
            media: MediaStore::new(media_dir),
            payment,
            attention_engine,
            video,
            attention_sessions: AttentionSessions::default(),
        }
    }
}

/// Build application router
///
/// Public routes: health, SSE, signup/login, published-course browsing, and
/// the media folder. Everything else goes through the session middleware.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, post, put};

    let protected = Router::new()
        .route("/api/auth/logout", post(api::auth::logout))
        .route("/api/users/me", get(api::users::me).put(api::users::update_me))
        .route("/api/users/leaderboard", get(api::users::leaderboard))
        .route("/api/courses", post(api::courses::create_course))
        .route("/api/courses/creator", get(api::courses::creator_courses))
        .route(
            "/api/courses/:course_id",
            get(api::courses::get_course)
                .put(api::courses::update_course)
                .delete(api::courses::remove_course),
        )
        .route(
            "/api/courses/:course_id/lectures",
            get(api::lectures::list_lectures).post(api::lectures::create_lecture),
        )
        .route(
            "/api/lectures/:lecture_id",
            put(api::lectures::update_lecture).delete(api::lectures::remove_lecture),
        )
        .route("/api/lectures/:lecture_id/notes", post(api::lectures::upload_notes))
        .route("/api/quiz", post(api::quizzes::create_quiz))
        .route("/api/quiz/lecture/:lecture_id", get(api::quizzes::get_quiz_by_lecture))
        .route("/api/quiz/course/:course_id", get(api::quizzes::course_quizzes))
        .route("/api/quiz/user/analytics", get(api::quizzes::student_performance))
        .route(
            "/api/quiz/:quiz_id",
            put(api::quizzes::update_quiz).delete(api::quizzes::delete_quiz),
        )
        .route("/api/quiz/:quiz_id/submit", post(api::quizzes::submit_quiz))
        .route("/api/quiz/:quiz_id/attempt", get(api::quizzes::get_attempt))
        .route("/api/reviews", post(api::reviews::create_review))
        .route("/api/reviews/course/:course_id", get(api::reviews::course_reviews))
        .route("/api/reviews/:review_id", delete(api::reviews::delete_review))
        .route(
            "/api/chat/:course_id",
            get(api::chat::list_messages).post(api::chat::post_message),
        )
        .route("/api/chat/message/:message_id/upvote", post(api::chat::upvote_message))
        .route("/api/payment/order", post(api::payments::create_order))
        .route("/api/payment/verify", post(api::payments::verify_payment))
        .route("/api/enrollments/me", get(api::payments::my_enrollments))
        .route("/api/live/create", post(api::live::create_live_lecture))
        .route("/api/live/course/:course_id", get(api::live::course_schedule))
        .route("/api/live/all", get(api::live::all_live_lectures))
        .route("/api/live/end", post(api::live::end_live_lecture))
        .route("/api/live/token", get(api::live::video_token))
        .route("/api/live/:meeting_id/recording", post(api::live::upload_recording))
        .route(
            "/api/live/:meeting_id/notes",
            get(api::live::download_notes)
                .post(api::live::upload_notes)
                .delete(api::live::delete_notes),
        )
        .route("/api/attention/session", post(api::attention::start_session))
        .route(
            "/api/attention/session/:session_id/end",
            post(api::attention::end_session),
        )
        .route("/api/attention/frame", post(api::attention::submit_frame))
        .route(
            "/api/attention/lecture/:lecture_id/summary",
            get(api::attention::lecture_summary),
        )
        .layer(middleware::from_fn_with_state(state.clone(), api::auth::auth_middleware))
        // Recording uploads are the largest accepted bodies; per-kind limits
        // from the settings table are enforced in the handlers.
        .layer(DefaultBodyLimit::max(600 * 1024 * 1024));

    let public = Router::new()
        .route("/api/auth/signup", post(api::auth::signup))
        .route("/api/auth/login", post(api::auth::login))
        .route("/api/courses/published", get(api::courses::published_courses))
        .route("/api/events", get(api::sse::event_stream))
        .merge(api::health::health_routes())
        .nest_service(
            "/media",
            tower_http::services::ServeDir::new(state.media.root().clone()),
        );

    Router::new().merge(protected).merge(public).with_state(state)
}
