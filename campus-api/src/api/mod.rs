//! HTTP API handlers for campus-api

pub mod attention;
pub mod auth;
pub mod chat;
pub mod courses;
pub mod error;
pub mod health;
pub mod lectures;
pub mod live;
pub mod payments;
pub mod quizzes;
pub mod reviews;
pub mod sse;
pub mod users;

pub use error::ApiError;
