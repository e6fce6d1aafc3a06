//! Database queries for the API service, one module per domain

pub mod attention;
pub mod chat;
pub mod courses;
pub mod enrollments;
pub mod lectures;
pub mod live;
pub mod quizzes;
pub mod reviews;
pub mod users;
