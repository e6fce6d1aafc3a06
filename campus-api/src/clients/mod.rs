//! HTTP clients for external services

pub mod attention_engine;
pub mod payment;
pub mod video_token;
