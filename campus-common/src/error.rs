//! Common error types for CAMPUS

use thiserror::Error;

/// Common result type for CAMPUS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across CAMPUS services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Caller is not authenticated or the session expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Upstream service call failed (model server, payment provider, ...)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
