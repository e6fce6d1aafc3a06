//! Session and password authentication primitives
//!
//! # Architecture
//!
//! - Passwords are stored as SHA-256 of (salt ++ password) with a per-user
//!   random salt, in the `users` table.
//! - Logins create a row in `sessions` with a random token and an expiry
//!   taken from `settings.session_timeout_seconds`. The token travels in a
//!   `campus_session` cookie.
//!
//! This module contains only pure functions and database operations. No HTTP
//! framework dependencies; the Axum middleware lives in the services.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

#[cfg(feature = "sqlx")]
use sqlx::SqlitePool;

/// Cookie name carrying the session token
pub const SESSION_COOKIE: &str = "campus_session";

/// Authentication error types
#[derive(Debug, Clone)]
pub enum AuthError {
    /// No session token presented
    MissingToken,
    /// Token unknown to the sessions table
    InvalidToken,
    /// Token known but past its expiry
    SessionExpired,
    /// Username/password pair did not match
    BadCredentials,
    /// Database error during validation
    DatabaseError(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Missing session token"),
            AuthError::InvalidToken => write!(f, "Invalid session token"),
            AuthError::SessionExpired => write!(f, "Session expired"),
            AuthError::BadCredentials => write!(f, "Invalid username or password"),
            AuthError::DatabaseError(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for AuthError {}

// ========================================
// Password Hashing
// ========================================

/// Generate a random 16-byte salt as 32 hex characters
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

/// Hash a password with the given salt
///
/// Returns 64 hex characters of SHA-256(salt ++ password).
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex_encode(&hasher.finalize())
}

/// Verify a password against a stored hash and salt
pub fn verify_password(password: &str, salt: &str, stored_hash: &str) -> bool {
    // Constant-time comparison; both sides are fixed-length hex.
    let calculated = hash_password(password, salt);
    let mut diff = 0u8;
    for (a, b) in calculated.bytes().zip(stored_hash.bytes()) {
        diff |= a ^ b;
    }
    diff == 0 && calculated.len() == stored_hash.len()
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// ========================================
// Session Tokens
// ========================================

/// Generate a random session token (32 bytes, 64 hex characters)
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

/// Extract the session token from a `Cookie` request header value
///
/// Handles multiple cookies in one header (`a=1; campus_session=tok; b=2`).
pub fn parse_session_cookie(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let pair = pair.trim();
        pair.strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
            .filter(|token| !token.is_empty())
    })
}

/// Build a `Set-Cookie` header value for a new session
pub fn session_cookie_value(token: &str, max_age_seconds: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_seconds
    )
}

/// `Set-Cookie` value that clears the session cookie
pub fn clear_session_cookie_value() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

// ========================================
// Database Operations
// ========================================

/// Create a session for a user, returning the token
#[cfg(feature = "sqlx")]
pub async fn create_session(
    db: &SqlitePool,
    user_id: &str,
    timeout_seconds: i64,
) -> Result<String, AuthError> {
    let token = generate_session_token();
    let expires_at: DateTime<Utc> = Utc::now() + Duration::seconds(timeout_seconds);

    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(user_id)
        .bind(expires_at)
        .execute(db)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    Ok(token)
}

/// Resolve a session token to a user id
///
/// Expired sessions are deleted on sight.
#[cfg(feature = "sqlx")]
pub async fn validate_session(db: &SqlitePool, token: &str) -> Result<String, AuthError> {
    let row: Option<(String, DateTime<Utc>)> =
        sqlx::query_as("SELECT user_id, expires_at FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    let (user_id, expires_at) = row.ok_or(AuthError::InvalidToken)?;

    if expires_at < Utc::now() {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        return Err(AuthError::SessionExpired);
    }

    Ok(user_id)
}

/// Delete a session (logout)
#[cfg(feature = "sqlx")]
pub async fn delete_session(db: &SqlitePool, token: &str) -> Result<(), AuthError> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(db)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    Ok(())
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic_per_salt() {
        let salt = "00112233445566778899aabbccddeeff";
        let h1 = hash_password("secret", salt);
        let h2 = hash_password("secret", salt);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_different_salts_differ() {
        let h1 = hash_password("secret", generate_salt().as_str());
        let h2 = hash_password("secret", generate_salt().as_str());
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_verify_password_roundtrip() {
        let salt = generate_salt();
        let hash = hash_password("hunter2", &salt);

        assert!(verify_password("hunter2", &salt, &hash));
        assert!(!verify_password("hunter3", &salt, &hash));
        assert!(!verify_password("hunter2", &salt, "deadbeef"));
    }

    #[test]
    fn test_parse_session_cookie() {
        assert_eq!(parse_session_cookie("campus_session=abc123"), Some("abc123"));
        assert_eq!(
            parse_session_cookie("theme=dark; campus_session=tok; lang=en"),
            Some("tok")
        );
        assert_eq!(parse_session_cookie("theme=dark"), None);
        assert_eq!(parse_session_cookie("campus_session="), None);
    }

    #[test]
    fn test_session_tokens_unique() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_cookie_values() {
        let set = session_cookie_value("tok", 60);
        assert!(set.contains("campus_session=tok"));
        assert!(set.contains("Max-Age=60"));
        assert!(set.contains("HttpOnly"));

        let clear = clear_session_cookie_value();
        assert!(clear.contains("Max-Age=0"));
    }
}
