//! Video service user tokens
//!
//! The live-class frontend joins calls on a managed video service that
//! authenticates users with HS256 JWTs signed by the account secret. Only
//! signing happens here; call management is entirely on the provider side.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Token signing errors
#[derive(Debug)]
pub enum VideoTokenError {
    /// No signing secret configured
    NotConfigured,
}

impl std::fmt::Display for VideoTokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoTokenError::NotConfigured => write!(f, "Video service not configured"),
        }
    }
}

impl std::error::Error for VideoTokenError {}

/// HS256 JWT signer for video-service user tokens
#[derive(Clone)]
pub struct VideoTokenSigner {
    api_key: Option<String>,
    api_secret: Option<String>,
    ttl_seconds: i64,
}

impl VideoTokenSigner {
    pub fn new(api_key: String, api_secret: String, ttl_seconds: i64) -> Self {
        Self {
            api_key: Some(api_key),
            api_secret: Some(api_secret),
            ttl_seconds,
        }
    }

    pub fn disabled(ttl_seconds: i64) -> Self {
        Self { api_key: None, api_secret: None, ttl_seconds }
    }

    pub fn is_configured(&self) -> bool {
        self.api_secret.is_some()
    }

    /// The public API key the browser passes to the video SDK
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Sign a user token valid for the configured TTL
    pub fn sign_user_token(&self, user_id: &str) -> Result<String, VideoTokenError> {
        let secret = self.api_secret.as_ref().ok_or(VideoTokenError::NotConfigured)?;

        let now = chrono::Utc::now().timestamp();
        let header = json!({ "alg": "HS256", "typ": "JWT" });
        let payload = json!({
            "user_id": user_id,
            "iat": now,
            "exp": now + self.ttl_seconds,
        });

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(payload.to_string())
        );

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_structure() {
        let signer = VideoTokenSigner::new("key".into(), "secret".into(), 3600);
        let token = signer.sign_user_token("user-1").unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);

        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[0]).unwrap()).unwrap();
        assert_eq!(header["alg"], "HS256");

        let payload: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        assert_eq!(payload["user_id"], "user-1");
        assert_eq!(
            payload["exp"].as_i64().unwrap() - payload["iat"].as_i64().unwrap(),
            3600
        );
    }

    #[test]
    fn test_signature_verifies() {
        let signer = VideoTokenSigner::new("key".into(), "secret".into(), 60);
        let token = signer.sign_user_token("u").unwrap();
        let (signing_input, signature) = token.rsplit_once('.').unwrap();

        let mut mac = HmacSha256::new_from_slice(b"secret").unwrap();
        mac.update(signing_input.as_bytes());
        let expected = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        assert_eq!(signature, expected);
    }

    #[test]
    fn test_disabled_signer() {
        let signer = VideoTokenSigner::disabled(60);
        assert!(!signer.is_configured());
        assert!(signer.sign_user_token("u").is_err());
    }
}
