//! External-service credential resolution for campus-api
//!
//! Provides multi-tier resolution with Database → ENV → TOML priority, so a
//! key set through the settings API wins over deployment environment, which
//! wins over the operator's config file.

use campus_common::config::load_toml_config;
use campus_common::db::get_setting_or;
use campus_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::clients::attention_engine::AttentionEngineClient;
use crate::clients::payment::PaymentClient;
use crate::clients::video_token::VideoTokenSigner;

/// Resolve one credential from the three tiers
async fn resolve_credential(
    db: &SqlitePool,
    setting_key: &str,
    env_var: &str,
    toml_value: Option<&String>,
) -> Result<Option<String>> {
    let mut sources = Vec::new();

    let db_value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(setting_key)
        .fetch_optional(db)
        .await?
        .flatten()
        .filter(|v: &String| !v.trim().is_empty());
    if db_value.is_some() {
        sources.push("database");
    }

    let env_value = std::env::var(env_var).ok().filter(|v| !v.trim().is_empty());
    if env_value.is_some() {
        sources.push("environment");
    }

    let toml_value = toml_value.filter(|v| !v.trim().is_empty()).cloned();
    if toml_value.is_some() {
        sources.push("TOML");
    }

    if sources.len() > 1 {
        warn!(
            "{} found in multiple sources: {}. Using {} (highest priority).",
            setting_key,
            sources.join(", "),
            sources[0]
        );
    }

    Ok(db_value.or(env_value).or(toml_value))
}

/// Build the payment client from configuration
///
/// Missing credentials produce a disabled client: order creation fails with
/// a clear error while the rest of the API keeps working.
pub async fn resolve_payment_client(db: &SqlitePool) -> Result<PaymentClient> {
    let toml = load_toml_config().unwrap_or_default();

    let base_url = get_setting_or(db, "payment_api_url", "https://api.razorpay.com/v1").await?;
    let key_id = resolve_credential(db, "payment_key_id", "CAMPUS_PAYMENT_KEY_ID", toml.payment_key_id.as_ref())
        .await?;
    let key_secret = resolve_credential(
        db,
        "payment_key_secret",
        "CAMPUS_PAYMENT_KEY_SECRET",
        toml.payment_key_secret.as_ref(),
    )
    .await?;

    match (key_id, key_secret) {
        (Some(id), Some(secret)) => {
            info!("Payment provider configured");
            Ok(PaymentClient::new(base_url, id, secret))
        }
        _ => {
            warn!(
                "Payment provider not configured; paid enrollment disabled. \
                 Set payment_key_id/payment_key_secret in settings, \
                 CAMPUS_PAYMENT_KEY_ID/CAMPUS_PAYMENT_KEY_SECRET in the environment, \
                 or the campus config.toml"
            );
            Ok(PaymentClient::disabled(base_url))
        }
    }
}

/// Build the video token signer from configuration
pub async fn resolve_video_signer(db: &SqlitePool) -> Result<VideoTokenSigner> {
    let toml = load_toml_config().unwrap_or_default();

    let api_key =
        resolve_credential(db, "video_api_key", "CAMPUS_VIDEO_API_KEY", toml.video_api_key.as_ref())
            .await?;
    let api_secret = resolve_credential(
        db,
        "video_api_secret",
        "CAMPUS_VIDEO_API_SECRET",
        toml.video_api_secret.as_ref(),
    )
    .await?;

    let ttl: i64 = get_setting_or(db, "video_token_ttl_seconds", "3600")
        .await?
        .parse()
        .map_err(|e| Error::Config(format!("video_token_ttl_seconds invalid: {}", e)))?;

    match (api_key, api_secret) {
        (Some(key), Some(secret)) => {
            info!("Video service configured");
            Ok(VideoTokenSigner::new(key, secret, ttl))
        }
        _ => {
            warn!("Video service not configured; live-class tokens disabled");
            Ok(VideoTokenSigner::disabled(ttl))
        }
    }
}

impl AttentionEngineClient {
    /// Build the frame-analysis client from module_config + settings
    pub async fn from_settings(db: &SqlitePool) -> Result<Self> {
        let module = campus_common::config::load_module_config(db, "attention_engine").await?;
        let timeout_ms: u64 = get_setting_or(db, "attention_engine_timeout_ms", "5000")
            .await?
            .parse()
            .map_err(|e| Error::Config(format!("attention_engine_timeout_ms invalid: {}", e)))?;

        Ok(Self::new(
            format!("http://{}:{}", module.host, module.port),
            std::time::Duration::from_millis(timeout_ms),
        ))
    }
}
