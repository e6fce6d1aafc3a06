//! Payment provider client
//!
//! Talks to a Razorpay-compatible REST API: order creation with basic auth,
//! and HMAC-SHA256 signature verification of the checkout callback. The
//! endpoint is configurable so integration tests can point it at a local
//! double.

use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Default timeout for payment API requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors from the payment boundary
#[derive(Debug)]
pub enum PaymentError {
    /// No credentials configured
    NotConfigured,
    /// Provider request failed or returned non-success
    Provider(String),
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentError::NotConfigured => write!(f, "Payment provider not configured"),
            PaymentError::Provider(msg) => write!(f, "Payment provider error: {}", msg),
        }
    }
}

impl std::error::Error for PaymentError {}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
}

/// Payment provider REST client
#[derive(Clone)]
pub struct PaymentClient {
    http: Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl PaymentClient {
    pub fn new(base_url: String, key_id: String, key_secret: String) -> Self {
        Self {
            http: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url,
            credentials: Some((key_id, key_secret)),
        }
    }

    /// Client without credentials: verification and order creation both fail
    /// with `NotConfigured`.
    pub fn disabled(base_url: String) -> Self {
        Self {
            http: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url,
            credentials: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Create a provider order, returning the provider's order id
    pub async fn create_order(
        &self,
        amount_cents: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<String, PaymentError> {
        let (key_id, key_secret) =
            self.credentials.as_ref().ok_or(PaymentError::NotConfigured)?;

        debug!(amount_cents, currency, receipt, "Creating payment order");

        let response = self
            .http
            .post(format!("{}/orders", self.base_url.trim_end_matches('/')))
            .basic_auth(key_id, Some(key_secret))
            .json(&json!({
                "amount": amount_cents,
                "currency": currency,
                "receipt": receipt,
            }))
            .send()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Payment order creation failed: {} {}", status, body);
            return Err(PaymentError::Provider(format!("HTTP {}", status)));
        }

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Provider(format!("Bad response: {}", e)))?;

        Ok(order.id)
    }

    /// Verify a checkout signature against this client's secret
    pub fn verify_signature(
        &self,
        provider_order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, PaymentError> {
        let (_, key_secret) = self.credentials.as_ref().ok_or(PaymentError::NotConfigured)?;
        Ok(verify_payment_signature(key_secret, provider_order_id, payment_id, signature))
    }
}

/// Verify `HMAC-SHA256(secret, "{order_id}|{payment_id}")` against the
/// hex signature sent by the checkout callback.
pub fn verify_payment_signature(
    secret: &str,
    provider_order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(format!("{}|{}", provider_order_id, payment_id).as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    // Signatures are operator-visible hex; compare without early exit.
    if expected.len() != signature.len() {
        return false;
    }
    expected
        .bytes()
        .zip(signature.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
