//! Ollama client
//!
//! Talks to a local Ollama server for chat completion and embeddings.
//!
//! # API Reference
//! - `POST /api/generate` — completion, `{ model, prompt, stream: false }`
//! - `POST /api/embeddings` — embedding, `{ model, prompt }`
//! - `GET /api/tags` — liveness probe

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::debug;

use campus_common::db::get_setting_or;
use campus_common::{Error, Result};

/// Errors from the model-server boundary
#[derive(Debug)]
pub enum OllamaError {
    /// Server unreachable or request timed out
    Unreachable(String),
    /// Server answered with an error or an unparseable body
    Protocol(String),
}

impl std::fmt::Display for OllamaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OllamaError::Unreachable(msg) => write!(f, "Model server unreachable: {}", msg),
            OllamaError::Protocol(msg) => write!(f, "Model server error: {}", msg),
        }
    }
}

impl std::error::Error for OllamaError {}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Local model server client
#[derive(Clone)]
pub struct OllamaClient {
    http: Client,
    probe: Client,
    base_url: String,
    model: String,
    embed_model: String,
}

impl OllamaClient {
    pub fn new(
        base_url: String,
        model: String,
        embed_model: String,
        timeout: Duration,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            // Local models can be slow; completions get the long timeout
            http: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            probe: Client::builder()
                .timeout(probe_timeout)
                .build()
                .expect("Failed to create HTTP client"),
            base_url,
            model,
            embed_model,
        }
    }

    /// Build the client from the settings table
    pub async fn from_settings(db: &SqlitePool) -> Result<Self> {
        let base_url = get_setting_or(db, "ollama_url", "http://127.0.0.1:11434").await?;
        let model = get_setting_or(db, "ollama_model", "phi3:mini").await?;
        let embed_model = get_setting_or(db, "ollama_embed_model", "nomic-embed-text").await?;
        let timeout_ms: u64 = get_setting_or(db, "ollama_timeout_ms", "60000")
            .await?
            .parse()
            .map_err(|e| Error::Config(format!("ollama_timeout_ms invalid: {}", e)))?;
        let probe_ms: u64 = get_setting_or(db, "ollama_probe_timeout_ms", "1500")
            .await?
            .parse()
            .map_err(|e| Error::Config(format!("ollama_probe_timeout_ms invalid: {}", e)))?;

        Ok(Self::new(
            base_url,
            model,
            embed_model,
            Duration::from_millis(timeout_ms),
            Duration::from_millis(probe_ms),
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn embed_model(&self) -> &str {
        &self.embed_model
    }

    /// Quick liveness probe against /api/tags
    pub async fn is_running(&self) -> bool {
        self.probe
            .get(format!("{}/api/tags", self.base_url.trim_end_matches('/')))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Run a non-streaming completion
    pub async fn generate(&self, prompt: &str) -> std::result::Result<String, OllamaError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "Ollama generate");

        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url.trim_end_matches('/')))
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
            }))
            .send()
            .await
            .map_err(|e| OllamaError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OllamaError::Protocol(format!("HTTP {}", response.status())));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| OllamaError::Protocol(format!("Bad response: {}", e)))?;

        Ok(body.response)
    }

    /// Embed one text with the configured embedding model
    pub async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, OllamaError> {
        let response = self
            .http
            .post(format!("{}/api/embeddings", self.base_url.trim_end_matches('/')))
            .json(&json!({
                "model": self.embed_model,
                "prompt": text,
            }))
            .send()
            .await
            .map_err(|e| OllamaError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OllamaError::Protocol(format!("HTTP {}", response.status())));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| OllamaError::Protocol(format!("Bad response: {}", e)))?;

        if body.embedding.is_empty() {
            return Err(OllamaError::Protocol("Empty embedding".to_string()));
        }

        Ok(body.embedding)
    }
}
