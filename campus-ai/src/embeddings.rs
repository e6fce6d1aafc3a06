//! Embedding providers and vector similarity
//!
//! Two providers stand behind one trait: the model server (primary) and a
//! deterministic hashed embedder used when the model server is down, so
//! indexing and search keep working offline. Vectors from different
//! providers have different dimensions and never mix: similarity across a
//! length mismatch is defined as 0.

use async_trait::async_trait;

use crate::ollama::{OllamaClient, OllamaError};

/// Model name recorded for offline-hashed vectors
pub const HASHED_MODEL_NAME: &str = "hashed-v1";

/// Anything that can turn text into a fixed-length vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Name recorded alongside stored vectors
    fn model_name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, OllamaError>;
}

/// Model-server embeddings
pub struct OllamaEmbedder {
    client: OllamaClient,
    model_name: String,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient) -> Self {
        let model_name = client.embed_model().to_string();
        Self { client, model_name }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, OllamaError> {
        self.client.embed(text).await
    }
}

/// Deterministic offline embedder
///
/// Folds byte values into a fixed-length vector: `vector[i % dim] += byte / 255`.
/// Crude, but similar texts land near each other and identical texts are
/// identical, which keeps retrieval functional without a model server.
pub struct HashedEmbedder {
    dim: usize,
}

impl HashedEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % self.dim] += byte as f32 / 255.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashedEmbedder {
    fn model_name(&self) -> &str {
        HASHED_MODEL_NAME
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, OllamaError> {
        Ok(self.embed_text(text))
    }
}

/// Pick the model server when it answers the liveness probe, otherwise the
/// offline hashed embedder.
pub async fn select_provider(
    ollama: &OllamaClient,
    fallback_dim: usize,
) -> Box<dyn EmbeddingProvider> {
    if ollama.is_running().await {
        Box::new(OllamaEmbedder::new(ollama.clone()))
    } else {
        Box::new(HashedEmbedder::new(fallback_dim))
    }
}

/// Cosine similarity of two vectors.
///
/// Returns 0.0 for length mismatches and zero-magnitude inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        dot += x as f64 * y as f64;
        norm_a += x as f64 * x as f64;
        norm_b += y as f64 * y as f64;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_vectors() {
        let v = vec![0.5, 0.2, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite_vectors() {
        let a = vec![1.0, 2.0];
        let b = vec![-1.0, -2.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_length_mismatch_is_zero() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![1.0, 2.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_zero_magnitude_is_zero() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 2.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_hashed_embedder_deterministic() {
        let embedder = HashedEmbedder::new(384);
        let a = embedder.embed_text("lecture notes about ownership");
        let b = embedder.embed_text("lecture notes about ownership");
        assert_eq!(a, b);
        assert_eq!(a.len(), 384);
    }

    #[test]
    fn test_hashed_embedder_wraps_long_text() {
        let embedder = HashedEmbedder::new(4);
        let v = embedder.embed_text("abcdefgh");
        // 8 bytes folded into 4 slots: each slot accumulates two bytes
        assert_eq!(v.len(), 4);
        assert!((v[0] - (b'a' as f32 + b'e' as f32) / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_hashed_similar_texts_rank_higher() {
        let embedder = HashedEmbedder::new(384);
        let query = embedder.embed_text("what is borrow checking");
        let close = embedder.embed_text("what is borrow checking in rust");
        let far = embedder.embed_text("zzzzzz 999 ~~~~");

        assert!(
            cosine_similarity(&query, &close) > cosine_similarity(&query, &far),
            "related text should outrank noise"
        );
    }
}
