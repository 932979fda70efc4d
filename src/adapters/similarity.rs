//! Similarity models.
//!
//! - `LexicalSimilarity`: offline cosine over term frequencies
//! - `EmbeddingSimilarity`: cosine over vectors from an OpenAI-compatible
//!   embeddings endpoint

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::SimilarityModel;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "or", "that", "the", "to", "was", "were", "will", "with", "this", "which",
];

/// Bag-of-words cosine similarity
#[derive(Debug, Clone, Default)]
pub struct LexicalSimilarity;

impl LexicalSimilarity {
    pub fn new() -> Self {
        Self
    }

    fn term_frequencies(text: &str) -> HashMap<String, f64> {
        let mut counts = HashMap::new();
        for term in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        {
            *counts.entry(term).or_insert(0.0) += 1.0;
        }
        counts
    }

    /// Synchronous scoring, shared by the async trait impl
    pub fn score(&self, text_a: &str, text_b: &str) -> f64 {
        let a = Self::term_frequencies(text_a);
        let b = Self::term_frequencies(text_b);
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let dot: f64 = a
            .iter()
            .filter_map(|(term, weight)| b.get(term).map(|other| weight * other))
            .sum();
        let norm_a = a.values().map(|v| v * v).sum::<f64>().sqrt();
        let norm_b = b.values().map(|v| v * v).sum::<f64>().sqrt();

        (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
    }
}

#[async_trait]
impl SimilarityModel for LexicalSimilarity {
    fn name(&self) -> &str {
        "lexical"
    }

    async fn similarity(&self, text_a: &str, text_b: &str) -> Result<f64> {
        Ok(self.score(text_a, text_b))
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 2],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f64>,
}

/// Similarity backed by a remote embedding model
pub struct EmbeddingSimilarity {
    /// Full URL of the embeddings endpoint
    endpoint: String,
    /// Model identifier sent with each request
    model: String,
    /// Optional bearer token
    api_key: Option<String>,
    /// HTTP client
    client: reqwest::Client,
}

impl EmbeddingSimilarity {
    /// Create a client for `endpoint` using `model`
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build embeddings HTTP client")?;

        Ok(Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
            client,
        })
    }

    async fn embed_pair(&self, text_a: &str, text_b: &str) -> Result<(Vec<f64>, Vec<f64>)> {
        let mut request = self.client.post(&self.endpoint).json(&EmbeddingRequest {
            model: &self.model,
            input: [text_a, text_b],
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response: EmbeddingResponse = request
            .send()
            .await
            .with_context(|| format!("Failed to reach embeddings endpoint {}", self.endpoint))?
            .error_for_status()
            .context("Embeddings endpoint returned an error status")?
            .json()
            .await
            .context("Failed to parse embeddings response")?;

        let mut vectors = response.data.into_iter().map(|d| d.embedding);
        match (vectors.next(), vectors.next()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => anyhow::bail!("Embeddings response did not contain two vectors"),
        }
    }
}

#[async_trait]
impl SimilarityModel for EmbeddingSimilarity {
    fn name(&self) -> &str {
        &self.model
    }

    async fn similarity(&self, text_a: &str, text_b: &str) -> Result<f64> {
        let (a, b) = self.embed_pair(text_a, text_b).await?;
        cosine(&a, &b)
    }
}

/// Cosine similarity clamped to [0, 1]
pub fn cosine(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        anyhow::bail!("Embedding dimensions differ: {} vs {}", a.len(), b.len());
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a * norm_b)).clamp(0.0, 1.0))
}
