//! Adapter interfaces for external collaborators.
//!
//! The detection core never parses, embeds or searches by itself. It talks
//! to three narrow interfaces:
//! - `SentenceParser`: sentence segmentation, entities and dependency roles
//! - `SimilarityModel`: bounded semantic similarity between two strings
//! - `EvidenceSource`: knowledge lookup by query string

pub mod knowledge;
pub mod parser;
pub mod similarity;
pub mod wikipedia;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// Re-export the concrete collaborators
pub use knowledge::KnowledgeBase;
pub use parser::HeuristicParser;
pub use similarity::{EmbeddingSimilarity, LexicalSimilarity};
pub use wikipedia::WikipediaSource;

/// Strip sentence punctuation wrapped around a query before using it as a title
pub fn normalize_title(query: &str) -> &str {
    query
        .trim()
        .trim_start_matches(&['"', '\'', '(', '['][..])
        .trim_end_matches(&['.', ',', ';', ':', '!', '?', '"', '\'', ')', ']'][..])
}

/// A named-entity span inside a sentence (byte offsets into the full text)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
}

/// One token with its dependency role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Dependency label, e.g. "nsubj", "ROOT", "dobj", "attr"
    pub dep: String,
    pub lemma: String,
}

impl Token {
    pub fn new(text: impl Into<String>, dep: impl Into<String>, lemma: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            dep: dep.into(),
            lemma: lemma.into(),
        }
    }
}

/// Flat parser record for one sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSentence {
    pub text: String,
    /// Byte offset of the sentence start in the full text
    pub start: usize,
    /// Byte offset one past the sentence end
    pub end: usize,
    pub entities: Vec<EntitySpan>,
    pub tokens: Vec<Token>,
}

/// Sentence segmentation and shallow parsing.
///
/// Must be deterministic for identical input; empty text yields no sentences.
pub trait SentenceParser: Send + Sync {
    /// Human-readable parser name
    fn name(&self) -> &str;

    /// Split text into parsed sentences, in order
    fn segment(&self, text: &str) -> Result<Vec<ParsedSentence>>;
}

/// Semantic similarity between two texts
#[async_trait]
pub trait SimilarityModel: Send + Sync {
    /// Human-readable model name
    fn name(&self) -> &str;

    /// Similarity in [0, 1]
    async fn similarity(&self, text_a: &str, text_b: &str) -> Result<f64>;
}

/// Knowledge lookup by query string
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Provenance name used in source labels, e.g. "Wikipedia"
    fn name(&self) -> &str;

    /// Passage for `query`, truncated to `max_chars` characters.
    ///
    /// `Ok(None)` means "not found" and is not an error.
    async fn lookup(&self, query: &str, max_chars: usize) -> Result<Option<String>>;
}
