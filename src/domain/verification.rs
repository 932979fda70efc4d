//! Outcome of checking one claim against the evidence source.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::claim::Claim;

/// Minimum similarity at which a claim counts as corroborated
pub const SUPPORT_THRESHOLD: f64 = 0.45;

/// Longest evidence excerpt kept on a result (characters)
pub const MAX_EVIDENCE_CHARS: usize = 500;

/// Result of verifying a single claim.
///
/// `confidence` and `similarity_score` always hold the same value, and
/// `is_supported == similarity_score >= threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub claim: Claim,
    pub is_supported: bool,
    pub confidence: f64,
    pub similarity_score: f64,

    /// Best evidence passage, at most 500 characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,

    /// Provenance label, `"<source-name>: <query>"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,

    /// Set when every collaborator call for this claim failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl VerificationResult {
    /// Build a result from the best similarity found for a claim
    pub fn scored(
        claim: Claim,
        similarity: f64,
        threshold: f64,
        evidence: Option<String>,
        source: Option<String>,
    ) -> Self {
        Self {
            claim,
            is_supported: similarity >= threshold,
            confidence: similarity,
            similarity_score: similarity,
            evidence: evidence.map(|e| truncate_chars(&e, MAX_EVIDENCE_CHARS)),
            source,
            metadata: HashMap::new(),
            failure: None,
        }
    }

    /// Unsupported result with zero similarity and no evidence
    pub fn unsupported(claim: Claim) -> Self {
        Self::scored(claim, 0.0, SUPPORT_THRESHOLD, None, None)
    }

    /// Unsupported result for a claim whose collaborators all failed
    pub fn failed(claim: Claim, reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::unsupported(claim)
        }
    }

    /// Whether verification of this claim failed outright
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Truncate to at most `max` characters, respecting UTF-8 boundaries
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
