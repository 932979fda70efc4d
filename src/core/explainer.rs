//! Per-claim explanations.

use crate::domain::{round4, truncate_chars, Explanation, Severity, VerificationResult};

/// Evidence excerpt length quoted in an explanation (characters)
const EXCERPT_CHARS: usize = 200;

/// Severity of a verdict; supported claims are always low
pub fn severity_for(result: &VerificationResult) -> Severity {
    if result.is_supported {
        Severity::Low
    } else if result.confidence < 0.2 {
        Severity::High
    } else if result.confidence < 0.4 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn explanation_text(result: &VerificationResult) -> String {
    match (result.evidence.as_deref().filter(|e| !e.is_empty()), result.is_supported) {
        (_, true) => format!(
            "This claim appears to be factually supported (similarity: {:.2}).",
            result.similarity_score
        ),
        (Some(evidence), false) => format!(
            "This claim could not be verified. Available evidence suggests otherwise \
             (similarity: {:.2}). Source evidence: {}",
            result.similarity_score,
            truncate_chars(evidence, EXCERPT_CHARS)
        ),
        (None, false) => format!(
            "This claim could not be verified against any trusted source \
             (similarity: {:.2}). No supporting evidence was found.",
            result.similarity_score
        ),
    }
}

/// Builds human-readable explanations, one per result
#[derive(Debug, Clone, Copy, Default)]
pub struct Explainer;

impl Explainer {
    pub fn new() -> Self {
        Self
    }

    pub fn explain(&self, results: &[VerificationResult]) -> Vec<Explanation> {
        results.iter().map(|r| self.explain_one(r)).collect()
    }

    pub fn explain_one(&self, result: &VerificationResult) -> Explanation {
        Explanation {
            claim: result.claim.text.clone(),
            hallucinated: !result.is_supported,
            confidence: round4(result.confidence),
            explanation: explanation_text(result),
            evidence: result.evidence.clone().filter(|e| !e.is_empty()),
            source: result.source.clone(),
            severity: severity_for(result),
        }
    }
}
