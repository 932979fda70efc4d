//! Risk scoring.
//!
//! Aggregates verification results into one report:
//!
//! ```text
//! ratio    = unsupported / total
//! inv      = 1 - mean(similarity)
//! severity = ratio > 0.5 ? min(1, ratio * 1.5) : ratio * 0.5
//! risk     = clamp(0.50 * ratio + 0.35 * inv + 0.15 * severity, 0, 1)
//! ```
//!
//! A run with no claims is zero-risk.

use crate::domain::{round4, RiskReport, VerificationResult};

const RATIO_WEIGHT: f64 = 0.50;
const INV_CONFIDENCE_WEIGHT: f64 = 0.35;
const SEVERITY_WEIGHT: f64 = 0.15;

/// Severity term; grows faster once most claims are unsupported
pub fn severity_term(unsupported_ratio: f64) -> f64 {
    if unsupported_ratio > 0.5 {
        (unsupported_ratio * 1.5).min(1.0)
    } else {
        unsupported_ratio * 0.5
    }
}

/// Stateless risk scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskScorer;

impl RiskScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score<'a>(&self, results: &'a [VerificationResult]) -> RiskReport<'a> {
        if results.is_empty() {
            return RiskReport {
                hallucination_risk: 0.0,
                confidence: 1.0,
                total_claims: 0,
                supported_claims: 0,
                unsupported_claims: 0,
                average_similarity: 0.0,
                details: results,
            };
        }

        let total = results.len();
        let supported = results.iter().filter(|r| r.is_supported).count();
        let unsupported = total - supported;

        let average = results.iter().map(|r| r.similarity_score).sum::<f64>() / total as f64;
        let ratio = unsupported as f64 / total as f64;
        let inv_confidence = 1.0 - average;

        let risk = RATIO_WEIGHT * ratio
            + INV_CONFIDENCE_WEIGHT * inv_confidence
            + SEVERITY_WEIGHT * severity_term(ratio);
        let risk = round4(risk.clamp(0.0, 1.0));

        RiskReport {
            hallucination_risk: risk,
            confidence: round4(1.0 - risk),
            total_claims: total,
            supported_claims: supported,
            unsupported_claims: unsupported,
            average_similarity: round4(average),
            details: results,
        }
    }
}
