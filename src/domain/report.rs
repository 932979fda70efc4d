//! Aggregate verdicts: risk report, explanations and the final detection result.

use serde::{Deserialize, Serialize};

use super::verification::VerificationResult;

/// Aggregate over one run's verification results.
///
/// Borrows the results it summarises instead of copying them.
#[derive(Debug, Clone, Serialize)]
pub struct RiskReport<'a> {
    pub hallucination_risk: f64,
    pub confidence: f64,
    pub total_claims: usize,
    pub supported_claims: usize,
    pub unsupported_claims: usize,
    pub average_similarity: f64,
    pub details: &'a [VerificationResult],
}

impl RiskReport<'_> {
    pub fn is_hallucinated(&self) -> bool {
        self.unsupported_claims > 0
    }
}

/// How confidently a claim is flagged as unsupported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse banding of the overall risk score for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_risk(risk: f64) -> Self {
        if risk < 0.3 {
            RiskLevel::Low
        } else if risk < 0.6 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

/// Human-readable verdict for a single claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub claim: String,
    pub hallucinated: bool,
    pub confidence: f64,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    pub source: Option<String>,
    pub severity: Severity,
}

/// Summary entry for an unsupported claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedClaim {
    pub claim: String,
    pub confidence: f64,
    pub evidence: String,
    pub source: String,
}

/// A styled byte range of the original text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightRange {
    pub start: usize,
    pub end: usize,
    pub style: String,
}

/// Complete output of one detection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub hallucinated: bool,
    pub hallucination_risk: f64,
    pub confidence: f64,
    pub total_claims: usize,
    pub supported_claims: usize,
    pub unsupported_claims: usize,
    pub average_similarity: f64,
    pub flagged_claims: Vec<FlaggedClaim>,
    pub explanations: Vec<Explanation>,
    pub highlighted_text: String,
    pub explanation: String,
    /// Flagged ranges of the input for rich renderers
    #[serde(skip)]
    pub highlights: Vec<HighlightRange>,
}

impl DetectionResult {
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_risk(self.hallucination_risk)
    }
}

/// Condensed view of a detection run: the verdict plus per-claim explanations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainSummary {
    pub hallucinated: bool,
    pub confidence: f64,
    pub explanation: String,
    pub claims: Vec<Explanation>,
}

impl From<DetectionResult> for ExplainSummary {
    fn from(result: DetectionResult) -> Self {
        Self {
            hallucinated: result.hallucinated,
            confidence: result.confidence,
            explanation: result.explanation,
            claims: result.explanations,
        }
    }
}

/// Round to 4 decimal places, the precision of every reported score
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
