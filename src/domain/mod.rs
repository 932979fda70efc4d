//! Domain types for the detection pipeline.
//!
//! This module contains the core data structures:
//! - Claim: A sentence-level factual assertion with its source span
//! - VerificationResult: Outcome of checking one claim
//! - Report: Risk report, explanations and the final detection result

pub mod claim;
pub mod report;
pub mod verification;

// Re-export commonly used types
pub use claim::{Claim, SourceSpan};
pub use report::{
    round4, DetectionResult, ExplainSummary, Explanation, FlaggedClaim, HighlightRange, RiskLevel,
    RiskReport, Severity,
};
pub use verification::{truncate_chars, VerificationResult, MAX_EVIDENCE_CHARS, SUPPORT_THRESHOLD};
