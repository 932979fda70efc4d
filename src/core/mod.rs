//! Core detection logic.
//!
//! This module contains:
//! - Extractor: Sentence-level claim extraction
//! - Verifier: Evidence lookup and similarity scoring
//! - Scorer / Explainer / Highlight: Aggregation and presentation
//! - Safety / Retry: Limits and call budget
//! - Detector: Main execution engine

pub mod detector;
pub mod explainer;
pub mod extractor;
pub mod highlight;
pub mod metrics;
pub mod retry;
pub mod safety;
pub mod scorer;
pub mod verifier;

// Re-export commonly used types
pub use detector::{DetectError, Detector};
pub use explainer::Explainer;
pub use extractor::ClaimExtractor;
pub use highlight::{highlight_plain, highlight_ranges, FLAG_CLOSE, FLAG_OPEN};
pub use metrics::{DetectionMetrics, MetricsSnapshot};
pub use retry::RetryPolicy;
pub use safety::{SafetyLimits, SafetyViolation};
pub use scorer::RiskScorer;
pub use verifier::{search_queries, ClaimVerifier, EvidenceCache, VerifierSettings};
