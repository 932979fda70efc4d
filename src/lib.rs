//! hallucination-guard - claim-level hallucination detection
//!
//! Splits AI-generated text into sentence-level factual claims, checks each
//! claim against a trusted knowledge source and reports an overall risk score
//! with per-claim explanations.
//!
//! # Pipeline
//!
//! extract claims -> verify against evidence -> score risk -> explain -> highlight
//!
//! Every stage consumes the complete output of the previous one. Only the
//! verifier talks to the outside world, through the collaborator traits in
//! `adapters`.
//!
//! # Modules
//!
//! - `adapters`: Collaborators (sentence parser, similarity model, evidence sources)
//! - `core`: Detection logic (Extractor, Verifier, Scorer, Detector, Safety)
//! - `domain`: Data structures (Claim, VerificationResult, DetectionResult)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Check a text against Wikipedia
//! hallucination-guard check "The Eiffel Tower is located in Berlin."
//!
//! # Check a file against an offline knowledge base, as JSON
//! hallucination-guard --knowledge facts.yaml file answer.txt --json
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::core::{DetectError, DetectionMetrics, Detector, SafetyLimits, SafetyViolation};
pub use domain::{Claim, DetectionResult, ExplainSummary, RiskReport, VerificationResult};
