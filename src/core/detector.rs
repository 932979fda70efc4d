//! Detection entry point.
//!
//! Sequences extraction, verification, scoring, explanation and highlighting
//! for one input text, enforcing the safety limits along the way.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{
    EmbeddingSimilarity, EvidenceSource, HeuristicParser, KnowledgeBase, LexicalSimilarity,
    SentenceParser, SimilarityModel, WikipediaSource,
};
use crate::config::{Config, SimilarityBackend};
use crate::domain::{
    round4, DetectionResult, ExplainSummary, FlaggedClaim, RiskReport, VerificationResult,
};

use super::explainer::Explainer;
use super::extractor::ClaimExtractor;
use super::highlight::{highlight_plain, highlight_ranges};
use super::safety::{SafetyLimits, SafetyViolation};
use super::scorer::RiskScorer;
use super::verifier::{ClaimVerifier, VerifierSettings};

const NO_EVIDENCE: &str = "No supporting evidence found.";
const NO_SOURCE: &str = "N/A";

/// Errors surfaced by a detection run, by failing stage
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Safety check failed: {0}")]
    Safety(#[from] SafetyViolation),

    #[error("Claim extraction failed: {0:#}")]
    Extraction(anyhow::Error),

    #[error("Verification failed for all {failed} of {total} claims")]
    Verification { failed: usize, total: usize },
}

/// Hallucination detector
pub struct Detector {
    extractor: ClaimExtractor,
    verifier: ClaimVerifier,
    scorer: RiskScorer,
    explainer: Explainer,
    limits: SafetyLimits,
}

impl Detector {
    /// Detector with default settings and limits
    pub fn new(
        parser: Arc<dyn SentenceParser>,
        evidence: Arc<dyn EvidenceSource>,
        similarity: Arc<dyn SimilarityModel>,
    ) -> Self {
        Self::with_settings(
            parser,
            evidence,
            similarity,
            VerifierSettings::default(),
            SafetyLimits::default(),
        )
    }

    /// Detector with explicit tuning; the query budget and call timeout
    /// come from `limits`
    pub fn with_settings(
        parser: Arc<dyn SentenceParser>,
        evidence: Arc<dyn EvidenceSource>,
        similarity: Arc<dyn SimilarityModel>,
        settings: VerifierSettings,
        limits: SafetyLimits,
    ) -> Self {
        let settings = VerifierSettings {
            max_queries_per_claim: limits.max_queries_per_claim,
            call_timeout: limits.call_timeout(),
            ..settings
        };

        Self {
            extractor: ClaimExtractor::new(parser),
            verifier: ClaimVerifier::new(evidence, similarity, settings),
            scorer: RiskScorer::new(),
            explainer: Explainer::new(),
            limits,
        }
    }

    /// Build the stock collaborators described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.safety.call_timeout();

        let evidence: Arc<dyn EvidenceSource> = match &config.knowledge_file {
            Some(path) => {
                config
                    .safety
                    .validate_path(path)
                    .context("Refusing to load knowledge file")?;
                Arc::new(KnowledgeBase::from_file(path)?)
            }
            None => Arc::new(WikipediaSource::new(&config.wiki_language, timeout)?),
        };

        let similarity: Arc<dyn SimilarityModel> = match config.similarity {
            SimilarityBackend::Lexical => Arc::new(LexicalSimilarity::new()),
            SimilarityBackend::Embedding => Arc::new(EmbeddingSimilarity::new(
                &config.embedding.endpoint,
                &config.embedding.model,
                config.embedding.api_key.clone(),
                timeout,
            )?),
        };

        info!(
            evidence = evidence.name(),
            similarity = similarity.name(),
            threshold = config.support_threshold,
            "Detector configured"
        );

        Ok(Self::with_settings(
            Arc::new(HeuristicParser::new()),
            evidence,
            similarity,
            config.verifier_settings(),
            config.safety.clone(),
        ))
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    pub fn verifier_settings(&self) -> &VerifierSettings {
        self.verifier.settings()
    }

    /// Run the full pipeline on one text
    #[instrument(skip(self, text), fields(bytes = text.len()))]
    pub async fn detect(&self, text: &str) -> Result<DetectionResult, DetectError> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!(%run_id, "Starting detection");

        self.limits.validate_input(text, None)?;

        let claims = self
            .extractor
            .extract(text)
            .map_err(DetectError::Extraction)?;
        self.limits.check_claims(claims.len())?;

        let results = self.verifier.verify(&claims).await;

        let failed = results.iter().filter(|r| r.is_failed()).count();
        if failed > 0 && failed == results.len() {
            error!(%run_id, failed, "Every claim failed verification");
            return Err(DetectError::Verification {
                failed,
                total: results.len(),
            });
        }
        if failed > 0 {
            warn!(%run_id, failed, total = results.len(), "Some claims could not be verified");
        }

        let report = self.scorer.score(&results);
        let explanations = self.explainer.explain(&results);
        let highlighted_text = highlight_plain(text, &report);
        let highlights = highlight_ranges(text, &report);

        info!(
            %run_id,
            claims = report.total_claims,
            unsupported = report.unsupported_claims,
            risk = report.hallucination_risk,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Detection complete"
        );

        Ok(DetectionResult {
            hallucinated: report.is_hallucinated(),
            hallucination_risk: report.hallucination_risk,
            confidence: report.confidence,
            total_claims: report.total_claims,
            supported_claims: report.supported_claims,
            unsupported_claims: report.unsupported_claims,
            average_similarity: report.average_similarity,
            flagged_claims: flagged_claims(&results),
            explanations,
            highlighted_text,
            explanation: summarize(&report),
            highlights,
        })
    }

    /// Overall hallucination risk only
    pub async fn risk_score(&self, text: &str) -> Result<f64, DetectError> {
        Ok(self.detect(text).await?.hallucination_risk)
    }

    /// Verdict plus per-claim explanations
    pub async fn explain(&self, text: &str) -> Result<ExplainSummary, DetectError> {
        Ok(self.detect(text).await?.into())
    }
}

/// One entry per unsupported result, with fallbacks for missing evidence
pub fn flagged_claims(results: &[VerificationResult]) -> Vec<FlaggedClaim> {
    results
        .iter()
        .filter(|r| !r.is_supported)
        .map(|r| FlaggedClaim {
            claim: r.claim.text.clone(),
            confidence: round4(r.confidence),
            evidence: r
                .evidence
                .clone()
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| NO_EVIDENCE.to_string()),
            source: r.source.clone().unwrap_or_else(|| NO_SOURCE.to_string()),
        })
        .collect()
}

fn percent(value: f64) -> String {
    format!("{:.0}%", value * 100.0)
}

/// One-line verdict for the whole text
pub fn summarize(report: &RiskReport<'_>) -> String {
    if report.unsupported_claims > 0 {
        format!(
            "Detected {} unsupported claim(s) out of {}. Hallucination risk: {}.",
            report.unsupported_claims,
            report.total_claims,
            percent(report.hallucination_risk)
        )
    } else {
        format!(
            "All {} claim(s) appear factually supported. Confidence: {}.",
            report.total_claims,
            percent(report.confidence)
        )
    }
}
