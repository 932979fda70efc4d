//! Claim verification.
//!
//! Verification runs in three phases:
//! 1. Fetch: one evidence lookup per distinct query across the whole batch,
//!    stored in a run-scoped `EvidenceCache`.
//! 2. Score: one similarity call per (claim, query, evidence) triple.
//! 3. Reduce: a pure left-to-right fold per claim that keeps the maximum
//!    similarity. Ties go to the earlier query.
//!
//! Phases 1 and 2 run concurrently with a bound on outstanding calls.
//! Phase 3 only looks at outcomes placed back in query order, so completion
//! order never affects the result.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use super::retry::RetryPolicy;
use crate::adapters::{EvidenceSource, SimilarityModel};
use crate::domain::{truncate_chars, Claim, VerificationResult, SUPPORT_THRESHOLD};

/// Words that never become queries even when capitalised
const QUERY_STOP_WORDS: &[&str] = &["the", "this", "that", "these", "those", "there"];

/// Length of the fallback query taken from the claim text
const FALLBACK_QUERY_CHARS: usize = 80;

/// Tuning for the verifier
#[derive(Debug, Clone)]
pub struct VerifierSettings {
    pub support_threshold: f64,
    /// Longest passage requested from the evidence source
    pub evidence_max_chars: usize,
    /// Outstanding collaborator calls allowed at once
    pub max_concurrency: usize,
    pub max_queries_per_claim: usize,
    pub call_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self {
            support_threshold: SUPPORT_THRESHOLD,
            evidence_max_chars: 2000,
            max_concurrency: 8,
            max_queries_per_claim: 8,
            call_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

/// Search queries for a claim, in priority order and without duplicates.
///
/// The subject comes first, then capitalised words longer than two
/// characters, then (if nothing else) the first 80 characters of the text.
pub fn search_queries(claim: &Claim) -> Vec<String> {
    let mut queries = Vec::new();

    if let Some(subject) = claim.subject.as_deref().filter(|s| !s.trim().is_empty()) {
        queries.push(subject.to_string());
    }

    for word in claim.text.split_whitespace() {
        let capitalised = word.chars().next().is_some_and(char::is_uppercase);
        if capitalised
            && word.chars().count() > 2
            && !QUERY_STOP_WORDS.contains(&word.to_lowercase().as_str())
        {
            queries.push(word.to_string());
        }
    }

    if queries.is_empty() && !claim.text.trim().is_empty() {
        queries.push(truncate_chars(&claim.text, FALLBACK_QUERY_CHARS));
    }

    let mut seen = HashSet::new();
    queries.retain(|q| seen.insert(q.clone()));
    queries
}

/// What one query produced for one claim
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The evidence source had no entry
    NotFound { query: String },
    /// Evidence found and scored
    Scored {
        query: String,
        evidence: String,
        similarity: f64,
    },
    /// A collaborator call failed for this query
    Failed { query: String, error: String },
}

/// Best-scoring evidence for a claim
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch<'a> {
    pub query: &'a str,
    pub evidence: &'a str,
    pub similarity: f64,
}

/// Fold outcomes left to right, keeping a strictly greater similarity.
///
/// Starts from 0.0, so evidence scoring exactly 0.0 is never selected.
pub fn select_best(outcomes: &[QueryOutcome]) -> Option<BestMatch<'_>> {
    outcomes
        .iter()
        .fold(None::<BestMatch<'_>>, |best, outcome| match outcome {
            QueryOutcome::Scored {
                query,
                evidence,
                similarity,
            } if *similarity > best.as_ref().map_or(0.0, |b| b.similarity) => Some(BestMatch {
                query: query.as_str(),
                evidence: evidence.as_str(),
                similarity: *similarity,
            }),
            _ => best,
        })
}

/// Build the verification result for one claim from its ordered outcomes
pub fn reduce_outcomes(
    claim: &Claim,
    source_name: &str,
    outcomes: &[QueryOutcome],
    threshold: f64,
) -> VerificationResult {
    let failures: Vec<&str> = outcomes
        .iter()
        .filter_map(|o| match o {
            QueryOutcome::Failed { error, .. } => Some(error.as_str()),
            _ => None,
        })
        .collect();

    let mut result = if !outcomes.is_empty() && failures.len() == outcomes.len() {
        VerificationResult::failed(claim.clone(), failures.join("; "))
    } else {
        match select_best(outcomes) {
            Some(best) => VerificationResult::scored(
                claim.clone(),
                best.similarity,
                threshold,
                Some(best.evidence.to_string()),
                Some(format!("{}: {}", source_name, best.query)),
            ),
            None => VerificationResult::scored(claim.clone(), 0.0, threshold, None, None),
        }
    };

    result
        .metadata
        .insert("queries".to_string(), outcomes.len().to_string());
    if !failures.is_empty() {
        result
            .metadata
            .insert("failed_queries".to_string(), failures.len().to_string());
    }
    result
}

/// Run-scoped evidence cache keyed by query string.
///
/// Filled once by the fetch phase and read-only afterwards.
#[derive(Debug, Default)]
pub struct EvidenceCache {
    entries: HashMap<String, Result<Option<String>, String>>,
}

impl EvidenceCache {
    pub fn get(&self, query: &str) -> Option<&Result<Option<String>, String>> {
        self.entries.get(query)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Verifies claims against an evidence source with a similarity model
pub struct ClaimVerifier {
    evidence: Arc<dyn EvidenceSource>,
    similarity: Arc<dyn SimilarityModel>,
    settings: VerifierSettings,
}

impl ClaimVerifier {
    pub fn new(
        evidence: Arc<dyn EvidenceSource>,
        similarity: Arc<dyn SimilarityModel>,
        settings: VerifierSettings,
    ) -> Self {
        Self {
            evidence,
            similarity,
            settings,
        }
    }

    pub fn settings(&self) -> &VerifierSettings {
        &self.settings
    }

    /// Verify every claim; the output has the same length and order
    pub async fn verify(&self, claims: &[Claim]) -> Vec<VerificationResult> {
        let plans: Vec<Vec<String>> = claims
            .iter()
            .map(|claim| {
                let mut queries = search_queries(claim);
                queries.truncate(self.settings.max_queries_per_claim);
                queries
            })
            .collect();

        let cache = self.fetch_evidence(&plans).await;
        let outcomes = self.score_evidence(claims, &plans, &cache).await;

        claims
            .iter()
            .zip(outcomes)
            .map(|(claim, outcomes)| {
                let result = reduce_outcomes(
                    claim,
                    self.evidence.name(),
                    &outcomes,
                    self.settings.support_threshold,
                );
                info!(
                    supported = result.is_supported,
                    confidence = result.confidence,
                    claim = %truncate_chars(&claim.text, 60),
                    "Claim verified"
                );
                result
            })
            .collect()
    }

    /// Look up every distinct query once
    async fn fetch_evidence(&self, plans: &[Vec<String>]) -> EvidenceCache {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = plans
            .iter()
            .flatten()
            .map(String::as_str)
            .filter(|q| seen.insert(*q))
            .collect();

        let max_chars = self.settings.evidence_max_chars;
        let timeout = self.settings.call_timeout;

        let entries = stream::iter(unique)
            .map(|query| async move {
                let result = self
                    .settings
                    .retry
                    .run("evidence lookup", timeout, || {
                        self.evidence.lookup(query, max_chars)
                    })
                    .await
                    .map_err(|e| {
                        warn!(%query, source = self.evidence.name(), error = %e, "Evidence lookup failed");
                        format!("{:#}", e)
                    });
                (query.to_string(), result)
            })
            .buffer_unordered(self.settings.max_concurrency.max(1))
            .collect::<HashMap<_, _>>()
            .await;

        EvidenceCache { entries }
    }

    /// Score found evidence, returning outcomes per claim in query order
    async fn score_evidence(
        &self,
        claims: &[Claim],
        plans: &[Vec<String>],
        cache: &EvidenceCache,
    ) -> Vec<Vec<QueryOutcome>> {
        let mut slots: Vec<Vec<Option<QueryOutcome>>> =
            plans.iter().map(|p| vec![None; p.len()]).collect();
        let mut jobs = Vec::new();

        for (ci, queries) in plans.iter().enumerate() {
            for (qi, query) in queries.iter().enumerate() {
                slots[ci][qi] = match cache.get(query) {
                    Some(Ok(Some(evidence))) => {
                        jobs.push((ci, qi, evidence.as_str()));
                        None
                    }
                    Some(Ok(None)) => Some(QueryOutcome::NotFound {
                        query: query.clone(),
                    }),
                    Some(Err(error)) => Some(QueryOutcome::Failed {
                        query: query.clone(),
                        error: error.clone(),
                    }),
                    None => Some(QueryOutcome::Failed {
                        query: query.clone(),
                        error: "query was not fetched".to_string(),
                    }),
                };
            }
        }

        let timeout = self.settings.call_timeout;
        let scored: Vec<(usize, usize, &str, Result<f64, String>)> = stream::iter(jobs)
            .map(|(ci, qi, evidence)| {
                let claim_text = claims[ci].text.as_str();
                async move {
                    let result = self
                        .settings
                        .retry
                        .run("similarity", timeout, || {
                            self.similarity.similarity(claim_text, evidence)
                        })
                        .await
                        .and_then(|score| {
                            if score.is_finite() {
                                Ok(score.clamp(0.0, 1.0))
                            } else {
                                Err(anyhow::anyhow!("similarity model returned {}", score))
                            }
                        })
                        .map_err(|e| {
                            warn!(claim = %truncate_chars(claim_text, 60), model = self.similarity.name(), error = %e, "Similarity scoring failed");
                            format!("{:#}", e)
                        });
                    (ci, qi, evidence, result)
                }
            })
            .buffer_unordered(self.settings.max_concurrency.max(1))
            .collect()
            .await;

        for (ci, qi, evidence, result) in scored {
            let query = plans[ci][qi].clone();
            slots[ci][qi] = Some(match result {
                Ok(similarity) => QueryOutcome::Scored {
                    query,
                    evidence: evidence.to_string(),
                    similarity,
                },
                Err(error) => QueryOutcome::Failed { query, error },
            });
        }

        slots
            .into_iter()
            .map(|claim_slots| claim_slots.into_iter().flatten().collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(query: &str, similarity: f64) -> QueryOutcome {
        QueryOutcome::Scored {
            query: query.to_string(),
            evidence: format!("evidence for {}", query),
            similarity,
        }
    }

    #[test]
    fn test_queries_subject_first() {
        let claim = Claim::new("The Eiffel Tower is located in Paris.").with_subject("Tower");
        assert_eq!(search_queries(&claim), vec!["Tower", "Eiffel", "Paris."]);
    }

    #[test]
    fn test_queries_skip_stop_words_and_short_words() {
        let claim = Claim::new("This Is where Al and There met Obama");
        assert_eq!(search_queries(&claim), vec!["Obama"]);
    }

    #[test]
    fn test_queries_fallback_to_text_prefix() {
        let text = "water boils at one hundred degrees celsius at sea level under standard atmospheric pressure";
        let queries = search_queries(&Claim::new(text));
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].chars().count(), 80);
        assert!(text.starts_with(&queries[0]));
    }

    #[test]
    fn test_queries_empty_text() {
        assert!(search_queries(&Claim::new("")).is_empty());
        assert!(search_queries(&Claim::new("   ")).is_empty());
    }

    #[test]
    fn test_select_best_first_seen_wins_ties() {
        let outcomes = vec![
            scored("Eiffel", 0.7),
            QueryOutcome::NotFound {
                query: "Tower".to_string(),
            },
            scored("Paris", 0.7),
        ];
        let best = select_best(&outcomes).unwrap();
        assert_eq!(best.query, "Eiffel");
    }

    #[test]
    fn test_select_best_keeps_maximum() {
        let outcomes = vec![scored("a", 0.2), scored("b", 0.9), scored("c", 0.5)];
        assert_eq!(select_best(&outcomes).unwrap().query, "b");
    }

    #[test]
    fn test_select_best_ignores_zero_similarity() {
        assert!(select_best(&[scored("a", 0.0)]).is_none());
        assert!(select_best(&[]).is_none());
    }

    #[test]
    fn test_reduce_labels_source() {
        let claim = Claim::new("Paris is in France.");
        let result = reduce_outcomes(
            &claim,
            "Wikipedia",
            &[scored("Paris", 0.8)],
            SUPPORT_THRESHOLD,
        );
        assert!(result.is_supported);
        assert_eq!(result.source.as_deref(), Some("Wikipedia: Paris"));
        assert_eq!(result.evidence.as_deref(), Some("evidence for Paris"));
        assert_eq!(result.metadata.get("queries").unwrap(), "1");
    }

    #[test]
    fn test_reduce_partial_failure_keeps_other_queries() {
        let claim = Claim::new("Paris is in France.");
        let outcomes = vec![
            QueryOutcome::Failed {
                query: "Paris".to_string(),
                error: "timeout".to_string(),
            },
            scored("France", 0.6),
        ];
        let result = reduce_outcomes(&claim, "Wikipedia", &outcomes, SUPPORT_THRESHOLD);
        assert!(!result.is_failed());
        assert!(result.is_supported);
        assert_eq!(result.metadata.get("failed_queries").unwrap(), "1");
    }

    #[test]
    fn test_reduce_all_failed() {
        let claim = Claim::new("Paris is in France.");
        let outcomes = vec![QueryOutcome::Failed {
            query: "Paris".to_string(),
            error: "connection refused".to_string(),
        }];
        let result = reduce_outcomes(&claim, "Wikipedia", &outcomes, SUPPORT_THRESHOLD);
        assert!(result.is_failed());
        assert!(!result.is_supported);
        assert_eq!(result.similarity_score, 0.0);
    }

    #[test]
    fn test_reduce_no_evidence() {
        let claim = Claim::new("Paris is in France.");
        let outcomes = vec![QueryOutcome::NotFound {
            query: "Paris".to_string(),
        }];
        let result = reduce_outcomes(&claim, "Wikipedia", &outcomes, SUPPORT_THRESHOLD);
        assert!(!result.is_failed());
        assert!(!result.is_supported);
        assert!(result.evidence.is_none());
        assert!(result.source.is_none());
    }
}
