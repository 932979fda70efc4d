//! In-process collaborators for integration tests. No network.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use hallucination_guard::adapters::{
    EvidenceSource, HeuristicParser, ParsedSentence, SentenceParser, SimilarityModel,
};
use hallucination_guard::core::{RetryPolicy, SafetyLimits, VerifierSettings};
use hallucination_guard::Detector;

/// Evidence source driven by a closure, recording every lookup
pub struct FakeEvidence {
    name: String,
    respond: Box<dyn Fn(&str) -> Result<Option<String>> + Send + Sync>,
    delay: Box<dyn Fn(&str) -> Duration + Send + Sync>,
    calls: Mutex<Vec<String>>,
    in_flight: InFlight,
}

/// Tracks the most calls outstanding at once
#[derive(Default)]
pub struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl FakeEvidence {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&str) -> Result<Option<String>> + Send + Sync + 'static,
    {
        Self {
            name: "Fake".to_string(),
            respond: Box::new(respond),
            delay: Box::new(|_| Duration::ZERO),
            calls: Mutex::new(Vec::new()),
            in_flight: InFlight::default(),
        }
    }

    /// Every query finds `"passage about <query>"`
    pub fn always_found() -> Self {
        Self::new(|query| Ok(Some(format!("passage about {}", query))))
    }

    /// Only the listed titles are found
    pub fn from_map(entries: &[(&str, &str)]) -> Self {
        let map: HashMap<String, String> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::new(move |query| Ok(map.get(query).cloned()))
    }

    /// Every lookup errors
    pub fn failing() -> Self {
        Self::new(|query| anyhow::bail!("connection refused for {}", query))
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_delay<F>(mut self, delay: F) -> Self
    where
        F: Fn(&str) -> Duration + Send + Sync + 'static,
    {
        self.delay = Box::new(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, query: &str) -> usize {
        self.calls().iter().filter(|q| q.as_str() == query).count()
    }

    /// Most lookups that were running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.peak()
    }
}

#[async_trait]
impl EvidenceSource for FakeEvidence {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, query: &str, max_chars: usize) -> Result<Option<String>> {
        self.calls.lock().unwrap().push(query.to_string());
        self.in_flight.enter();
        let delay = (self.delay)(query);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.exit();
        Ok((self.respond)(query)?.map(|p| p.chars().take(max_chars).collect()))
    }
}

/// Similarity model driven by a closure over (claim, evidence)
pub struct FakeSimilarity {
    score: Box<dyn Fn(&str, &str) -> Result<f64> + Send + Sync>,
    calls: AtomicUsize,
    delay: Duration,
    in_flight: InFlight,
}

impl FakeSimilarity {
    pub fn new<F>(score: F) -> Self
    where
        F: Fn(&str, &str) -> Result<f64> + Send + Sync + 'static,
    {
        Self {
            score: Box::new(score),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            in_flight: InFlight::default(),
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(move |_, _| Ok(value))
    }

    /// Score by claim: the first matching substring wins, otherwise `default`
    pub fn by_claim(rules: &[(&str, f64)], default: f64) -> Self {
        let rules: Vec<(String, f64)> = rules.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        Self::new(move |claim, _| {
            Ok(rules
                .iter()
                .find(|(needle, _)| claim.contains(needle.as_str()))
                .map(|(_, v)| *v)
                .unwrap_or(default))
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most similarity calls that were running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.peak()
    }
}

#[async_trait]
impl SimilarityModel for FakeSimilarity {
    fn name(&self) -> &str {
        "fake"
    }

    async fn similarity(&self, text_a: &str, text_b: &str) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.in_flight.enter();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.exit();
        (self.score)(text_a, text_b)
    }
}

/// Parser that always fails
pub struct BrokenParser;

impl SentenceParser for BrokenParser {
    fn name(&self) -> &str {
        "broken"
    }

    fn segment(&self, _text: &str) -> Result<Vec<ParsedSentence>> {
        anyhow::bail!("model not loaded")
    }
}

/// Verifier settings for tests: no retry delay, short timeout
pub fn fast_settings() -> VerifierSettings {
    VerifierSettings {
        call_timeout: Duration::from_secs(2),
        retry: RetryPolicy::none(),
        ..Default::default()
    }
}

/// Detector with the heuristic parser and the given fakes
pub fn detector(evidence: Arc<FakeEvidence>, similarity: Arc<FakeSimilarity>) -> Detector {
    detector_with_limits(evidence, similarity, SafetyLimits::default())
}

pub fn detector_with_limits(
    evidence: Arc<FakeEvidence>,
    similarity: Arc<FakeSimilarity>,
    limits: SafetyLimits,
) -> Detector {
    Detector::with_settings(
        Arc::new(HeuristicParser::new()),
        evidence,
        similarity,
        fast_settings(),
        limits,
    )
}
