//! Detection counters owned by the caller.
//!
//! Nothing here is global: the boundary layer creates one `DetectionMetrics`
//! and passes it by `&mut` to whatever records detections.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DetectionResult;

/// Running counters for a detector session
#[derive(Debug, Clone)]
pub struct DetectionMetrics {
    /// Texts submitted, single or batch
    pub total_requests: u64,

    /// Single-text detections
    pub detections: u64,

    /// Batch requests (one per batch, not per item)
    pub batch_detections: u64,

    /// Claims verified across all detections
    pub claims_analyzed: u64,

    /// Detections whose result was hallucinated
    pub hallucinations_detected: u64,

    /// Sum of detection latencies
    pub total_latency: Duration,

    /// When counting started
    pub started_at: Instant,
    pub started_at_utc: DateTime<Utc>,
}

impl Default for DetectionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionMetrics {
    pub fn new() -> Self {
        Self {
            total_requests: 0,
            detections: 0,
            batch_detections: 0,
            claims_analyzed: 0,
            hallucinations_detected: 0,
            total_latency: Duration::ZERO,
            started_at: Instant::now(),
            started_at_utc: Utc::now(),
        }
    }

    /// Record one finished detection
    pub fn record_detection(&mut self, result: &DetectionResult, latency: Duration) {
        self.total_requests += 1;
        self.detections += 1;
        self.claims_analyzed += result.total_claims as u64;
        if result.hallucinated {
            self.hallucinations_detected += 1;
        }
        self.total_latency += latency;
    }

    /// Record a batch request; items are recorded separately
    pub fn record_batch(&mut self) {
        self.batch_detections += 1;
    }

    /// Mean latency per detection in milliseconds
    pub fn avg_latency_ms(&self) -> f64 {
        if self.detections == 0 {
            return 0.0;
        }
        self.total_latency.as_secs_f64() * 1000.0 / self.detections as f64
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests,
            detections: self.detections,
            batch_detections: self.batch_detections,
            claims_analyzed: self.claims_analyzed,
            hallucinations_detected: self.hallucinations_detected,
            avg_latency_ms: (self.avg_latency_ms() * 100.0).round() / 100.0,
            uptime_seconds: self.uptime_seconds(),
            started_at: self.started_at_utc,
        }
    }
}

/// Serialisable view of the counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub detections: u64,
    pub batch_detections: u64,
    pub claims_analyzed: u64,
    pub hallucinations_detected: u64,
    pub avg_latency_ms: f64,
    pub uptime_seconds: u64,
    pub started_at: DateTime<Utc>,
}
