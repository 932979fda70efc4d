//! Command-line interface for hallucination-guard.
//!
//! Provides commands for checking a text, a file or a batch of texts, and
//! for inspecting the resolved configuration.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::config::{self, Config};
use crate::core::{DetectionMetrics, Detector, MetricsSnapshot};
use crate::domain::DetectionResult;

pub mod render;

/// hallucination-guard - claim-level hallucination detection
#[derive(Parser, Debug)]
#[command(name = "hallucination-guard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Knowledge base file (JSON or YAML) used instead of Wikipedia
    #[arg(long, global = true, value_name = "FILE")]
    pub knowledge: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a text passed on the command line
    Check {
        /// Text to analyse
        text: String,
    },

    /// Check the contents of a file
    File {
        /// File to analyse
        path: PathBuf,
    },

    /// Check every text in a JSON batch file
    Batch {
        /// JSON array of strings or {"text": ...} objects
        path: PathBuf,
    },

    /// Show resolved configuration
    Config,
}

/// One batch input item
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BatchItem {
    Text(String),
    Object { text: String },
}

impl BatchItem {
    pub fn text(&self) -> &str {
        match self {
            BatchItem::Text(text) | BatchItem::Object { text } => text,
        }
    }
}

/// Result for one batch item
#[derive(Debug, Serialize)]
pub struct BatchEntry {
    pub index: usize,
    pub input_sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DetectionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Output of the batch command
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub results: Vec<BatchEntry>,
    pub total: usize,
    pub processing_time_ms: u64,
    pub metrics: MetricsSnapshot,
}

/// SHA-256 fingerprint of an input text
pub fn input_fingerprint(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Parse a batch file body
pub fn parse_batch(content: &str) -> Result<Vec<BatchItem>> {
    serde_json::from_str(content)
        .context("Batch file must be a JSON array of strings or {\"text\": ...} objects")
}

impl Cli {
    /// Log filter used when RUST_LOG is not set
    pub fn log_level(&self) -> String {
        if self.verbose {
            return "debug".to_string();
        }
        config::config()
            .map(|c| c.log_level.clone())
            .unwrap_or_else(|_| "warn".to_string())
    }

    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match &self.command {
            Commands::Check { text } => {
                let detector = self.detector()?;
                let mut metrics = DetectionMetrics::new();
                check_text(&detector, text, self.json, &mut metrics).await
            }
            Commands::File { path } => {
                let detector = self.detector()?;
                let text = read_input_file(&detector, path)?;
                let mut metrics = DetectionMetrics::new();
                check_text(&detector, &text, self.json, &mut metrics).await
            }
            Commands::Batch { path } => {
                let detector = self.detector()?;
                let mut metrics = DetectionMetrics::new();
                run_batch(&detector, path, self.json, &mut metrics).await
            }
            Commands::Config => show_config(self.knowledge.as_deref(), self.json),
        }
    }

    fn resolved_config(&self) -> Result<Config> {
        let mut cfg = config::config()?.clone();
        if let Some(path) = &self.knowledge {
            cfg.knowledge_file = Some(path.clone());
        }
        Ok(cfg)
    }

    fn detector(&self) -> Result<Detector> {
        Detector::from_config(&self.resolved_config()?)
    }
}

/// Read a file for analysis, refusing denylisted paths and empty files
fn read_input_file(detector: &Detector, path: &Path) -> Result<String> {
    detector.limits().validate_path(path)?;

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    if text.trim().is_empty() {
        anyhow::bail!("Input file is empty: {}", path.display());
    }
    Ok(text)
}

async fn check_text(
    detector: &Detector,
    text: &str,
    json: bool,
    metrics: &mut DetectionMetrics,
) -> Result<()> {
    let started = Instant::now();
    let result = detector.detect(text).await?;
    metrics.record_detection(&result, started.elapsed());

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let color = std::io::stdout().is_terminal();
        println!("{}", render::render_result(text, &result, color));
    }
    Ok(())
}

async fn run_batch(
    detector: &Detector,
    path: &Path,
    json: bool,
    metrics: &mut DetectionMetrics,
) -> Result<()> {
    detector.limits().validate_path(path)?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
    let items = parse_batch(&content)?;

    let started = Instant::now();
    metrics.record_batch();
    info!(items = items.len(), "Starting batch");

    let mut results = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let text = item.text();
        let item_started = Instant::now();
        let entry = match detector.detect(text).await {
            Ok(result) => {
                metrics.record_detection(&result, item_started.elapsed());
                BatchEntry {
                    index,
                    input_sha256: input_fingerprint(text),
                    result: Some(result),
                    error: None,
                }
            }
            Err(e) => {
                warn!(index, error = %e, "Batch item failed");
                BatchEntry {
                    index,
                    input_sha256: input_fingerprint(text),
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        };
        results.push(entry);
    }

    let report = BatchReport {
        total: results.len(),
        results,
        processing_time_ms: started.elapsed().as_millis() as u64,
        metrics: metrics.snapshot(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{:<6} {:<18} {:<8} {:<10} {:<8}", "ITEM", "SHA256", "RISK", "LEVEL", "CLAIMS");
    println!("{}", "-".repeat(56));
    for entry in &report.results {
        match &entry.result {
            Some(result) => println!(
                "{:<6} {:<18} {:<8} {:<10} {:<8}",
                entry.index,
                &entry.input_sha256[..16],
                format!("{:.0}%", result.hallucination_risk * 100.0),
                result.risk_level().label(),
                format!("{}/{}", result.unsupported_claims, result.total_claims)
            ),
            None => println!(
                "{:<6} {:<18} error: {}",
                entry.index,
                &entry.input_sha256[..16],
                entry.error.as_deref().unwrap_or("unknown")
            ),
        }
    }
    println!();
    println!(
        "Total: {} item(s) in {} ms, {} hallucinated",
        report.total, report.processing_time_ms, report.metrics.hallucinations_detected
    );
    Ok(())
}

fn show_config(knowledge: Option<&Path>, json: bool) -> Result<()> {
    let mut cfg = config::config()?.clone();
    if let Some(path) = knowledge {
        cfg.knowledge_file = Some(path.to_path_buf());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    println!("hallucination-guard configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Detection:");
    println!("  Support threshold:  {}", cfg.support_threshold);
    println!("  Evidence max chars: {}", cfg.evidence_max_chars);
    println!("  Max concurrency:    {}", cfg.max_concurrency);
    println!();
    println!("Evidence:");
    match &cfg.knowledge_file {
        Some(path) => println!("  Knowledge base: {}", path.display()),
        None => println!("  Wikipedia ({})", cfg.wiki_language),
    }
    println!();
    println!("Similarity: {:?}", cfg.similarity);
    println!("  Embedding endpoint: {}", cfg.embedding.endpoint);
    println!("  Embedding model:    {}", cfg.embedding.model);
    println!();
    println!("Safety limits:");
    println!("  Max input size:      {} bytes", cfg.safety.max_input_bytes);
    println!("  Max claims:          {}", cfg.safety.max_claims);
    println!("  Max queries / claim: {}", cfg.safety.max_queries_per_claim);
    println!("  Call timeout:        {}s", cfg.safety.call_timeout_seconds);
    println!();
    println!("Log level: {}", cfg.log_level);

    Ok(())
}
