//! Safety limits and call budget for detection runs.
//!
//! Bounds the work a single `detect` call can trigger:
//! - Input size
//! - Number of claims verified
//! - Queries per claim and time per collaborator call
//! - Denylist patterns (to avoid reading secrets from disk)

use std::path::Path;
use std::time::Duration;

use glob::Pattern;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Safety limits for a detection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyLimits {
    /// Maximum input size in bytes (default: 1MB)
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: u64,

    /// Maximum number of claims verified per run (default: 200)
    #[serde(default = "default_max_claims")]
    pub max_claims: usize,

    /// Maximum evidence queries issued per claim (default: 8)
    #[serde(default = "default_max_queries_per_claim")]
    pub max_queries_per_claim: usize,

    /// Timeout for each collaborator call in seconds (default: 10)
    #[serde(default = "default_call_timeout")]
    pub call_timeout_seconds: u64,

    /// Glob patterns to reject (files matching these won't be read)
    #[serde(default = "default_denylist")]
    pub denylist_patterns: Vec<String>,
}

fn default_max_input_bytes() -> u64 {
    1_048_576
} // 1MB
fn default_max_claims() -> usize {
    200
}
fn default_max_queries_per_claim() -> usize {
    8
}
fn default_call_timeout() -> u64 {
    10
}

fn default_denylist() -> Vec<String> {
    vec![
        "**/.env*".to_string(),
        "**/secrets*".to_string(),
        "**/*credential*".to_string(),
        "**/*.pem".to_string(),
        "**/*.key".to_string(),
    ]
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: default_max_input_bytes(),
            max_claims: default_max_claims(),
            max_queries_per_claim: default_max_queries_per_claim(),
            call_timeout_seconds: default_call_timeout(),
            denylist_patterns: default_denylist(),
        }
    }
}

impl SafetyLimits {
    /// Check if an input path matches any denylist pattern
    pub fn is_denylisted(&self, path: &str) -> bool {
        self.denylist_patterns
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .any(|pattern| pattern.matches(path))
    }

    /// Validate input against size limits and denylist
    pub fn validate_input(
        &self,
        input: &str,
        source_path: Option<&Path>,
    ) -> Result<(), SafetyViolation> {
        let size = input.len() as u64;
        if size > self.max_input_bytes {
            return Err(SafetyViolation::MaxInputBytes {
                actual: size,
                limit: self.max_input_bytes,
            });
        }

        if let Some(path) = source_path {
            self.validate_path(path)?;
        }

        Ok(())
    }

    /// Reject denylisted paths before reading them
    pub fn validate_path(&self, path: &Path) -> Result<(), SafetyViolation> {
        let path_str = path.to_string_lossy();
        if self.is_denylisted(&path_str) {
            return Err(SafetyViolation::DenylistMatch {
                path: path_str.to_string(),
            });
        }
        Ok(())
    }

    /// Check the claim count before verification starts
    pub fn check_claims(&self, claims: usize) -> Result<(), SafetyViolation> {
        if claims > self.max_claims {
            return Err(SafetyViolation::MaxClaims {
                actual: claims,
                limit: self.max_claims,
            });
        }
        Ok(())
    }

    /// Per-call timeout for collaborators
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds)
    }
}

/// Safety violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SafetyViolation {
    #[error("Maximum input bytes exceeded: {actual} > {limit}")]
    MaxInputBytes { actual: u64, limit: u64 },

    #[error("Maximum claims exceeded: {actual} > {limit}")]
    MaxClaims { actual: usize, limit: usize },

    #[error("Path matches denylist pattern: {path}")]
    DenylistMatch { path: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = SafetyLimits::default();
        assert_eq!(limits.max_input_bytes, 1_048_576);
        assert_eq!(limits.max_claims, 200);
        assert_eq!(limits.max_queries_per_claim, 8);
        assert_eq!(limits.call_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_denylist_matching() {
        let limits = SafetyLimits::default();

        assert!(limits.is_denylisted(".env"));
        assert!(limits.is_denylisted("config/secrets.json"));
        assert!(limits.is_denylisted("certs/server.pem"));

        assert!(!limits.is_denylisted("answer.txt"));
        assert!(!limits.is_denylisted("batch.json"));
    }

    #[test]
    fn test_input_validation() {
        let limits = SafetyLimits {
            max_input_bytes: 100,
            ..Default::default()
        };

        assert!(limits.validate_input("short", None).is_ok());

        let long_input = "x".repeat(200);
        let result = limits.validate_input(&long_input, None);
        assert!(matches!(result, Err(SafetyViolation::MaxInputBytes { .. })));
    }

    #[test]
    fn test_claim_budget() {
        let limits = SafetyLimits {
            max_claims: 2,
            ..Default::default()
        };

        assert!(limits.check_claims(2).is_ok());
        assert_eq!(
            limits.check_claims(3),
            Err(SafetyViolation::MaxClaims { actual: 3, limit: 2 })
        );
    }

    #[test]
    fn test_limits_from_yaml_use_defaults() {
        let limits: SafetyLimits = serde_yaml::from_str("max_claims: 10\n").unwrap();
        assert_eq!(limits.max_claims, 10);
        assert_eq!(limits.max_queries_per_claim, 8);
        assert_eq!(limits.denylist_patterns.len(), 5);
    }
}
