//! Configuration for hallucination-guard.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (HALLUCINATION_GUARD_*)
//! 2. Config file (.hallucination-guard/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .hallucination-guard/config.yaml
//! - Falls back to ~/.hallucination-guard/config.yaml
//! - Relative paths in the file resolve against the directory holding
//!   .hallucination-guard/

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{RetryPolicy, SafetyLimits, VerifierSettings};
use crate::domain::SUPPORT_THRESHOLD;

const CONFIG_DIR: &str = ".hallucination-guard";
const CONFIG_FILE: &str = "config.yaml";
const ENV_PREFIX: &str = "HALLUCINATION_GUARD_";

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<Config, String>> = OnceLock::new();

/// Which similarity model scores evidence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityBackend {
    #[default]
    Lexical,
    Embedding,
}

impl FromStr for SimilarityBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lexical" => Ok(Self::Lexical),
            "embedding" => Ok(Self::Embedding),
            other => anyhow::bail!("Unknown similarity backend '{}' (expected lexical or embedding)", other),
        }
    }
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub detection: DetectionSection,
    #[serde(default)]
    pub wikipedia: WikipediaSection,
    #[serde(default)]
    pub similarity: SimilaritySection,
    /// Offline knowledge base used instead of Wikipedia
    #[serde(default)]
    pub knowledge_file: Option<String>,
    #[serde(default)]
    pub safety: Option<SafetyLimits>,
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectionSection {
    pub support_threshold: Option<f64>,
    pub evidence_max_chars: Option<usize>,
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WikipediaSection {
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimilaritySection {
    pub backend: Option<SimilarityBackend>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSection {
    pub level: Option<String>,
}

/// Embeddings endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingSettings {
    pub endpoint: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/v1/embeddings".to_string(),
            model: "all-MiniLM-L6-v2".to_string(),
            api_key: None,
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub support_threshold: f64,
    pub wiki_language: String,
    pub evidence_max_chars: usize,
    pub max_concurrency: usize,
    pub similarity: SimilarityBackend,
    pub embedding: EmbeddingSettings,
    pub knowledge_file: Option<PathBuf>,
    pub log_level: String,
    pub safety: SafetyLimits,
    pub retry: RetryPolicy,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            support_threshold: SUPPORT_THRESHOLD,
            wiki_language: "en".to_string(),
            evidence_max_chars: 2000,
            max_concurrency: 8,
            similarity: SimilarityBackend::Lexical,
            embedding: EmbeddingSettings::default(),
            knowledge_file: None,
            log_level: "warn".to_string(),
            safety: SafetyLimits::default(),
            retry: RetryPolicy::default(),
            config_file: None,
        }
    }
}

impl Config {
    /// Verifier tuning derived from this configuration
    pub fn verifier_settings(&self) -> VerifierSettings {
        VerifierSettings {
            support_threshold: self.support_threshold,
            evidence_max_chars: self.evidence_max_chars,
            max_concurrency: self.max_concurrency,
            max_queries_per_claim: self.safety.max_queries_per_claim,
            call_timeout: self.safety.call_timeout(),
            retry: self.retry.clone(),
        }
    }

    /// Merge a parsed config file and environment lookups over the defaults.
    ///
    /// `file` is the config path with its parsed contents; `env` maps a
    /// variable suffix (e.g. `WIKI_LANG`) to its value.
    pub fn resolve<F>(file: Option<(PathBuf, ConfigFile)>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some((path, raw)) = file {
            // Base directory is the parent of .hallucination-guard/
            let base_dir = path
                .parent()
                .and_then(|p| p.parent())
                .unwrap_or(Path::new("."))
                .to_path_buf();

            let detection = raw.detection;
            if let Some(threshold) = detection.support_threshold {
                config.support_threshold = threshold;
            }
            if let Some(max_chars) = detection.evidence_max_chars {
                config.evidence_max_chars = max_chars;
            }
            if let Some(concurrency) = detection.max_concurrency {
                config.max_concurrency = concurrency;
            }
            if let Some(language) = raw.wikipedia.language {
                config.wiki_language = language;
            }
            if let Some(backend) = raw.similarity.backend {
                config.similarity = backend;
            }
            if let Some(endpoint) = raw.similarity.endpoint {
                config.embedding.endpoint = endpoint;
            }
            if let Some(model) = raw.similarity.model {
                config.embedding.model = model;
            }
            config.embedding.api_key = raw.similarity.api_key;
            config.knowledge_file = raw
                .knowledge_file
                .map(|p| resolve_path(&base_dir, &p));
            if let Some(safety) = raw.safety {
                config.safety = safety;
            }
            if let Some(retry) = raw.retry {
                config.retry = retry;
            }
            if let Some(level) = raw.logging.level {
                config.log_level = level;
            }
            config.config_file = Some(path);
        }

        if let Some(value) = env("SUPPORT_THRESHOLD") {
            config.support_threshold = value.trim().parse().with_context(|| {
                format!("Invalid {}SUPPORT_THRESHOLD: {}", ENV_PREFIX, value)
            })?;
        }
        if let Some(value) = env("WIKI_LANG") {
            config.wiki_language = value;
        }
        if let Some(value) = env("LOG_LEVEL") {
            config.log_level = value;
        }
        if let Some(value) = env("SIMILARITY") {
            config.similarity = value.parse()?;
        }
        if let Some(value) = env("EMBEDDING_ENDPOINT") {
            config.embedding.endpoint = value;
        }
        if let Some(value) = env("EMBEDDING_MODEL") {
            config.embedding.model = value;
        }
        if let Some(value) = env("EMBEDDING_API_KEY") {
            config.embedding.api_key = Some(value);
        }
        if let Some(value) = env("KNOWLEDGE_FILE") {
            config.knowledge_file = Some(PathBuf::from(value));
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.support_threshold) {
            anyhow::bail!(
                "Support threshold must be between 0 and 1, got {}",
                self.support_threshold
            );
        }
        if self.wiki_language.trim().is_empty() {
            anyhow::bail!("Wikipedia language must not be empty");
        }
        if self.max_concurrency == 0 {
            anyhow::bail!("max_concurrency must be at least 1");
        }
        Ok(())
    }
}

/// Find config file by searching current directory and parents, then home
fn find_config_file() -> Option<PathBuf> {
    if let Ok(mut current) = std::env::current_dir() {
        loop {
            let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }
    }

    let home_config = dirs::home_dir()?.join(CONFIG_DIR).join(CONFIG_FILE);
    home_config.exists().then_some(home_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Load configuration from all sources
fn load_config() -> Result<Config> {
    let file = match find_config_file() {
        Some(path) => {
            let raw = load_config_file(&path)?;
            Some((path, raw))
        }
        None => None,
    };

    Config::resolve(file, |key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static Config> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<Config> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn write_config(temp: &TempDir, body: &str) -> PathBuf {
        let dir = temp.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", body).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let config = Config::resolve(None, no_env).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.support_threshold, 0.45);
        assert_eq!(config.wiki_language, "en");
        assert_eq!(config.evidence_max_chars, 2000);
        assert_eq!(config.similarity, SimilarityBackend::Lexical);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"
version: "1"
detection:
  support_threshold: 0.5
  max_concurrency: 4
wikipedia:
  language: de
similarity:
  backend: embedding
  model: bge-small
knowledge_file: kb/facts.yaml
safety:
  max_claims: 10
logging:
  level: info
"#,
        );

        let raw = load_config_file(&path).unwrap();
        let config = Config::resolve(Some((path.clone(), raw)), no_env).unwrap();

        assert_eq!(config.support_threshold, 0.5);
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.wiki_language, "de");
        assert_eq!(config.similarity, SimilarityBackend::Embedding);
        assert_eq!(config.embedding.model, "bge-small");
        assert_eq!(config.safety.max_claims, 10);
        // Unset safety fields keep their defaults
        assert_eq!(config.safety.max_queries_per_claim, 8);
        assert_eq!(config.log_level, "info");
        assert_eq!(
            config.knowledge_file,
            Some(temp.path().join("kb/facts.yaml"))
        );
        assert_eq!(config.config_file, Some(path));
    }

    #[test]
    fn test_env_overrides_file() {
        let raw = ConfigFile {
            wikipedia: WikipediaSection {
                language: Some("de".to_string()),
            },
            ..Default::default()
        };
        let env = env_from(&[
            ("WIKI_LANG", "fr"),
            ("SUPPORT_THRESHOLD", "0.6"),
            ("SIMILARITY", "Embedding"),
            ("EMBEDDING_API_KEY", "sk-test"),
        ]);
        let config =
            Config::resolve(Some((PathBuf::from("/p/.hallucination-guard/config.yaml"), raw)), env)
                .unwrap();

        assert_eq!(config.wiki_language, "fr");
        assert_eq!(config.support_threshold, 0.6);
        assert_eq!(config.similarity, SimilarityBackend::Embedding);
        assert_eq!(config.embedding.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::resolve(None, env_from(&[("SUPPORT_THRESHOLD", "high")])).is_err());
        assert!(Config::resolve(None, env_from(&[("SUPPORT_THRESHOLD", "1.5")])).is_err());
        assert!(Config::resolve(None, env_from(&[("SIMILARITY", "neural")])).is_err());
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = Config::default();
        config.embedding.api_key = Some("sk-live-1234".to_string());
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("sk-live-1234"));
    }

    #[test]
    fn test_verifier_settings_follow_limits() {
        let mut config = Config::default();
        config.safety.max_queries_per_claim = 3;
        config.safety.call_timeout_seconds = 2;
        let settings = config.verifier_settings();
        assert_eq!(settings.max_queries_per_claim, 3);
        assert_eq!(settings.call_timeout, std::time::Duration::from_secs(2));
        assert_eq!(settings.support_threshold, 0.45);
    }
}
