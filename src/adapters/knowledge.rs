//! In-memory knowledge base.
//!
//! Maps titles to passages. Loaded from a JSON or YAML file of the form
//! `{ "Eiffel Tower": "The Eiffel Tower is ..." }`. Title matching is
//! case-insensitive and ignores surrounding whitespace and punctuation.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{normalize_title, EvidenceSource};
use crate::domain::truncate_chars;

/// Offline evidence source
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: HashMap<String, String>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a passage
    pub fn insert(&mut self, title: &str, passage: impl Into<String>) {
        self.entries.insert(Self::key(title), passage.into());
    }

    /// Builder-style insert
    pub fn with_entry(mut self, title: &str, passage: impl Into<String>) -> Self {
        self.insert(title, passage);
        self
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read knowledge file: {}", path.display()))?;

        let raw: HashMap<String, String> = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse knowledge file: {}", path.display()))?,
            _ => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse knowledge file: {}", path.display()))?,
        };

        let mut kb = Self::new();
        for (title, passage) in raw {
            kb.insert(&title, passage);
        }
        Ok(kb)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn key(title: &str) -> String {
        normalize_title(title).to_lowercase()
    }
}

#[async_trait]
impl EvidenceSource for KnowledgeBase {
    fn name(&self) -> &str {
        "Knowledge base"
    }

    async fn lookup(&self, query: &str, max_chars: usize) -> Result<Option<String>> {
        Ok(self
            .entries
            .get(&Self::key(query))
            .map(|passage| truncate_chars(passage, max_chars)))
    }
}
