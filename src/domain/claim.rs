//! Claims extracted from input text.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// UTF-8 byte offset range of a claim inside the original text.
///
/// `(0, 0)` is the "not positioned" sentinel. A real sentence at the start
/// of the text is `(0, n)` with `n > 0`, so the two never collide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub const UNSET: SourceSpan = SourceSpan { start: 0, end: 0 };

    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Whether this span points at a real location in the text
    pub fn is_positioned(&self) -> bool {
        *self != Self::UNSET
    }
}

impl From<(usize, usize)> for SourceSpan {
    fn from((start, end): (usize, usize)) -> Self {
        Self { start, end }
    }
}

/// A sentence-scoped factual assertion.
///
/// Created once by the extractor per qualifying sentence and never mutated
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Sentence text, trimmed
    pub text: String,

    /// Where the sentence sits in the original text
    pub source_span: SourceSpan,

    /// Shallow grammatical subject (first `*subj*` token)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Lemma of the root verb
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,

    /// First `*obj*` / `attr` token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Claim {
    /// Create an unpositioned claim with no roles
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Attach a source span
    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.source_span = SourceSpan::new(start, end);
        self
    }

    /// Attach a subject
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

impl std::fmt::Display for Claim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_span_sentinel() {
        assert!(!SourceSpan::UNSET.is_positioned());
        assert!(SourceSpan::new(0, 12).is_positioned());
        assert!(!Claim::new("Paris is in France.").source_span.is_positioned());
    }

    #[test]
    fn test_claim_serialization_skips_empty_roles() {
        let claim = Claim::new("Paris is in France.").with_span(0, 19);
        let json = serde_json::to_value(&claim).unwrap();

        assert_eq!(json["text"], "Paris is in France.");
        assert_eq!(json["source_span"]["end"], 19);
        assert!(json.get("subject").is_none());
        assert!(json.get("metadata").is_none());
    }
}
