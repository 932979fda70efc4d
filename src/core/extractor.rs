//! Claim extraction.
//!
//! Turns raw text into one claim per qualifying sentence. A sentence
//! qualifies when it contains a factual-indicator word or a named entity;
//! everything else is dropped (precision over recall).

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::adapters::{ParsedSentence, SentenceParser, Token};
use crate::domain::Claim;

/// Copulas plus creation, possession, measurement and event verbs
pub const FACTUAL_INDICATORS: &[&str] = &[
    "is", "was", "are", "were", "has", "had", "founded", "invented", "discovered", "created",
    "published", "born", "died", "located", "contains", "produces", "consists", "became",
    "established", "developed", "introduced", "launched", "released", "built", "designed", "won",
    "received", "achieved", "holds", "measures", "weighs", "costs", "earned", "scored", "ranked",
    "reached", "surpassed", "exceeded", "composed", "flows", "empties", "borders", "spans",
    "covers",
];

/// Whether any whitespace token is a factual indicator (case-insensitive)
pub fn looks_factual(sentence: &str) -> bool {
    sentence
        .split_whitespace()
        .any(|token| FACTUAL_INDICATORS.contains(&token.to_lowercase().as_str()))
}

/// Shallow subject / predicate / object roles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roles {
    pub subject: Option<String>,
    pub predicate: Option<String>,
    pub object: Option<String>,
}

/// First `*subj*` token, root lemma, first `*obj*`/`attr` token
pub fn extract_roles(tokens: &[Token]) -> Roles {
    let mut roles = Roles::default();

    for token in tokens {
        if roles.subject.is_none() && token.dep.contains("subj") {
            roles.subject = Some(token.text.clone());
        }
        if roles.predicate.is_none() && token.dep == "ROOT" {
            roles.predicate = Some(token.lemma.clone());
        }
        if roles.object.is_none() && (token.dep.contains("obj") || token.dep.contains("attr")) {
            roles.object = Some(token.text.clone());
        }
    }

    roles
}

/// Extracts claims through a sentence parser
pub struct ClaimExtractor {
    parser: Arc<dyn SentenceParser>,
}

impl ClaimExtractor {
    pub fn new(parser: Arc<dyn SentenceParser>) -> Self {
        Self { parser }
    }

    /// Extract claims from `text`, in sentence order
    pub fn extract(&self, text: &str) -> Result<Vec<Claim>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let sentences = self
            .parser
            .segment(text)
            .with_context(|| format!("Parser '{}' failed to segment text", self.parser.name()))?;

        let claims: Vec<Claim> = sentences.iter().filter_map(claim_from_sentence).collect();

        info!(
            sentences = sentences.len(),
            claims = claims.len(),
            "Extracted claims from input text"
        );
        Ok(claims)
    }
}

fn claim_from_sentence(sentence: &ParsedSentence) -> Option<Claim> {
    let text = sentence.text.trim();
    if text.is_empty() {
        return None;
    }
    if !looks_factual(text) && sentence.entities.is_empty() {
        return None;
    }

    let roles = extract_roles(&sentence.tokens);
    let mut claim = Claim::new(text).with_span(sentence.start, sentence.end);
    claim.subject = roles.subject;
    claim.predicate = roles.predicate;
    claim.object = roles.object;

    if !sentence.entities.is_empty() {
        let names: Vec<&str> = sentence.entities.iter().map(|e| e.text.as_str()).collect();
        claim
            .metadata
            .insert("named_entities".to_string(), names.join(", "));
    }

    debug!(claim = %claim.text, "Extracted claim");
    Some(claim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{EntitySpan, HeuristicParser};

    struct FixedParser(Vec<ParsedSentence>);

    impl SentenceParser for FixedParser {
        fn name(&self) -> &str {
            "fixed"
        }

        fn segment(&self, _text: &str) -> Result<Vec<ParsedSentence>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenParser;

    impl SentenceParser for BrokenParser {
        fn name(&self) -> &str {
            "broken"
        }

        fn segment(&self, _text: &str) -> Result<Vec<ParsedSentence>> {
            anyhow::bail!("model not loaded")
        }
    }

    fn sentence(text: &str, start: usize, entities: Vec<EntitySpan>) -> ParsedSentence {
        ParsedSentence {
            text: text.to_string(),
            start,
            end: start + text.len(),
            entities,
            tokens: Vec::new(),
        }
    }

    #[test]
    fn test_looks_factual() {
        assert!(looks_factual("Paris IS the capital"));
        assert!(looks_factual("It was founded long ago"));
        assert!(!looks_factual("Hello there friend"));
        // Tokenised by whitespace only, so trailing punctuation hides the word
        assert!(!looks_factual("That's what it is."));
    }

    #[test]
    fn test_extract_roles_takes_first_matches() {
        let tokens = vec![
            Token::new("Tower", "nsubj", "tower"),
            Token::new("it", "nsubj", "it"),
            Token::new("stands", "ROOT", "stand"),
            Token::new("in", "prep", "in"),
            Token::new("Paris", "pobj", "paris"),
            Token::new("France", "pobj", "france"),
        ];
        let roles = extract_roles(&tokens);

        assert_eq!(roles.subject.as_deref(), Some("Tower"));
        assert_eq!(roles.predicate.as_deref(), Some("stand"));
        assert_eq!(roles.object.as_deref(), Some("Paris"));
    }

    #[test]
    fn test_extract_roles_missing_is_unset() {
        let roles = extract_roles(&[Token::new("Hello", "intj", "hello")]);
        assert_eq!(roles, Roles::default());
    }

    #[test]
    fn test_empty_input_is_empty() {
        let extractor = ClaimExtractor::new(Arc::new(BrokenParser));
        assert!(extractor.extract("").unwrap().is_empty());
        assert!(extractor.extract("  \n ").unwrap().is_empty());
    }

    #[test]
    fn test_parser_failure_propagates() {
        let extractor = ClaimExtractor::new(Arc::new(BrokenParser));
        assert!(extractor.extract("Paris is in France.").is_err());
    }

    #[test]
    fn test_qualifying_rules() {
        let entity = EntitySpan {
            text: "Rome".to_string(),
            label: "PROPN".to_string(),
            start: 40,
            end: 44,
        };
        let parser = FixedParser(vec![
            sentence("Paris is in France.", 0, vec![]),
            sentence("What a lovely day!", 20, vec![]),
            sentence("Rome, eternally.", 40, vec![entity]),
            sentence("   ", 57, vec![]),
        ]);
        let claims = ClaimExtractor::new(Arc::new(parser))
            .extract("placeholder")
            .unwrap();

        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0].text, "Paris is in France.");
        assert_eq!(claims[0].source_span.end, 19);
        assert_eq!(claims[1].text, "Rome, eternally.");
        assert_eq!(claims[1].metadata.get("named_entities").unwrap(), "Rome");
    }

    #[test]
    fn test_with_heuristic_parser() {
        let text = "The Eiffel Tower is located in Paris. What a view!";
        let extractor = ClaimExtractor::new(Arc::new(HeuristicParser::new()));
        let claims = extractor.extract(text).unwrap();

        assert_eq!(claims.len(), 1);
        let claim = &claims[0];
        assert_eq!(claim.subject.as_deref(), Some("Tower"));
        assert_eq!(claim.predicate.as_deref(), Some("locate"));
        assert_eq!(claim.object.as_deref(), Some("Paris"));
        let span = claim.source_span;
        assert_eq!(&text[span.start..span.end], claim.text);
    }
}
