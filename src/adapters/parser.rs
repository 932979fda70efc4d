//! Rule-based sentence parser.
//!
//! Offline stand-in for a statistical NLP model. Sentences come from Unicode
//! sentence boundaries; entities are runs of capitalised words and numbers;
//! dependency roles are assigned around the first recognisable verb.
//!
//! All offsets are UTF-8 byte offsets into the full input text.

use anyhow::Result;
use unicode_segmentation::UnicodeSegmentation;

use super::{EntitySpan, ParsedSentence, SentenceParser, Token};

/// Verbs recognised as a sentence root
const VERBS: &[&str] = &[
    "is", "was", "are", "were", "be", "been", "has", "had", "have", "founded", "invented",
    "discovered", "created", "published", "born", "died", "located", "contains", "produces",
    "consists", "became", "established", "developed", "introduced", "launched", "released",
    "built", "designed", "won", "received", "achieved", "holds", "measures", "weighs", "costs",
    "earned", "scored", "ranked", "reached", "surpassed", "exceeded", "composed", "flows",
    "empties", "borders", "spans", "covers", "wrote", "lies", "runs", "orbits",
];

/// Copulas and auxiliaries that may precede a participle
const AUXILIARIES: &[&str] = &["is", "was", "are", "were", "be", "been", "has", "had", "have"];

const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "its", "his", "her", "their", "our",
];

const PREPOSITIONS: &[&str] = &[
    "in", "on", "at", "by", "of", "from", "to", "with", "into", "near", "for", "about", "over",
    "under", "between", "during", "since", "after", "before",
];

/// Words that never start an entity run at sentence start
const SENTENCE_OPENERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "there", "it", "he", "she", "they", "we",
    "i", "in", "on", "at", "after", "before", "during", "when", "while", "however",
];

/// A whitespace-delimited word with punctuation stripped
#[derive(Debug, Clone)]
struct Word<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

/// Heuristic parser with no model files
#[derive(Debug, Clone, Default)]
pub struct HeuristicParser;

impl HeuristicParser {
    pub fn new() -> Self {
        Self
    }
}

impl SentenceParser for HeuristicParser {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn segment(&self, text: &str) -> Result<Vec<ParsedSentence>> {
        let mut sentences = Vec::new();

        for (offset, raw) in text.split_sentence_bound_indices() {
            let body = raw.trim();
            if body.is_empty() {
                continue;
            }

            let start = offset + (raw.len() - raw.trim_start().len());
            let end = start + body.len();
            let words = split_words(body, start);

            sentences.push(ParsedSentence {
                text: body.to_string(),
                start,
                end,
                entities: find_entities(&words),
                tokens: tag_roles(&words),
            });
        }

        Ok(sentences)
    }
}

/// Split a sentence into words, keeping absolute offsets
fn split_words(sentence: &str, base: usize) -> Vec<Word<'_>> {
    let mut words = Vec::new();
    let mut cursor = 0;

    for piece in sentence.split_whitespace() {
        let Some(found) = sentence[cursor..].find(piece) else {
            continue;
        };
        let piece_start = cursor + found;
        cursor = piece_start + piece.len();

        let cleaned = piece.trim_matches(|c: char| !c.is_alphanumeric());
        if cleaned.is_empty() {
            continue;
        }
        let lead = piece.len() - piece.trim_start_matches(|c: char| !c.is_alphanumeric()).len();
        let start = base + piece_start + lead;

        words.push(Word {
            text: cleaned,
            start,
            end: start + cleaned.len(),
        });
    }

    words
}

fn is_capitalised(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

fn is_number(word: &str) -> bool {
    word.chars().any(|c| c.is_ascii_digit())
        && word.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
}

fn in_list(list: &[&str], word: &str) -> bool {
    list.contains(&word.to_lowercase().as_str())
}

/// Capitalised runs and numbers become entities
fn find_entities(words: &[Word<'_>]) -> Vec<EntitySpan> {
    let mut entities = Vec::new();
    let mut i = 0;

    while i < words.len() {
        let word = &words[i];

        if is_number(word.text) {
            let label = match word.text.parse::<u32>() {
                Ok(year) if (1000..=2100).contains(&year) => "DATE",
                _ => "CARDINAL",
            };
            entities.push(EntitySpan {
                text: word.text.to_string(),
                label: label.to_string(),
                start: word.start,
                end: word.end,
            });
            i += 1;
            continue;
        }

        let opens_run = is_capitalised(word.text)
            && (i > 0
                || (!in_list(SENTENCE_OPENERS, word.text)
                    && words.get(1).is_some_and(|next| is_capitalised(next.text))));

        if !opens_run {
            i += 1;
            continue;
        }

        let first = i;
        while i + 1 < words.len() && is_capitalised(words[i + 1].text) {
            i += 1;
        }
        let (start, end) = (words[first].start, words[i].end);
        let text = words[first..=i]
            .iter()
            .map(|w| w.text)
            .collect::<Vec<_>>()
            .join(" ");

        entities.push(EntitySpan {
            text,
            label: "PROPN".to_string(),
            start,
            end,
        });
        i += 1;
    }

    entities
}

/// Assign shallow dependency labels around the root verb
fn tag_roles(words: &[Word<'_>]) -> Vec<Token> {
    let mut deps: Vec<&str> = words
        .iter()
        .map(|w| {
            if in_list(DETERMINERS, w.text) {
                "det"
            } else if in_list(PREPOSITIONS, w.text) {
                "prep"
            } else {
                "dep"
            }
        })
        .collect();

    let Some(mut root) = find_root(words) else {
        return build_tokens(words, &deps, None);
    };

    // "was founded", "is located": the participle is the root
    let mut passive = false;
    if in_list(AUXILIARIES, words[root].text) {
        if let Some(next) = words.get(root + 1) {
            let lower = next.text.to_lowercase();
            if in_list(VERBS, &lower) && (lower.ends_with("ed") || lower == "born") {
                deps[root] = "auxpass";
                root += 1;
                passive = true;
            }
        }
    }
    deps[root] = "ROOT";

    let subject = (0..root)
        .rev()
        .find(|&i| deps[i] == "dep" && !in_list(AUXILIARIES, words[i].text));
    if let Some(i) = subject {
        deps[i] = if passive { "nsubjpass" } else { "nsubj" };
    }

    let copular = lemmatize(words[root].text) == "be";
    let object = (root + 1..words.len()).find(|&i| deps[i] == "dep");
    if let Some(i) = object {
        deps[i] = if i > 0 && deps[i - 1] == "prep" {
            "pobj"
        } else if copular {
            "attr"
        } else {
            "dobj"
        };
    }

    build_tokens(words, &deps, Some(root))
}

fn find_root(words: &[Word<'_>]) -> Option<usize> {
    words
        .iter()
        .position(|w| in_list(VERBS, w.text))
        .or_else(|| {
            words
                .iter()
                .enumerate()
                .skip(1)
                .find(|(_, w)| w.text.len() > 3 && w.text.to_lowercase().ends_with("ed"))
                .map(|(i, _)| i)
        })
}

fn build_tokens(words: &[Word<'_>], deps: &[&str], root: Option<usize>) -> Vec<Token> {
    words
        .iter()
        .zip(deps)
        .enumerate()
        .map(|(i, (word, dep))| {
            let lemma = if Some(i) == root {
                lemmatize(word.text)
            } else {
                word.text.to_lowercase()
            };
            Token::new(word.text, *dep, lemma)
        })
        .collect()
}

/// Crude English verb lemmatiser
fn lemmatize(word: &str) -> String {
    let lower = word.to_lowercase();
    let irregular = match lower.as_str() {
        "is" | "was" | "are" | "were" | "been" | "am" | "be" => Some("be"),
        "has" | "had" | "have" => Some("have"),
        "born" => Some("bear"),
        "died" => Some("die"),
        "won" => Some("win"),
        "built" => Some("build"),
        "became" => Some("become"),
        "wrote" => Some("write"),
        "lies" => Some("lie"),
        _ => None,
    };
    if let Some(lemma) = irregular {
        return lemma.to_string();
    }

    if let Some(stem) = lower.strip_suffix("ied") {
        return format!("{stem}y");
    }
    if let Some(stem) = lower.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if let Some(stem) = lower.strip_suffix("ed") {
        let needs_e = ["at", "iz", "uc", "ur", "iv", "ev", "os", "as", "or"]
            .iter()
            .any(|suffix| stem.ends_with(suffix));
        return if needs_e {
            format!("{stem}e")
        } else {
            stem.to_string()
        };
    }
    if lower.len() > 3 && lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("us")
    {
        return lower[..lower.len() - 1].to_string();
    }

    lower
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep_of<'a>(sentence: &'a ParsedSentence, dep: &str) -> Option<&'a str> {
        sentence
            .tokens
            .iter()
            .find(|t| t.dep == dep)
            .map(|t| t.text.as_str())
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let parser = HeuristicParser::new();
        assert!(parser.segment("").unwrap().is_empty());
        assert!(parser.segment("   \n\t ").unwrap().is_empty());
    }

    #[test]
    fn test_sentence_spans_are_trimmed() {
        let text = "Paris is in France.  Berlin is in Germany.";
        let sentences = HeuristicParser::new().segment(text).unwrap();

        assert_eq!(sentences.len(), 2);
        for sentence in &sentences {
            assert_eq!(&text[sentence.start..sentence.end], sentence.text);
        }
        assert_eq!(sentences[0].text, "Paris is in France.");
        assert_eq!(sentences[1].text, "Berlin is in Germany.");
    }

    #[test]
    fn test_entities_from_capitalised_runs_and_years() {
        let text = "Apple was founded by Steve Jobs in 1976.";
        let sentence = &HeuristicParser::new().segment(text).unwrap()[0];
        let names: Vec<&str> = sentence.entities.iter().map(|e| e.text.as_str()).collect();

        assert!(names.contains(&"Steve Jobs"));
        assert!(names.contains(&"1976"));
        let year = sentence.entities.iter().find(|e| e.text == "1976").unwrap();
        assert_eq!(year.label, "DATE");
        assert_eq!(&text[year.start..year.end], "1976");
    }

    #[test]
    fn test_passive_roles() {
        let text = "The Eiffel Tower is located in Paris.";
        let sentence = &HeuristicParser::new().segment(text).unwrap()[0];

        assert_eq!(dep_of(sentence, "nsubjpass"), Some("Tower"));
        assert_eq!(dep_of(sentence, "ROOT"), Some("located"));
        assert_eq!(dep_of(sentence, "pobj"), Some("Paris"));

        let root = sentence.tokens.iter().find(|t| t.dep == "ROOT").unwrap();
        assert_eq!(root.lemma, "locate");
    }

    #[test]
    fn test_copular_attribute() {
        let sentence = &HeuristicParser::new()
            .segment("Mercury is the smallest planet.")
            .unwrap()[0];

        assert_eq!(dep_of(sentence, "nsubj"), Some("Mercury"));
        assert_eq!(dep_of(sentence, "attr"), Some("smallest"));
    }

    #[test]
    fn test_no_verb_leaves_roles_unset() {
        let sentence = &HeuristicParser::new().segment("Hello there, friend!").unwrap()[0];
        assert!(sentence.tokens.iter().all(|t| t.dep != "ROOT"));
        assert!(sentence.entities.is_empty());
    }

    #[test]
    fn test_lemmatize() {
        assert_eq!(lemmatize("founded"), "found");
        assert_eq!(lemmatize("created"), "create");
        assert_eq!(lemmatize("produces"), "produce");
        assert_eq!(lemmatize("empties"), "empty");
        assert_eq!(lemmatize("was"), "be");
        assert_eq!(lemmatize("surpassed"), "surpass");
    }
}
