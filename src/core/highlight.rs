//! Marking unsupported claims in the original text.
//!
//! Only unsupported claims with a known span are marked. Overlapping
//! spans are merged first, so every marker pair wraps a disjoint
//! range. Markers are inserted from the end of the text backwards, which
//! keeps the byte offsets of spans not yet processed valid.

use tracing::warn;

use crate::domain::{HighlightRange, RiskReport};

pub const FLAG_OPEN: &str = "⚠[";
pub const FLAG_CLOSE: &str = "]⚠";

/// Style applied to flagged ranges by rich renderers
pub const FLAG_STYLE: &str = "bold red";

/// Disjoint flagged spans in ascending order
fn flagged_spans(text: &str, report: &RiskReport<'_>) -> Vec<(usize, usize)> {
    let mut spans: Vec<(usize, usize)> = Vec::new();

    for result in report.details.iter().filter(|r| !r.is_supported) {
        let span = result.claim.source_span;
        if !span.is_positioned() {
            continue;
        }
        if span.start >= span.end
            || span.end > text.len()
            || !text.is_char_boundary(span.start)
            || !text.is_char_boundary(span.end)
        {
            warn!(
                start = span.start,
                end = span.end,
                len = text.len(),
                "Skipping claim span that does not fit the text"
            );
            continue;
        }
        spans.push((span.start, span.end));
    }

    spans.sort_unstable();

    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start < last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Wrap every unsupported claim in `⚠[` … `]⚠`.
///
/// Returns the text unchanged when nothing qualifies.
pub fn highlight_plain(text: &str, report: &RiskReport<'_>) -> String {
    let spans = flagged_spans(text, report);
    let mut highlighted = text.to_string();

    for &(start, end) in spans.iter().rev() {
        highlighted.insert_str(end, FLAG_CLOSE);
        highlighted.insert_str(start, FLAG_OPEN);
    }
    highlighted
}

/// Styled ranges for rich output, ascending by start
pub fn highlight_ranges(text: &str, report: &RiskReport<'_>) -> Vec<HighlightRange> {
    flagged_spans(text, report)
        .into_iter()
        .map(|(start, end)| HighlightRange {
            start,
            end,
            style: FLAG_STYLE.to_string(),
        })
        .collect()
}
