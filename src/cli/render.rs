//! Human-readable rendering of detection results.

use crossterm::style::{StyledContent, Stylize};

use crate::domain::{DetectionResult, HighlightRange, RiskLevel, Severity};

fn level_style(level: RiskLevel, text: String) -> StyledContent<String> {
    match level {
        RiskLevel::Low => text.green().bold(),
        RiskLevel::Medium => text.yellow().bold(),
        RiskLevel::High => text.red().bold(),
    }
}

fn severity_style(severity: Severity, text: String) -> StyledContent<String> {
    match severity {
        Severity::Low => text.green(),
        Severity::Medium => text.yellow(),
        Severity::High => text.red(),
    }
}

/// Apply terminal styling to flagged ranges.
///
/// Ranges must be ascending and disjoint, as produced by `highlight_ranges`.
/// Ranges that do not fit the text are left unstyled.
pub fn styled_text(text: &str, ranges: &[HighlightRange], color: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for range in ranges {
        if range.start < cursor
            || range.end > text.len()
            || !text.is_char_boundary(range.start)
            || !text.is_char_boundary(range.end)
        {
            continue;
        }
        out.push_str(&text[cursor..range.start]);
        let flagged = &text[range.start..range.end];
        if color {
            out.push_str(&flagged.red().bold().to_string());
        } else {
            out.push_str(flagged);
        }
        cursor = range.end;
    }

    out.push_str(&text[cursor..]);
    out
}

/// Full terminal report for one input
pub fn render_result(text: &str, result: &DetectionResult, color: bool) -> String {
    let mut lines = Vec::new();
    let level = result.risk_level();

    let header = format!(
        "Hallucination risk: {:.0}% ({})",
        result.hallucination_risk * 100.0,
        level.label()
    );
    lines.push(if color {
        level_style(level, header).to_string()
    } else {
        header
    });
    lines.push(format!(
        "Claims: {} total, {} supported, {} unsupported (avg similarity {:.2})",
        result.total_claims,
        result.supported_claims,
        result.unsupported_claims,
        result.average_similarity
    ));
    lines.push(result.explanation.clone());

    if result.hallucinated {
        lines.push(String::new());
        lines.push("Text:".to_string());
        if color {
            lines.push(styled_text(text, &result.highlights, true));
        } else {
            lines.push(result.highlighted_text.clone());
        }

        lines.push(String::new());
        lines.push("Flagged claims:".to_string());
        for (i, flagged) in result.flagged_claims.iter().enumerate() {
            lines.push(format!("  {}. {}", i + 1, flagged.claim));
            lines.push(format!("     Confidence: {:.2}", flagged.confidence));
            lines.push(format!("     Evidence:   {}", flagged.evidence));
            lines.push(format!("     Source:     {}", flagged.source));
        }
    }

    if !result.explanations.is_empty() {
        lines.push(String::new());
        lines.push("Claims:".to_string());
        for explanation in &result.explanations {
            let tag = format!("[{}]", explanation.severity.as_str().to_uppercase());
            let tag = if color {
                severity_style(explanation.severity, tag).to_string()
            } else {
                tag
            };
            lines.push(format!("  {} {}", tag, explanation.claim));
            lines.push(format!("      {}", explanation.explanation));
        }
    }

    lines.join("\n")
}
