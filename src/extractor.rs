//! Keyword-window context extraction
//!
//! Reduces large normalized documents to a bounded, citation-prefixed context
//! per topic. Deliberately lexical: case-insensitive substring matching with a
//! fixed character radius around each hit, no embeddings. A pure function of
//! (input text, keyword set, budget) so repeated runs are byte-identical.

use crate::types::{ContextWindow, DocumentLocation, KeywordTopic};
use tracing::debug;

/// Default half-width of the window taken around each keyword hit.
/// Large enough to capture a full paragraph or table row of context.
pub const DEFAULT_RADIUS_CHARS: usize = 300;

/// Extract a bounded context window for one topic using the default radius
pub fn extract(docs: &[(DocumentLocation, String)], topic: &KeywordTopic) -> ContextWindow {
    extract_with_radius(docs, topic, DEFAULT_RADIUS_CHARS)
}

/// Extract a bounded context window with an explicit match radius
pub fn extract_with_radius(
    docs: &[(DocumentLocation, String)],
    topic: &KeywordTopic,
    radius: usize,
) -> ContextWindow {
    let keywords: Vec<Vec<char>> = topic
        .keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .map(|k| fold_chars(k))
        .collect();

    // Merged keyword spans in document order, one entry per surviving span
    let mut spans: Vec<(DocumentLocation, String)> = Vec::new();

    for (loc, text) in docs {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            continue;
        }
        let folded: Vec<char> = chars
            .iter()
            .map(|c| c.to_lowercase().next().unwrap_or(*c))
            .collect();

        let mut ranges: Vec<(usize, usize)> = Vec::new();
        for kw in &keywords {
            for start in find_all(&folded, kw) {
                let lo = start.saturating_sub(radius);
                let hi = (start + kw.len() + radius).min(chars.len());
                ranges.push((lo, hi));
            }
        }
        if ranges.is_empty() {
            continue;
        }

        for (lo, hi) in merge_ranges(ranges) {
            let span: String = chars[lo..hi].iter().collect();
            spans.push((loc.clone(), span));
        }
    }

    if spans.is_empty() {
        // No keyword hit anywhere: fall back to the leading text of the whole
        // set so the prompt never receives an empty context. The model is then
        // expected to answer NOT SPECIFIED rather than fail outright.
        debug!(topic = %topic.id, "no keyword matches; using leading-text fallback");
        let fallback: Vec<(DocumentLocation, String)> = docs
            .iter()
            .filter(|(_, text)| !text.is_empty())
            .map(|(loc, text)| (loc.clone(), text.clone()))
            .collect();
        return assemble(fallback, topic.window_chars);
    }

    assemble(spans, topic.window_chars)
}

/// Lowercase-fold a keyword into chars, keeping a 1:1 index mapping
fn fold_chars(s: &str) -> Vec<char> {
    s.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

/// All start offsets of `needle` within `hay` (char indices)
fn find_all(hay: &[char], needle: &[char]) -> Vec<usize> {
    if needle.is_empty() || hay.len() < needle.len() {
        return Vec::new();
    }
    (0..=hay.len() - needle.len())
        .filter(|&i| hay[i..i + needle.len()] == *needle)
        .collect()
}

/// Merge overlapping or touching (lo, hi) ranges into disjoint spans
fn merge_ranges(mut ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    ranges.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (lo, hi) in ranges {
        match merged.last_mut() {
            Some((_, prev_hi)) if lo <= *prev_hi => {
                *prev_hi = (*prev_hi).max(hi);
            }
            _ => merged.push((lo, hi)),
        }
    }
    merged
}

/// Concatenate citation-prefixed spans until the char budget is reached,
/// truncating the last span if it would overflow
fn assemble(spans: Vec<(DocumentLocation, String)>, budget: usize) -> ContextWindow {
    let mut text = String::new();
    let mut locations: Vec<DocumentLocation> = Vec::new();
    let mut used = 0usize;

    for (loc, span) in spans {
        if used >= budget {
            break;
        }
        let header = format!("--- {} ---\n", loc.citation());
        let header_len = header.chars().count();
        // Stop once there is no room left for any span text after the header
        if used + header_len >= budget {
            break;
        }

        let span_len = span.chars().count();
        let take = span_len.min(budget - used - header_len);

        text.push_str(&header);
        text.extend(span.chars().take(take));
        used += header_len + take;

        if !locations.contains(&loc) {
            locations.push(loc);
        }

        if used < budget {
            text.push('\n');
            used += 1;
        }
    }

    ContextWindow { locations, text }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_all_is_case_insensitive_via_folding() {
        let hay = fold_chars("Select Fill over SELECT FILL");
        let needle = fold_chars("select fill");
        assert_eq!(find_all(&hay, &needle), vec![0, 17]);
    }

    #[test]
    fn merge_ranges_collapses_overlaps() {
        assert_eq!(
            merge_ranges(vec![(10, 20), (0, 5), (18, 30), (5, 8)]),
            vec![(0, 8), (10, 30)]
        );
    }

    #[test]
    fn assemble_truncates_last_span_at_budget() {
        let loc = DocumentLocation::page("Spec.pdf", 1);
        let window = assemble(vec![(loc, "x".repeat(500))], 100);
        assert_eq!(window.text.chars().count(), 100);
        assert!(window.text.starts_with("--- Spec.pdf p.1 ---\n"));
    }
}
