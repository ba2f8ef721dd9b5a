//! Core type definitions for bid table extraction

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Page or sheet identifier within one document
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    Page(u32),
    Sheet(String),
}

/// Atomic unit of citation: one page/sheet of one uploaded document
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct DocumentLocation {
    pub document_name: String,
    pub locator: Locator,
}

impl DocumentLocation {
    pub fn page(document_name: impl Into<String>, page: u32) -> Self {
        Self {
            document_name: document_name.into(),
            locator: Locator::Page(page),
        }
    }

    pub fn sheet(document_name: impl Into<String>, sheet: impl Into<String>) -> Self {
        Self {
            document_name: document_name.into(),
            locator: Locator::Sheet(sheet.into()),
        }
    }

    /// Canonical citation string, e.g. "Geotech.pdf p.17" or "Civil.pdf sheet C-101"
    pub fn citation(&self) -> String {
        match &self.locator {
            Locator::Page(n) => format!("{} p.{}", self.document_name, n),
            Locator::Sheet(id) => format!("{} sheet {}", self.document_name, id),
        }
    }
}

impl fmt::Display for DocumentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.citation())
    }
}

/// Check a model-supplied source string against the canonical citation format
pub fn is_canonical_citation(s: &str) -> bool {
    let s = s.trim();
    if let Some(idx) = s.rfind(" p.") {
        let page = &s[idx + 3..];
        return idx > 0 && !page.is_empty() && !page.contains(char::is_whitespace);
    }
    if let Some(idx) = s.rfind(" sheet ") {
        let id = &s[idx + 7..];
        return idx > 0 && !id.trim().is_empty();
    }
    false
}

/// One column of a topic's output table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub required: bool,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }
}

/// Static per-prompt configuration: what "relevant" means for one topic
/// and what shape its rows must take. Built once at startup, shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordTopic {
    pub id: String,
    pub title: String,
    /// Topic-specific task description placed at the top of the user prompt
    pub task: String,
    pub keywords: Vec<String>,
    /// Character budget for the extracted context window
    pub window_chars: usize,
    pub row_schema: Vec<FieldSpec>,
}

/// Bounded-size extracted context for one topic, ready for prompting.
/// `locations` lists every page/sheet that contributed text, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextWindow {
    pub locations: Vec<DocumentLocation>,
    pub text: String,
}

impl ContextWindow {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// One chat message in the outbound payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Complete message payload for one topic's chat call
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPayload {
    pub messages: Vec<ChatMessage>,
}

/// One validated output row with its source citations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRow {
    pub fields: HashMap<String, String>,
    pub sources: Vec<String>,
    /// Present only on model-inferred rows (e.g. header rows) that cite no source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// Why a response needs one corrective follow-up
#[derive(Debug, Clone, PartialEq)]
pub enum RepairReason {
    /// Response was not parseable as the structured format at all
    ParseFailure(String),
    /// Parsed, but violated the row schema or the citation invariant
    SchemaViolation(String),
}

impl fmt::Display for RepairReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepairReason::ParseFailure(msg) => write!(f, "response was not valid JSON: {}", msg),
            RepairReason::SchemaViolation(msg) => write!(f, "schema violation: {}", msg),
        }
    }
}

/// Tri-state result of validating one raw model response
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    Valid(Vec<ResultRow>),
    Repairable(RepairReason),
}

/// Terminal status of one topic's prompt cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopicStatus {
    Accepted,
    RepairedAccepted,
    Failed,
}

/// Validated row-set for one topic. Populated once, immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicResult {
    pub topic_id: String,
    pub title: String,
    pub rows: Vec<ResultRow>,
    pub status: TopicStatus,
    /// Recorded reason when `status` is `Failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl TopicResult {
    pub fn failed(topic: &KeywordTopic, reason: impl Into<String>) -> Self {
        Self {
            topic_id: topic.id.clone(),
            title: topic.title.clone(),
            rows: Vec::new(),
            status: TopicStatus::Failed,
            failure: Some(reason.into()),
        }
    }
}

/// Terminal artifact handed to the workbook writer: one entry per topic,
/// in the fixed order the three prompts were defined
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidResult {
    pub project_name: String,
    pub topics: Vec<TopicResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citation_rendering() {
        let page = DocumentLocation::page("Geotech.pdf", 17);
        assert_eq!(page.citation(), "Geotech.pdf p.17");

        let sheet = DocumentLocation::sheet("Civil.pdf", "C-101");
        assert_eq!(sheet.citation(), "Civil.pdf sheet C-101");
    }

    #[test]
    fn canonical_citation_predicate() {
        assert!(is_canonical_citation("Geotech.pdf p.17"));
        assert!(is_canonical_citation("Civil.pdf sheet 13"));
        assert!(is_canonical_citation("Civil Plans.pdf sheet C-101"));

        assert!(!is_canonical_citation("Geotech.pdf"));
        assert!(!is_canonical_citation("p.17"));
        assert!(!is_canonical_citation("Geotech.pdf p. 17"));
        assert!(!is_canonical_citation("NOT FOUND"));
        assert!(!is_canonical_citation(""));
    }

    #[test]
    fn rendered_citations_round_trip_the_predicate() {
        for loc in [
            DocumentLocation::page("Geotech.pdf", 1),
            DocumentLocation::sheet("Civil.pdf", "S-3.1"),
        ] {
            assert!(is_canonical_citation(&loc.citation()), "{}", loc);
        }
    }
}
