//! The three fixed extraction topics
//!
//! Keyword sets and row schemas for the CMT / Special Inspection proposal
//! tables. Built once at startup and shared read-only across the per-topic
//! pipelines; never mutated or reloaded mid-request.

use crate::types::{FieldSpec, KeywordTopic};

/// Default character budget for each topic's context window
pub const DEFAULT_WINDOW_CHARS: usize = 60_000;

/// The three topics, in the fixed order their sheets appear in the workbook
pub fn default_topics() -> Vec<KeywordTopic> {
    vec![field_testing(), concrete(), structural()]
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Table 1 — geotechnical and civil field testing requirements
fn field_testing() -> KeywordTopic {
    KeywordTopic {
        id: "field_testing".to_string(),
        title: "Table 1 - Field Testing Requirements (Geotech + Civil)".to_string(),
        task: "Tabulate the earthwork and subgrade field testing requirements for this \
               project. One row per construction element / material pairing (e.g. select \
               fill under building pad, flexible base under pavement), ordered by physical \
               depth, deepest first. Primary sources are the geotechnical report and the \
               civil general notes; scan all other documents for supporting data."
            .to_string(),
        keywords: keywords(&[
            "compaction",
            "proctor",
            "moisture",
            "plasticity",
            "PI",
            "liquid limit",
            "select fill",
            "flexible base",
            "TxDOT",
            "testing",
            "field density",
            "lift",
            "subgrade",
        ]),
        window_chars: DEFAULT_WINDOW_CHARS,
        row_schema: vec![
            FieldSpec::required("Construction Element"),
            FieldSpec::required("Material Type"),
            FieldSpec::required("Max Loose Thickness"),
            FieldSpec::required("Compaction Requirements"),
            FieldSpec::required("Moisture Content Tolerance"),
            FieldSpec::required("Plasticity Requirements"),
            FieldSpec::required("Testing Frequency"),
            FieldSpec::optional("Special Testing Notes"),
            FieldSpec::optional("Conflicts or Addendums"),
        ],
    }
}

/// Table 2 — concrete placement and testing summary
fn concrete() -> KeywordTopic {
    KeywordTopic {
        id: "concrete".to_string(),
        title: "Table 2 - Concrete Summary".to_string(),
        task: "Tabulate ALL concrete elements found in the documents, including pavement, \
               tank slab, sidewalks, building slab-on-grade, dumpster pad, grade beams, \
               footings, piers and curbs. One row per concrete element or mix. Do NOT \
               guess quantities."
            .to_string(),
        keywords: keywords(&[
            "concrete",
            "PCC",
            "psi",
            "f'c",
            "slump",
            "air",
            "cylinder",
            "testing",
            "thickness",
            "sidewalk",
            "pavement",
            "slab",
            "grade beam",
            "footing",
            "curb",
            "joint",
        ]),
        window_chars: DEFAULT_WINDOW_CHARS,
        row_schema: vec![
            FieldSpec::required("Element / Location"),
            FieldSpec::required("Thickness"),
            FieldSpec::required("f'c (psi)"),
            FieldSpec::required("Slump (in)"),
            FieldSpec::required("Air Content"),
            FieldSpec::required("Testing Frequency"),
            FieldSpec::optional("Cylinders (count)"),
            FieldSpec::optional("Max Temp (F)"),
            FieldSpec::optional("Notes / Mix Notes"),
        ],
    }
}

/// Table 3 — reinforcement and structural special inspection summary
fn structural() -> KeywordTopic {
    KeywordTopic {
        id: "structural".to_string(),
        title: "Table 3 - Reinforcement & Structural Summary".to_string(),
        task: "Tabulate reinforcement for ALL reinforced elements (pavement, foundations, \
               grade beams, footings, piers, sidewalks, slab-on-grade, curbs, walls) and \
               the structural special-inspection items found: cold-formed framing, \
               structural steel bolting, welds (CJP / PJP / fillet sizes) and SIP panel \
               connections. One row per element or inspection item."
            .to_string(),
        keywords: keywords(&[
            "#",
            "rebar",
            "reinforcing",
            "bar",
            "stirrups",
            "dowel",
            "weld",
            "fillet",
            "CJP",
            "PJP",
            "bolt",
            "bolting",
            "CFMF",
            "cold formed",
            "light gauge",
            "SIP",
            "panel",
            "connection",
            "special inspection",
        ]),
        window_chars: DEFAULT_WINDOW_CHARS,
        row_schema: vec![
            FieldSpec::required("Location / Element"),
            FieldSpec::required("Bar Size"),
            FieldSpec::required("Configuration"),
            FieldSpec::required("Spacing / Dimensions"),
            FieldSpec::optional("Special Inspection"),
            FieldSpec::optional("Notes / Reference"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_three_topics_in_fixed_order() {
        let topics = default_topics();
        let ids: Vec<&str> = topics.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["field_testing", "concrete", "structural"]);
    }

    #[test]
    fn every_topic_has_keywords_and_required_fields() {
        for topic in default_topics() {
            assert!(!topic.keywords.is_empty(), "{}", topic.id);
            assert!(
                topic.row_schema.iter().any(|f| f.required),
                "{}",
                topic.id
            );
            assert!(topic.window_chars > 0, "{}", topic.id);
        }
    }
}
