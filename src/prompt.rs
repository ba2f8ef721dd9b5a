//! Prompt construction for topic extraction calls
//!
//! Pure string assembly: fixed instruction template + schema listing + the
//! extracted context window. Never mutates window content, no I/O.

use crate::types::{ChatMessage, ContextWindow, KeywordTopic, PromptPayload, RepairReason};

pub const SENTINEL: &str = "NOT SPECIFIED";

const SYSTEM_PROMPT: &str = "You are a meticulous construction document analyst \
     preparing a CMT / Special Inspection proposal. Extract only what is \
     explicitly stated in the provided documents.";

/// Build the message payload for one topic's chat call
pub fn build(topic: &KeywordTopic, window: &ContextWindow, project_name: &str) -> PromptPayload {
    let mut user = String::new();
    user.push_str(&topic.task);
    user.push_str("\n\nProject: ");
    user.push_str(project_name);
    user.push_str("\n\n");
    user.push_str(&output_rules());
    user.push_str("\n\n");
    user.push_str(&schema_listing(topic));
    user.push_str("\n\nDOCUMENT CONTEXT:\n");
    user.push_str(&window.text);

    PromptPayload {
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)],
    }
}

/// Build the follow-up payload for the single repair attempt: the original
/// conversation plus the model's faulty reply and one corrective instruction
pub fn repair_payload(
    original: &PromptPayload,
    faulty_response: &str,
    reason: &RepairReason,
) -> PromptPayload {
    let mut messages = original.messages.clone();
    messages.push(ChatMessage::assistant(faulty_response));
    messages.push(ChatMessage::user(format!(
        "Your previous response violated the required output contract: {}.\n\
         Return the corrected response now. STRICT JSON only, exactly one \
         top-level object of the form {{\"rows\": [...]}}, same fields, same \
         rules. No markdown. No commentary.",
        reason
    )));
    PromptPayload { messages }
}

fn output_rules() -> String {
    format!(
        "OUTPUT RULES (MANDATORY):\n\
         1) Return STRICT JSON only. No markdown. No backticks. No commentary.\n\
         2) The top-level shape must be exactly {{\"rows\": [...]}} with no other keys.\n\
         3) Every row must contain every field listed below as a string value. \
         If a value is not explicitly found in the provided documents, write \"{SENTINEL}\".\n\
         4) Never invent drawing numbers, report numbers, quantities, or requirements.\n\
         5) Every row must include a \"sources\" array listing where its values were found, \
         formatted exactly as \"<filename> p.<page>\" or \"<filename> sheet <id>\", \
         e.g. \"Geotech.pdf p.17\" or \"Civil.pdf sheet 13\". If nothing was found, \
         use [\"NOT FOUND\"]. A row you infer rather than extract (e.g. a section \
         header) must instead carry a \"rationale\" string explaining it.\n\
         6) If two provided documents conflict on the SAME requirement, set the field \
         value to \"CONFLICT\" and cite both sources. Do NOT flag a conflict when the \
         requirement appears in only one document."
    )
}

fn schema_listing(topic: &KeywordTopic) -> String {
    let mut out = String::from("FIELDS (every row, in this order):\n");
    for field in &topic.row_schema {
        let kind = if field.required {
            "required"
        } else {
            "optional"
        };
        out.push_str(&format!("- \"{}\" ({})\n", field.name, kind));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldSpec;

    fn topic() -> KeywordTopic {
        KeywordTopic {
            id: "concrete".to_string(),
            title: "Concrete Summary".to_string(),
            task: "Tabulate all concrete elements.".to_string(),
            keywords: vec!["concrete".to_string()],
            window_chars: 1000,
            row_schema: vec![
                FieldSpec::required("Element / Location"),
                FieldSpec::optional("Notes"),
            ],
        }
    }

    #[test]
    fn build_is_deterministic_and_preserves_window() {
        let window = ContextWindow {
            locations: vec![],
            text: "--- Civil.pdf p.3 ---\n4000 psi concrete".to_string(),
        };
        let a = build(&topic(), &window, "Northlake");
        let b = build(&topic(), &window, "Northlake");
        assert_eq!(a, b);

        let user = &a.messages[1].content;
        assert!(user.contains("--- Civil.pdf p.3 ---\n4000 psi concrete"));
        assert!(user.contains("\"Element / Location\" (required)"));
        assert!(user.contains("\"Notes\" (optional)"));
        assert!(user.contains(SENTINEL));
    }

    #[test]
    fn repair_payload_appends_exactly_two_messages() {
        let window = ContextWindow {
            locations: vec![],
            text: String::new(),
        };
        let original = build(&topic(), &window, "Northlake");
        let reason = RepairReason::SchemaViolation("row 3 missing field \"Notes\"".to_string());
        let repaired = repair_payload(&original, "not json", &reason);

        assert_eq!(repaired.messages.len(), original.messages.len() + 2);
        assert_eq!(repaired.messages[2].role, "assistant");
        assert!(repaired.messages[3].content.contains("row 3 missing field"));
    }
}
