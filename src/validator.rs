//! Structured-response validation
//!
//! Turns an unreliable free-text model reply into either a verified row-set or
//! a short corrective instruction for the single repair pass. Surrounding
//! prose is tolerated by extracting the first top-level JSON object before
//! parsing; everything else that can go wrong maps to `Repairable`, never to a
//! panic.

use crate::types::{
    is_canonical_citation, KeywordTopic, RepairReason, ResultRow, ValidationOutcome,
};
use serde_json::Value;
use std::collections::HashMap;

/// Sources entry the model may use when a fact had no locatable origin
const NOT_FOUND: &str = "NOT FOUND";

/// Validate one raw model response against a topic's row schema and the
/// cite-every-value invariant
pub fn validate(raw: &str, topic: &KeywordTopic) -> ValidationOutcome {
    let block = match extract_json_block(raw) {
        Ok(block) => block,
        Err(reason) => return ValidationOutcome::Repairable(reason),
    };

    let value: Value = match serde_json::from_str(block) {
        Ok(value) => value,
        Err(e) => {
            return ValidationOutcome::Repairable(RepairReason::ParseFailure(e.to_string()))
        }
    };

    match check_document(&value, topic) {
        Ok(rows) => ValidationOutcome::Valid(rows),
        Err(reason) => ValidationOutcome::Repairable(reason),
    }
}

/// Locate the first balanced top-level `{...}` block in possibly
/// prose-wrapped text. A second top-level block is a repairable ambiguity.
fn extract_json_block(raw: &str) -> Result<&str, RepairReason> {
    let mut start = None;
    let mut end = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in raw.char_indices() {
        if end.is_some() {
            // Block already closed: any further opening brace is ambiguous
            if ch == '{' {
                return Err(RepairReason::ParseFailure(
                    "response contained more than one top-level JSON object".to_string(),
                ));
            }
            continue;
        }
        if start.is_none() {
            if ch == '{' {
                start = Some(idx);
                depth = 1;
            }
            continue;
        }
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(idx + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    match (start, end) {
        (Some(s), Some(e)) => Ok(&raw[s..e]),
        (Some(_), None) => Err(RepairReason::ParseFailure(
            "response contained an unterminated JSON object".to_string(),
        )),
        _ => Err(RepairReason::ParseFailure(
            "response contained no JSON object".to_string(),
        )),
    }
}

fn check_document(value: &Value, topic: &KeywordTopic) -> Result<Vec<ResultRow>, RepairReason> {
    let object = value.as_object().ok_or_else(|| {
        RepairReason::SchemaViolation("top-level value must be a JSON object".to_string())
    })?;

    for key in object.keys() {
        if key != "rows" {
            return Err(RepairReason::SchemaViolation(format!(
                "unexpected top-level field \"{}\"",
                key
            )));
        }
    }

    let rows = object
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            RepairReason::SchemaViolation("missing top-level \"rows\" array".to_string())
        })?;

    let mut out = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        out.push(check_row(row, idx + 1, topic)?);
    }
    Ok(out)
}

fn check_row(row: &Value, number: usize, topic: &KeywordTopic) -> Result<ResultRow, RepairReason> {
    let object = row.as_object().ok_or_else(|| {
        RepairReason::SchemaViolation(format!("row {} must be a JSON object", number))
    })?;

    let mut fields = HashMap::new();
    for spec in &topic.row_schema {
        match object.get(&spec.name) {
            Some(Value::String(s)) => {
                fields.insert(spec.name.clone(), s.clone());
            }
            Some(_) => {
                return Err(RepairReason::SchemaViolation(format!(
                    "row {} field \"{}\" must be a string",
                    number, spec.name
                )));
            }
            None if spec.required => {
                return Err(RepairReason::SchemaViolation(format!(
                    "row {} missing required field \"{}\"",
                    number, spec.name
                )));
            }
            None => {}
        }
    }

    let rationale = match object.get("rationale") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::String(_)) | None => None,
        Some(_) => {
            return Err(RepairReason::SchemaViolation(format!(
                "row {} field \"rationale\" must be a string",
                number
            )));
        }
    };

    let sources = match object.get("sources") {
        Some(Value::Array(entries)) => {
            let mut sources = Vec::with_capacity(entries.len());
            for entry in entries {
                match entry {
                    Value::String(s) => sources.push(s.clone()),
                    _ => {
                        return Err(RepairReason::SchemaViolation(format!(
                            "row {} \"sources\" entries must be strings",
                            number
                        )));
                    }
                }
            }
            sources
        }
        Some(_) => {
            return Err(RepairReason::SchemaViolation(format!(
                "row {} field \"sources\" must be an array of strings",
                number
            )));
        }
        None => Vec::new(),
    };

    // Citation invariant: every extracted row cites at least one location in
    // canonical form; only explicitly model-inferred rows are exempt
    if rationale.is_none() {
        if sources.is_empty() {
            return Err(RepairReason::SchemaViolation(format!(
                "row {} has no \"sources\" and no \"rationale\"",
                number
            )));
        }
        for source in &sources {
            if source != NOT_FOUND && !is_canonical_citation(source) {
                return Err(RepairReason::SchemaViolation(format!(
                    "row {} source \"{}\" does not match \"<filename> p.<page>\" or \
                     \"<filename> sheet <id>\"",
                    number, source
                )));
            }
        }
    }

    Ok(ResultRow {
        fields,
        sources,
        rationale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_block_from_surrounding_prose() {
        let raw = "Here is the table you asked for:\n{\"rows\": []}\nLet me know!";
        assert_eq!(extract_json_block(raw).unwrap(), "{\"rows\": []}");
    }

    #[test]
    fn braces_inside_strings_do_not_close_the_block() {
        let raw = r#"{"rows": [{"Notes": "see {detail} on S-2"}]}"#;
        assert_eq!(extract_json_block(raw).unwrap(), raw);
    }

    #[test]
    fn two_top_level_blocks_are_ambiguous() {
        let raw = "{\"rows\": []} {\"rows\": []}";
        assert!(matches!(
            extract_json_block(raw),
            Err(RepairReason::ParseFailure(_))
        ));
    }

    #[test]
    fn unterminated_block_is_a_parse_failure() {
        assert!(matches!(
            extract_json_block("{\"rows\": ["),
            Err(RepairReason::ParseFailure(_))
        ));
    }

    #[test]
    fn no_block_is_a_parse_failure() {
        assert!(matches!(
            extract_json_block("I could not find anything."),
            Err(RepairReason::ParseFailure(_))
        ));
    }
}
