//! Extraction of structured JSON from LLM replies.
//!
//! Model output routinely wraps the payload in markdown fences or leading
//! prose, and sometimes returns a list where an object was asked for (or the
//! reverse). Parsing goes through a tagged [`Payload`] so the recovery rules
//! are explicit rather than shape-sniffing at each call site.

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

/// Parsed top-level shape of an LLM JSON reply.
#[derive(Debug)]
pub enum Payload {
    Record(Map<String, Value>),
    Records(Vec<Value>),
}

/// Strips code fences and scopes the text to its outermost JSON value.
///
/// Whichever bracket appears first decides whether an object or an array is
/// extracted; the slice runs to the matching last closing bracket. Falls back
/// to the cleaned text when no bracket pair is found.
pub fn extract_json(text: &str) -> String {
    let text = text.replace("```json", "").replace("```", "");
    let text = text.trim();

    let idx_obj = text.find('{');
    let idx_arr = text.find('[');

    let want_object = match (idx_obj, idx_arr) {
        (Some(o), Some(a)) => o < a,
        (Some(_), None) => true,
        _ => false,
    };

    if want_object {
        if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
            if end > start {
                return text[start..=end].to_string();
            }
        }
    } else if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
        if end > start {
            return text[start..=end].to_string();
        }
    }

    text.to_string()
}

/// Extracts and parses an LLM reply into its tagged top-level shape.
pub fn parse_payload(text: &str) -> Result<Payload> {
    let clean = extract_json(text);
    let value: Value = serde_json::from_str(&clean)
        .with_context(|| format!("Response is not valid JSON: {}", truncate(&clean, 200)))?;
    match value {
        Value::Object(map) => Ok(Payload::Record(map)),
        Value::Array(items) => Ok(Payload::Records(items)),
        other => bail!("Expected JSON object or array, got {}", type_name(&other)),
    }
}

/// Recovery rule for stages that expect a single record: a list whose first
/// element is a record carrying `required_key` is unwrapped to that record.
/// Anything else is rejected.
pub fn unwrap_single_record(payload: Payload, required_key: &str) -> Option<Map<String, Value>> {
    match payload {
        Payload::Record(map) => Some(map),
        Payload::Records(items) => match items.into_iter().next() {
            Some(Value::Object(map)) if map.contains_key(required_key) => {
                log::warn!("Received a list instead of an object; using its first record");
                Some(map)
            }
            _ => None,
        },
    }
}

/// Recovery rule for stages that expect a list of records: a bare record is
/// wrapped into a one-element list. Non-record elements are dropped by the
/// caller's validity filter, not fixed here.
pub fn into_records(payload: Payload) -> Vec<Value> {
    match payload {
        Payload::Records(items) => items,
        Payload::Record(map) => {
            log::warn!("Received an object instead of an array; wrapping it");
            vec![Value::Object(map)]
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_strips_fences() {
        assert_eq!(extract_json("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(extract_json("```\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(extract_json("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_scopes_to_outer_value() {
        let text = "Here is the JSON you asked for:\n{\"series_title\": \"X\"} hope it helps";
        assert_eq!(extract_json(text), "{\"series_title\": \"X\"}");
    }

    #[test]
    fn test_extract_first_bracket_wins() {
        // An array that contains objects must not be truncated to the object.
        let text = "[{\"chapter_num\": 1}, {\"chapter_num\": 2}]";
        assert_eq!(extract_json(text), text);
        let text = "{\"chapters\": [1, 2]}";
        assert_eq!(extract_json(text), text);
    }

    #[test]
    fn test_unwrap_single_record_from_list() {
        let payload = parse_payload(r#"[{"series_title": "कथा", "skill_topic": "x"}]"#).unwrap();
        let map = unwrap_single_record(payload, "series_title").unwrap();
        assert_eq!(map["series_title"], "कथा");
    }

    #[test]
    fn test_unwrap_rejects_list_missing_key() {
        let payload = parse_payload(r#"[{"wrong": true}]"#).unwrap();
        assert!(unwrap_single_record(payload, "series_title").is_none());
    }

    #[test]
    fn test_into_records_wraps_bare_record() {
        let payload = parse_payload(r#"{"chapter_num": 1, "title": "शुरुआत"}"#).unwrap();
        let records = into_records(payload);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["chapter_num"], 1);
    }

    #[test]
    fn test_parse_payload_rejects_scalar() {
        assert!(parse_payload("42").is_err());
        assert!(parse_payload("not json at all").is_err());
    }
}
