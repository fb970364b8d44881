//! Recovering candidate records from free-form model output.
//!
//! `parse_records` isolates the JSON payload, then runs an ordered repair
//! chain. Each step is a pure function returning `Some` on the first
//! interpretation that yields records.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static ARRAY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(\[\s*\{.*?\}\s*\])").expect("valid array pattern"));

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([\]}])").expect("valid trailing comma pattern"));

static RECORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{[^{}]*"start_time"[^{}]*"end_time"[^{}]*\}"#).expect("valid record pattern")
});

type RepairStep = fn(&str) -> Option<Vec<Value>>;

/// Ordered repair chain.
const REPAIR_CHAIN: &[(&str, RepairStep)] = &[
    ("direct", parse_direct),
    ("trailing_commas", strip_trailing_commas),
    ("truncated_array", close_truncated_array),
    ("record_scan", scan_records),
];

/// Pull the JSON payload out of a model response.
pub fn extract_payload(text: &str) -> String {
    let text = text.trim();

    if let Some(start) = text.find("```json") {
        let body = &text[start + 7..];
        let end = body.find("```").unwrap_or(body.len());
        return body[..end].trim().to_string();
    }

    if let Some(start) = text.find("```") {
        let body = &text[start + 3..];
        let end = body.find("```").unwrap_or(body.len());
        let body = body[..end].trim();
        return body.strip_prefix("json").unwrap_or(body).trim().to_string();
    }

    if let Some(m) = ARRAY_PATTERN.find(text) {
        return m.as_str().to_string();
    }

    if text.starts_with('[') && !text.ends_with(']') {
        if let Some(last) = text.rfind('}') {
            return format!("{}]", &text[..=last]);
        }
    }

    text.to_string()
}

/// Parse candidate records, repairing the payload if needed.
///
/// Returns the name of the step that succeeded with the records.
pub fn parse_records(text: &str) -> Option<(&'static str, Vec<Value>)> {
    let payload = extract_payload(text);
    REPAIR_CHAIN
        .iter()
        .find_map(|(name, step)| step(&payload).map(|records| (*name, records)))
}

fn as_records(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        // Some models wrap the array in an object such as {"clips": [...]}.
        Value::Object(map) => map.into_iter().find_map(|(_, v)| match v {
            Value::Array(items) => Some(items),
            _ => None,
        }),
        _ => None,
    }
}

fn parse_direct(payload: &str) -> Option<Vec<Value>> {
    serde_json::from_str(payload).ok().and_then(as_records)
}

fn strip_trailing_commas(payload: &str) -> Option<Vec<Value>> {
    parse_direct(&TRAILING_COMMA.replace_all(payload, "$1"))
}

fn close_truncated_array(payload: &str) -> Option<Vec<Value>> {
    let last = payload.rfind('}')?;
    let mut repaired = payload[..=last].to_string();
    if !repaired.trim_start().starts_with('[') {
        return None;
    }
    repaired.push(']');
    strip_trailing_commas(&repaired)
}

fn scan_records(payload: &str) -> Option<Vec<Value>> {
    let records: Vec<Value> = RECORD_PATTERN
        .find_iter(payload)
        .filter_map(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .filter(Value::is_object)
        .collect();
    (!records.is_empty()).then_some(records)
}
