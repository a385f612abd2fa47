//! Reading JSON out of completion replies
//!
//! Models wrap JSON in markdown fences or surround it with prose. These
//! helpers find the payload and hand back plain `serde_json` values.

use serde_json::Value;

use super::EstimatorError;

/// Remove a surrounding ```` ``` ```` / ```` ```json ```` fence, if any
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the language tag on the opening line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse the first JSON document found in `text`
fn find_json(text: &str) -> Option<Value> {
    let text = strip_code_fences(text);
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }
    for (open, close) in [('[', ']'), ('{', '}')] {
        if let (Some(start), Some(end)) = (text.find(open), text.rfind(close)) {
            if start < end {
                if let Ok(value) = serde_json::from_str::<Value>(&text[start..=end]) {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// A list of records: a bare array, `{"items": [..]}` / `{"results": [..]}`,
/// or a single object
pub fn json_records(text: &str) -> Result<Vec<Value>, EstimatorError> {
    match find_json(text) {
        Some(Value::Array(records)) => Ok(records),
        Some(Value::Object(map)) => {
            for key in ["items", "results", "foods"] {
                if let Some(Value::Array(records)) = map.get(key) {
                    return Ok(records.clone());
                }
            }
            Ok(vec![Value::Object(map)])
        }
        Some(other) => Err(EstimatorError::Malformed(format!(
            "expected a JSON array or object, got {}",
            other
        ))),
        None => Err(EstimatorError::Malformed(snippet(text))),
    }
}

/// A single object, or the first object of an array
pub fn json_object(text: &str) -> Result<Value, EstimatorError> {
    match find_json(text) {
        Some(Value::Object(map)) => Ok(Value::Object(map)),
        Some(Value::Array(values)) => values
            .into_iter()
            .find(Value::is_object)
            .ok_or_else(|| EstimatorError::Malformed("array held no object".to_string())),
        _ => Err(EstimatorError::Malformed(snippet(text))),
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(120).collect()
}
