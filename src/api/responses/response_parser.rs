//! Parser for buffered `/responses` JSON payloads.

use crate::types::ToolCall;
use serde_json::{Map, Value};

/// Extract the answer text from one buffered payload.
///
/// Prefers the top-level `output_text`; otherwise concatenates the text parts
/// of every output item. Items without text contribute nothing.
pub(crate) fn output_text(payload: &Value) -> String {
    if let Some(text) = payload.get("output_text").and_then(Value::as_str) {
        return text.to_string();
    }
    let Some(output) = payload.get("output").and_then(Value::as_array) else {
        return String::new();
    };
    output.iter().map(item_text).collect()
}

/// Text carried by one output item's content parts.
fn item_text(item: &Value) -> String {
    let Some(content) = item.get("content").and_then(Value::as_array) else {
        return String::new();
    };
    content
        .iter()
        .filter_map(|part| match part.get("text") {
            Some(Value::String(text)) => Some(text.as_str()),
            // Older payloads wrap text as `{ "value": "..." }`.
            Some(Value::Object(wrapped)) => wrapped.get("value").and_then(Value::as_str),
            _ => None,
        })
        .collect()
}

/// Find the function-call directive in a buffered payload.
///
/// Directives may be top-level output items or parts nested in an item's
/// content. When several are present the last one in output order wins.
pub(crate) fn last_tool_call(payload: &Value) -> Option<ToolCall> {
    let output = payload.get("output").and_then(Value::as_array)?;
    let mut found = None;
    for item in output {
        if let Some(call) = parse_function_call(item) {
            found = Some(call);
        }
        if let Some(content) = item.get("content").and_then(Value::as_array) {
            for part in content {
                if let Some(call) = parse_function_call(part) {
                    found = Some(call);
                }
            }
        }
    }
    found
}

/// Parse one `function_call` object into a [`ToolCall`].
fn parse_function_call(value: &Value) -> Option<ToolCall> {
    if value.get("type").and_then(Value::as_str) != Some("function_call") {
        return None;
    }
    let name = value.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }
    let call_id = value
        .get("call_id")
        .and_then(Value::as_str)
        .or_else(|| value.get("id").and_then(Value::as_str))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);
    Some(ToolCall {
        name: name.to_string(),
        arguments: parse_arguments(value.get("arguments")),
        call_id,
    })
}

/// Decode JSON-encoded arguments, keeping the raw string when it is malformed.
fn parse_arguments(raw: Option<&Value>) -> Value {
    match raw {
        Some(Value::String(text)) => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
        }
        Some(Value::Null) | None => Value::Object(Map::new()),
        Some(other) => other.clone(),
    }
}
