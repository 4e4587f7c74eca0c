//! Argument coercion shared by the tool primitives.
//!
//! The remote service's arguments are untrusted. Each primitive reads the
//! fields it needs through these helpers, which apply defaults for absent
//! values and turn ill-typed ones into a message for the failure result.

use serde_json::{Map, Value};

/// Borrow the argument object, rejecting any other JSON shape.
pub(super) fn object<'a>(tool: &str, arguments: &'a Value) -> Result<&'a Map<String, Value>, String> {
    match arguments {
        Value::Object(map) => Ok(map),
        // An absent argument list reads as "all defaults".
        Value::Null => Ok(empty_map()),
        _ => Err(format!(
            "Invalid arguments for {tool}: expected a JSON object"
        )),
    }
}

fn empty_map() -> &'static Map<String, Value> {
    static EMPTY: std::sync::OnceLock<Map<String, Value>> = std::sync::OnceLock::new();
    EMPTY.get_or_init(Map::new)
}

/// Read a number. Absent, null, and empty-string values fall back to `default`.
pub(super) fn number(args: &Map<String, Value>, key: &str, default: f64) -> Result<f64, String> {
    let parsed = match args.get(key) {
        None | Some(Value::Null) => return Ok(default),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(default);
            }
            trimmed.parse::<f64>().ok()
        }
        Some(_) => None,
    };
    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(format!(
            "Invalid number for `{key}`: {}",
            args.get(key).map(Value::to_string).unwrap_or_default()
        )),
    }
}

/// Read a string. Scalars are stringified; absent or null yields `default`.
pub(super) fn string(args: &Map<String, Value>, key: &str, default: &str) -> String {
    match args.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) if s.is_empty() => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
