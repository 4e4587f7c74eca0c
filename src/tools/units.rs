//! Unit conversion tool.
//!
//! Converters are registered per directed pair. The table is deliberately not
//! closed under inversion or composition: a pair that is not listed fails
//! even when its reverse exists.

use serde_json::{json, Value};

use super::args;
use crate::types::ToolResult;

pub(super) const NAME: &str = "convertUnits";

const SUPPORTED: &str = "temperature (celsius, fahrenheit, kelvin), length (meters, feet, kilometers, miles, inches, yards), weight (kilograms, pounds, grams, ounces)";

pub(super) fn execute(arguments: &Value) -> ToolResult {
    let args = match args::object(NAME, arguments) {
        Ok(args) => args,
        Err(msg) => return ToolResult::failure(msg),
    };
    let value = match args::number(args, "value", 0.0) {
        Ok(value) => value,
        Err(msg) => return ToolResult::failure(msg),
    };
    let from = args::string(args, "fromUnit", "").trim().to_lowercase();
    let to = args::string(args, "toUnit", "").trim().to_lowercase();

    match convert(value, &from, &to) {
        Ok(result) => ToolResult::Success(json!({
            "value": value,
            "fromUnit": from,
            "toUnit": to,
            "result": result,
        })),
        Err(msg) => ToolResult::failure(msg),
    }
}

/// Convert `value` between lowercase unit names.
pub(crate) fn convert(value: f64, from: &str, to: &str) -> Result<f64, String> {
    if from == to {
        return Ok(value);
    }
    let converter = converter(from, to).ok_or_else(|| {
        format!("Cannot convert from {from} to {to}. Supported conversions: {SUPPORTED}")
    })?;
    let result = converter(value);
    if !result.is_finite() {
        return Err(format!(
            "Conversion of {value} from {from} to {to} is out of range"
        ));
    }
    Ok(round5(result))
}

fn converter(from: &str, to: &str) -> Option<fn(f64) -> f64> {
    let f: fn(f64) -> f64 = match (from, to) {
        // Temperature
        ("celsius", "fahrenheit") => |v| v * 9.0 / 5.0 + 32.0,
        ("celsius", "kelvin") => |v| v + 273.15,
        ("fahrenheit", "celsius") => |v| (v - 32.0) * 5.0 / 9.0,
        ("fahrenheit", "kelvin") => |v| (v - 32.0) * 5.0 / 9.0 + 273.15,
        // Length
        ("meters", "feet") => |v| v * 3.28084,
        ("meters", "kilometers") => |v| v / 1000.0,
        ("meters", "miles") => |v| v * 0.000621371,
        ("feet", "meters") => |v| v / 3.28084,
        ("feet", "inches") => |v| v * 12.0,
        ("feet", "yards") => |v| v / 3.0,
        // Weight
        ("kilograms", "pounds") => |v| v * 2.20462,
        ("kilograms", "grams") => |v| v * 1000.0,
        ("pounds", "kilograms") => |v| v / 2.20462,
        ("pounds", "ounces") => |v| v * 16.0,
        _ => return None,
    };
    Some(f)
}

/// Round to five decimal places. Magnitudes this large have no fractional
/// digits left to round, and scaling them would overflow.
fn round5(v: f64) -> f64 {
    if v.abs() >= 1e300 {
        return v;
    }
    (v * 100_000.0).round() / 100_000.0
}
