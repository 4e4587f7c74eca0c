//! Uniform random integer tool.

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde_json::{json, Value};

use super::args;
use crate::types::ToolResult;

pub(super) const NAME: &str = "getRandomNumber";

/// Largest magnitude where every integer is exactly representable as f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub(super) fn execute(arguments: &Value) -> ToolResult {
    execute_with(arguments, &mut rand::thread_rng())
}

fn execute_with<R: Rng>(arguments: &Value, rng: &mut R) -> ToolResult {
    let args = match args::object(NAME, arguments) {
        Ok(args) => args,
        Err(msg) => return ToolResult::failure(msg),
    };
    let (min, max) = match (args::number(args, "min", 0.0), args::number(args, "max", 100.0)) {
        (Ok(min), Ok(max)) => (min, max),
        (Err(msg), _) | (_, Err(msg)) => return ToolResult::failure(msg),
    };
    match pick(min, max, rng) {
        Ok(result) => ToolResult::Success(json!({
            "min": min,
            "max": max,
            "result": result,
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })),
        Err(msg) => ToolResult::failure(msg),
    }
}

/// Draw an integer uniformly from the integers inside `[min, max]`.
fn pick<R: Rng>(min: f64, max: f64, rng: &mut R) -> Result<i64, String> {
    if min > max {
        return Err("Min cannot be greater than max".to_string());
    }
    if min.abs() > MAX_SAFE_INTEGER || max.abs() > MAX_SAFE_INTEGER {
        return Err(format!(
            "Range must stay within ±{MAX_SAFE_INTEGER}"
        ));
    }
    let low = min.ceil() as i64;
    let high = max.floor() as i64;
    if low > high {
        return Err(format!("No integer lies between {min} and {max}"));
    }
    Ok(rng.gen_range(low..=high))
}
