//! Server clock tool.
//!
//! Reports the current instant rendered in a caller-chosen IANA time zone.

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;

use super::args;
use crate::types::ToolResult;

pub(super) const NAME: &str = "getServerTime";

/// Run `getServerTime` against the live clock.
pub(super) fn execute(arguments: &Value) -> ToolResult {
    let args = match args::object(NAME, arguments) {
        Ok(args) => args,
        Err(msg) => return ToolResult::failure(msg),
    };
    let zone = args::string(args, "timeZone", "UTC");
    match build_snapshot(Utc::now(), &zone) {
        Ok(snapshot) => ToolResult::Success(serde_json::to_value(snapshot).unwrap_or_default()),
        Err(msg) => ToolResult::failure(msg),
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct TimeSnapshot {
    time_zone: String,
    /// ISO-8601 instant in UTC.
    iso: String,
    /// Local wall-clock time in the requested zone.
    formatted: String,
    unix: i64,
}

fn build_snapshot(now: DateTime<Utc>, zone: &str) -> Result<TimeSnapshot, String> {
    let zone = zone.trim();
    let tz = Tz::from_str_insensitive(zone).map_err(|_| format!("Invalid timezone: {zone}"))?;
    let local = now.with_timezone(&tz);
    Ok(TimeSnapshot {
        time_zone: zone.to_string(),
        iso: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        formatted: local.format("%m/%d/%Y, %I:%M:%S %p %Z").to_string(),
        unix: now.timestamp(),
    })
}
