//! Fixed tool catalog and dispatcher.
//!
//! The set of tools is closed: each one is a [`ToolKind`] variant, and
//! [`dispatch`] matches exhaustively, so adding a tool means adding a variant,
//! a descriptor, and a dispatch arm. Every primitive is synchronous and pure
//! apart from reading the clock or the thread RNG.

mod args;
pub mod calculate;
pub mod random;
pub mod time;
pub mod units;

use serde_json::json;
use std::sync::OnceLock;
use tracing::debug;

use crate::types::{ToolCall, ToolDescriptor, ToolResult};

/// One registered tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    GetServerTime,
    Calculate,
    GetRandomNumber,
    ConvertUnits,
}

impl ToolKind {
    /// Catalog order.
    pub const ALL: [ToolKind; 4] = [
        Self::GetServerTime,
        Self::Calculate,
        Self::GetRandomNumber,
        Self::ConvertUnits,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::GetServerTime => time::NAME,
            Self::Calculate => calculate::NAME,
            Self::GetRandomNumber => random::NAME,
            Self::ConvertUnits => units::NAME,
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    fn descriptor(self) -> ToolDescriptor {
        match self {
            Self::GetServerTime => ToolDescriptor {
                name: self.name(),
                description: "Get the current server time in a given IANA time zone.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "timeZone": {
                            "type": "string",
                            "description": "IANA time zone like 'America/Chicago' or 'UTC'."
                        }
                    },
                    "required": ["timeZone"],
                    "additionalProperties": false
                }),
            },
            Self::Calculate => ToolDescriptor {
                name: self.name(),
                description: "Perform basic mathematical calculations.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "expression": {
                            "type": "string",
                            "description": "Arithmetic expression using numbers, + - * / % ^, parentheses, pi, e, and sqrt, abs, pow, min, max, round, floor, ceil, sin, cos, tan, ln, log10, exp (e.g. '2 + 2', '10 * 5', 'sqrt(16)')."
                        }
                    },
                    "required": ["expression"],
                    "additionalProperties": false
                }),
            },
            Self::GetRandomNumber => ToolDescriptor {
                name: self.name(),
                description: "Generate a random number within a specified range.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "min": { "type": "number", "description": "Minimum value (inclusive)." },
                        "max": { "type": "number", "description": "Maximum value (inclusive)." }
                    },
                    "required": ["min", "max"],
                    "additionalProperties": false
                }),
            },
            Self::ConvertUnits => ToolDescriptor {
                name: self.name(),
                description: "Convert between different units of measurement.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "value": { "type": "number", "description": "The value to convert." },
                        "fromUnit": {
                            "type": "string",
                            "description": "The unit to convert from (e.g., 'celsius', 'fahrenheit', 'meters', 'feet')."
                        },
                        "toUnit": { "type": "string", "description": "The unit to convert to." }
                    },
                    "required": ["value", "fromUnit", "toUnit"],
                    "additionalProperties": false
                }),
            },
        }
    }
}

/// The process-wide catalog, in [`ToolKind::ALL`] order.
pub fn catalog() -> &'static [ToolDescriptor] {
    static CATALOG: OnceLock<Vec<ToolDescriptor>> = OnceLock::new();
    CATALOG.get_or_init(|| ToolKind::ALL.iter().map(|kind| kind.descriptor()).collect())
}

/// Run one proposed tool call. Never fails: problems come back as
/// [`ToolResult::Failure`].
pub fn dispatch(call: &ToolCall) -> ToolResult {
    let Some(kind) = ToolKind::from_name(&call.name) else {
        debug!(tool = %call.name, "unknown tool requested");
        return ToolResult::failure(format!("Unknown tool: {}", call.name));
    };
    let result = match kind {
        ToolKind::GetServerTime => time::execute(&call.arguments),
        ToolKind::Calculate => calculate::execute(&call.arguments),
        ToolKind::GetRandomNumber => random::execute(&call.arguments),
        ToolKind::ConvertUnits => units::execute(&call.arguments),
    };
    debug!(tool = kind.name(), failed = result.is_failure(), "tool dispatched");
    result
}
