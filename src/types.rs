//! Data model shared by the tool layer, the orchestration phases, and the
//! HTTP surface.
//!
//! Everything here is constructed per request and dropped once the answer is
//! delivered. The only process-wide value is the tool catalog in
//! [`crate::tools`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Reasoning effort and model tier
// ---------------------------------------------------------------------------

/// Effort level forwarded to reasoning-tier models.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    #[default]
    Medium,
    High,
}

impl ReasoningEffort {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ReasoningEffort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReasoningEffort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!(
                "invalid reasoning effort `{other}`: expected one of low, medium, high"
            )),
        }
    }
}

/// Sampling control attached to an outbound request.
///
/// Resolved once per request from the model identifier. Reasoning-tier models
/// take an effort level; everything else may take a temperature. The two are
/// never sent together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelTier {
    Reasoning { effort: ReasoningEffort },
    Legacy { temperature: Option<f64> },
}

impl ModelTier {
    /// Classify `model` by the reasoning-tier name prefix.
    pub fn resolve(
        model: &str,
        reasoning_prefix: &str,
        effort: ReasoningEffort,
        temperature: Option<f64>,
    ) -> Self {
        if is_reasoning_model(model, reasoning_prefix) {
            Self::Reasoning { effort }
        } else {
            Self::Legacy { temperature }
        }
    }

    pub fn is_reasoning(&self) -> bool {
        matches!(self, Self::Reasoning { .. })
    }
}

/// True when `model` belongs to the reasoning tier.
pub fn is_reasoning_model(model: &str, reasoning_prefix: &str) -> bool {
    !reasoning_prefix.is_empty() && model.trim().starts_with(reasoning_prefix)
}

/// Per-request knobs for the remote reasoning service.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub model: String,
    /// Ask the service for a JSON-object answer.
    pub json_mode: bool,
    pub tier: ModelTier,
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// One user turn: the system instructions plus the user's prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub system_prompt: String,
    pub user_prompt: String,
}

impl ConversationTurn {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
        }
    }
}

/// A tool the remote service proposed, paired with what running it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolExchange {
    pub call: ToolCall,
    pub result: ToolResult,
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// Catalog entry advertised to the remote service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON-Schema-like parameter object. Advisory: primitives re-validate.
    pub parameters: Value,
}

/// A tool invocation proposed by the remote service. Untrusted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub name: String,
    /// Usually an object. Holds the raw string when the service sent
    /// arguments that were not valid JSON.
    pub arguments: Value,
    /// Correlation id assigned by the remote service, when it sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
            call_id: None,
        }
    }
}

/// Outcome of running one tool. Always a value, never a fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResult {
    Failure { error: String },
    Success(Value),
}

impl ToolResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Success payload, if any.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure { .. } => None,
        }
    }

    /// Serialized form fed back to the model as the tool output.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

// ---------------------------------------------------------------------------
// Phase outputs
// ---------------------------------------------------------------------------

/// What the detection round decided.
#[derive(Debug, Clone)]
pub struct Detection {
    /// The proposed call, if the service asked for one. `None` means `text`
    /// is the final answer.
    pub tool_call: Option<ToolCall>,
    pub text: String,
    pub raw: Value,
}

/// A buffered answer from a single non-streaming round.
#[derive(Debug, Clone)]
pub struct DirectResponse {
    pub text: String,
    pub model: String,
    pub raw: Value,
}
