//! Request and response bodies of the HTTP surface.
//!
//! Bodies are decoded by hand from raw bytes so that malformed JSON gets the
//! same `{ok:false, error}` answer as a missing field.

use crate::conversation::Conversation;
use crate::error::ValidationError;
use crate::types::{
    ConversationTurn, Detection, DirectResponse, ReasoningEffort, RequestOptions, ToolCall,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Body shared by every POST endpoint. Fields an endpoint does not use are
/// ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChatBody {
    pub system: Option<String>,
    pub user: Option<String>,
    pub temperature: Option<f64>,
    pub json: Option<bool>,
    pub reasoning_effort: Option<String>,
    pub model: Option<String>,
    pub tool_call: Option<ToolCallBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ToolCallBody {
    pub name: String,
    /// Required. Any JSON value is accepted; the dispatcher rejects
    /// non-object arguments as a tool failure.
    pub arguments: Value,
    pub call_id: Option<String>,
}

/// A validated request, ready for the orchestration layer.
#[derive(Debug)]
pub(super) struct Prepared {
    pub turn: ConversationTurn,
    pub options: RequestOptions,
}

pub(super) fn parse_body(bytes: &[u8]) -> Result<ChatBody, ValidationError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::new("Request body must be a JSON object"));
    }
    serde_json::from_slice(bytes)
        .map_err(|err| ValidationError::new(format!("Invalid request body: {err}")))
}

impl ChatBody {
    /// Validate the turn fields and resolve options. `temperature` is only
    /// honoured when `with_temperature` is set.
    pub fn prepare(
        &self,
        conversation: &Conversation,
        with_temperature: bool,
    ) -> Result<Prepared, ValidationError> {
        let user = self.user.as_deref().unwrap_or_default();
        let turn = conversation.turn(self.system.as_deref(), user)?;

        let effort = self
            .reasoning_effort
            .as_deref()
            .map(str::parse::<ReasoningEffort>)
            .transpose()
            .map_err(ValidationError)?;

        let temperature = if with_temperature {
            self.temperature.map(check_temperature).transpose()?
        } else {
            None
        };

        let options = conversation.options(
            self.model.as_deref(),
            self.json.unwrap_or(false),
            effort,
            temperature,
        );
        Ok(Prepared { turn, options })
    }

    /// The tool call a continuation request must carry.
    pub fn tool_call(&self) -> Result<ToolCall, ValidationError> {
        let body = self
            .tool_call
            .as_ref()
            .ok_or_else(|| ValidationError::new("toolCall is required"))?;
        Ok(ToolCall {
            name: body.name.clone(),
            arguments: body.arguments.clone(),
            call_id: body.call_id.clone(),
        })
    }
}

fn check_temperature(value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && (0.0..=2.0).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::new("temperature must be between 0 and 2"))
    }
}

pub(super) fn respond_ok(response: DirectResponse) -> Value {
    json!({
        "ok": true,
        "model": response.model,
        "text": response.text,
        "raw": response.raw,
    })
}

pub(super) fn detect_ok(model: &str, detection: Detection) -> Value {
    json!({
        "ok": true,
        "model": model,
        "toolCall": detection.tool_call,
        "text": detection.text,
        "raw": detection.raw,
    })
}

pub(super) fn detect_failed(model: &str, error: &str) -> Value {
    json!({
        "ok": false,
        "model": model,
        "toolCall": null,
        "text": "",
        "raw": null,
        "error": error,
    })
}

pub(super) fn failed(error: &str) -> Value {
    json!({ "ok": false, "error": error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ChatDefaults;
    use crate::testsupport::StubApi;
    use crate::types::ModelTier;
    use std::sync::Arc;

    fn conversation() -> Conversation {
        Conversation::new(Arc::new(StubApi::new(vec![])), ChatDefaults::default())
    }

    #[test]
    fn malformed_and_empty_bodies_are_rejected() {
        assert!(parse_body(b"").is_err());
        assert!(parse_body(b"  \n").is_err());
        let err = parse_body(b"{\"user\": ").unwrap_err();
        assert!(err.to_string().starts_with("Invalid request body"), "{err}");
        let err = parse_body(br#"{"user":"hi","temperature":"warm"}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid request body"));
    }

    #[test]
    fn prepare_requires_user_prompt() {
        let conv = conversation();
        let body = parse_body(br#"{"system":"s"}"#).unwrap();
        assert_eq!(
            body.prepare(&conv, false).unwrap_err().to_string(),
            "User prompt is required"
        );
        let body = parse_body(br#"{"user":""}"#).unwrap();
        assert!(body.prepare(&conv, false).is_err());
    }

    #[test]
    fn prepare_rejects_unknown_effort() {
        let conv = conversation();
        let body = parse_body(br#"{"user":"hi","reasoningEffort":"extreme"}"#).unwrap();
        let err = body.prepare(&conv, false).unwrap_err();
        assert!(err.to_string().contains("extreme"));

        let body = parse_body(br#"{"user":"hi","reasoningEffort":"HIGH"}"#).unwrap();
        assert!(body.prepare(&conv, false).is_err());
    }

    #[test]
    fn whitespace_user_prompt_is_non_empty() {
        let conv = conversation();
        let body = parse_body(br#"{"user":"  "}"#).unwrap();
        assert_eq!(body.prepare(&conv, false).unwrap().turn.user_prompt, "  ");
    }

    #[test]
    fn temperature_only_counts_where_accepted() {
        let conv = conversation();
        let body = parse_body(br#"{"user":"hi","temperature":0.4,"model":"gpt-4o"}"#).unwrap();
        let prepared = body.prepare(&conv, true).unwrap();
        assert_eq!(
            prepared.options.tier,
            ModelTier::Legacy {
                temperature: Some(0.4)
            }
        );
        let prepared = body.prepare(&conv, false).unwrap();
        assert_eq!(prepared.options.tier, ModelTier::Legacy { temperature: None });

        let hot = parse_body(br#"{"user":"hi","temperature":2.5}"#).unwrap();
        assert!(hot.prepare(&conv, true).is_err());
        assert!(hot.prepare(&conv, false).is_ok());
    }

    #[test]
    fn prepare_applies_defaults() {
        let conv = conversation();
        let body = parse_body(br#"{"user":"hi","json":true}"#).unwrap();
        let prepared = body.prepare(&conv, false).unwrap();
        assert_eq!(prepared.turn.system_prompt, "You are a helpful API tutor.");
        assert_eq!(prepared.options.model, "gpt-4.1-mini");
        assert!(prepared.options.json_mode);
    }

    #[test]
    fn tool_call_and_its_arguments_are_required() {
        let body = parse_body(br#"{"user":"hi"}"#).unwrap();
        assert_eq!(body.tool_call().unwrap_err().to_string(), "toolCall is required");

        let err = parse_body(br#"{"user":"hi","toolCall":{"name":"calculate"}}"#).unwrap_err();
        assert!(err.to_string().starts_with("Invalid request body"), "{err}");
        assert!(err.to_string().contains("arguments"), "{err}");

        let body =
            parse_body(br#"{"user":"hi","toolCall":{"name":"calculate","arguments":"2+2"}}"#)
                .unwrap();
        assert_eq!(body.tool_call().unwrap().arguments, json!("2+2"));

        let body = parse_body(
            br#"{"user":"hi","toolCall":{"name":"calculate","arguments":{"expression":"2+2"},"callId":"c1"}}"#,
        )
        .unwrap();
        let call = body.tool_call().unwrap();
        assert_eq!(call.arguments["expression"], "2+2");
        assert_eq!(call.call_id.as_deref(), Some("c1"));
    }

    #[test]
    fn detect_failure_keeps_success_shape() {
        let value = detect_failed("gpt-4.1-mini", "boom");
        assert_eq!(value["ok"], false);
        assert!(value["toolCall"].is_null());
        assert_eq!(value["text"], "");
        assert_eq!(value["error"], "boom");
    }
}
