//! HTTP client for the remote reasoning service's `/responses` endpoint.
//!
//! The API layer is split into:
//! - `responses`: payload building, buffered-response parsing, SSE parsing
//! - `client`: the reqwest-backed [`ApiClient`] and its transport helpers

use crate::error::ApiError;
use crate::types::{ConversationTurn, RequestOptions, ToolDescriptor, ToolExchange};
use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use std::pin::Pin;

mod client;
mod responses;

pub use client::ApiClient;
pub(crate) use responses::{last_tool_call, output_text};

/// Incremental text fragments in receipt order. Finite and not restartable.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, ApiError>> + Send>>;

/// Remote reasoning service interface used by the conversation phases.
///
/// This trait lets tests provide deterministic responses without network
/// calls while the production path uses [`ApiClient`].
#[async_trait]
pub trait ResponsesApi: Send + Sync {
    /// One buffered round. Returns the raw response payload.
    async fn create(&self, request: &ResponsesRequest) -> Result<Value, ApiError>;

    /// One streaming round. Yields only text deltas.
    async fn stream(&self, request: &ResponsesRequest) -> Result<DeltaStream, ApiError>;
}

/// One input item of a `/responses` request, in conversation order.
#[derive(Debug, Clone, PartialEq)]
pub enum InputItem {
    Message { role: Role, text: String },
    FunctionCall {
        call_id: String,
        name: String,
        arguments: String,
    },
    FunctionCallOutput { call_id: String, output: String },
}

/// Author role of a message input item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

/// Everything needed for one outbound call.
#[derive(Debug, Clone)]
pub struct ResponsesRequest {
    pub options: RequestOptions,
    pub input: Vec<InputItem>,
    /// Tools offered to the service with automatic selection. Empty means none.
    pub tools: &'static [ToolDescriptor],
}

impl ResponsesRequest {
    /// Assemble `system, user, [tool exchange]` for one turn.
    pub fn for_turn(
        turn: &ConversationTurn,
        exchange: Option<&ToolExchange>,
        options: &RequestOptions,
        tools: &'static [ToolDescriptor],
    ) -> Self {
        let mut input = Vec::with_capacity(4);
        if !turn.system_prompt.trim().is_empty() {
            input.push(InputItem::Message {
                role: Role::System,
                text: turn.system_prompt.clone(),
            });
        }
        input.push(InputItem::Message {
            role: Role::User,
            text: turn.user_prompt.clone(),
        });
        if let Some(exchange) = exchange {
            let call_id = exchange
                .call
                .call_id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("call_{}", exchange.call.name));
            // The service expects arguments as an encoded JSON string.
            let arguments = match &exchange.call.arguments {
                Value::String(raw) => raw.clone(),
                other => other.to_string(),
            };
            input.push(InputItem::FunctionCall {
                call_id: call_id.clone(),
                name: exchange.call.name.clone(),
                arguments,
            });
            input.push(InputItem::FunctionCallOutput {
                call_id,
                output: exchange.result.to_json_string(),
            });
        }
        Self {
            options: options.clone(),
            input,
            tools,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModelTier, ReasoningEffort, ToolCall, ToolResult};
    use serde_json::json;

    fn options() -> RequestOptions {
        RequestOptions {
            model: "gpt-4.1-mini".into(),
            json_mode: false,
            tier: ModelTier::Legacy { temperature: None },
        }
    }

    #[test]
    fn for_turn_orders_system_then_user() {
        let turn = ConversationTurn::new("sys", "hi");
        let req = ResponsesRequest::for_turn(&turn, None, &options(), &[]);
        assert_eq!(
            req.input,
            vec![
                InputItem::Message {
                    role: Role::System,
                    text: "sys".into()
                },
                InputItem::Message {
                    role: Role::User,
                    text: "hi".into()
                },
            ]
        );
    }

    #[test]
    fn for_turn_skips_blank_system_prompt() {
        let turn = ConversationTurn::new("  ", "hi");
        let req = ResponsesRequest::for_turn(&turn, None, &options(), &[]);
        assert_eq!(req.input.len(), 1);
    }

    #[test]
    fn for_turn_appends_tool_exchange_with_synthetic_id() {
        let turn = ConversationTurn::new("sys", "time in tokyo?");
        let exchange = ToolExchange {
            call: ToolCall::new("getServerTime", json!({"timeZone": "Asia/Tokyo"})),
            result: ToolResult::failure("nope"),
        };
        let mut opts = options();
        opts.tier = ModelTier::Reasoning {
            effort: ReasoningEffort::High,
        };
        let req = ResponsesRequest::for_turn(&turn, Some(&exchange), &opts, &[]);
        assert_eq!(req.input.len(), 4);
        assert_eq!(
            req.input[2],
            InputItem::FunctionCall {
                call_id: "call_getServerTime".into(),
                name: "getServerTime".into(),
                arguments: r#"{"timeZone":"Asia/Tokyo"}"#.into(),
            }
        );
        assert_eq!(
            req.input[3],
            InputItem::FunctionCallOutput {
                call_id: "call_getServerTime".into(),
                output: r#"{"error":"nope"}"#.into(),
            }
        );
    }

    #[test]
    fn for_turn_keeps_remote_call_id_and_raw_arguments() {
        let turn = ConversationTurn::new("", "x");
        let mut call = ToolCall::new("calculate", Value::String("{broken".into()));
        call.call_id = Some("call_abc".into());
        let exchange = ToolExchange {
            call,
            result: ToolResult::failure("bad"),
        };
        let req = ResponsesRequest::for_turn(&turn, Some(&exchange), &options(), &[]);
        match &req.input[1] {
            InputItem::FunctionCall {
                call_id, arguments, ..
            } => {
                assert_eq!(call_id, "call_abc");
                assert_eq!(arguments, "{broken");
            }
            other => panic!("unexpected item: {other:?}"),
        }
    }
}
