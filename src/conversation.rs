//! Conversation orchestration: detection, tool continuation, and direct
//! responses behind one interface.
//!
//! A turn with tools enabled runs a buffered detection round first. When the
//! remote service proposes a tool, the call is dispatched locally and a
//! streaming continuation round relays the model's narration of the result.
//! With tools disabled the turn is a single direct round, buffered or
//! streamed. Every phase takes the caller's [`CancellationToken`]; a cancelled
//! turn ends with [`ChatError::Cancelled`] or a silently closed stream.

use crate::api::{last_tool_call, output_text, DeltaStream, ResponsesApi, ResponsesRequest};
use crate::config::Config;
use crate::error::{ApiError, ChatError, ValidationError};
use crate::tools;
use crate::types::{
    ConversationTurn, Detection, DirectResponse, ModelTier, ReasoningEffort, RequestOptions,
    ToolCall, ToolExchange,
};
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Values applied when a caller leaves a request field out.
#[derive(Debug, Clone)]
pub struct ChatDefaults {
    pub model: String,
    pub system_prompt: String,
    pub reasoning_effort: ReasoningEffort,
    pub reasoning_model_prefix: String,
}

impl ChatDefaults {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.api.model.clone(),
            system_prompt: config.chat.system_prompt.clone(),
            reasoning_effort: config.chat.reasoning_effort,
            reasoning_model_prefix: config.chat.reasoning_model_prefix.clone(),
        }
    }
}

impl Default for ChatDefaults {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// What a full turn produced.
pub enum TurnOutcome {
    /// A buffered final answer.
    Answer(String),
    /// Incremental answer text, optionally preceded by a tool exchange.
    Stream {
        exchange: Option<ToolExchange>,
        deltas: DeltaStream,
    },
}

/// Drives the conversation phases against a remote reasoning service.
#[derive(Clone)]
pub struct Conversation {
    api: Arc<dyn ResponsesApi>,
    defaults: ChatDefaults,
}

impl Conversation {
    pub fn new(api: Arc<dyn ResponsesApi>, defaults: ChatDefaults) -> Self {
        Self { api, defaults }
    }

    pub fn defaults(&self) -> &ChatDefaults {
        &self.defaults
    }

    /// Build a turn, validating the user prompt and defaulting the system one.
    pub fn turn(
        &self,
        system: Option<&str>,
        user: &str,
    ) -> Result<ConversationTurn, ValidationError> {
        if user.is_empty() {
            return Err(ValidationError::new("User prompt is required"));
        }
        let system = system.unwrap_or(self.defaults.system_prompt.as_str());
        Ok(ConversationTurn::new(system, user))
    }

    /// Resolve per-request options once, including the model tier.
    pub fn options(
        &self,
        model: Option<&str>,
        json_mode: bool,
        effort: Option<ReasoningEffort>,
        temperature: Option<f64>,
    ) -> RequestOptions {
        let model = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.defaults.model.as_str())
            .to_string();
        let tier = ModelTier::resolve(
            &model,
            &self.defaults.reasoning_model_prefix,
            effort.unwrap_or(self.defaults.reasoning_effort),
            temperature,
        );
        RequestOptions {
            model,
            json_mode,
            tier,
        }
    }

    /// Detection round: one buffered call offering the full tool catalog.
    pub async fn detect(
        &self,
        turn: &ConversationTurn,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<Detection, ChatError> {
        ensure_user_prompt(turn)?;
        let request = ResponsesRequest::for_turn(turn, None, options, tools::catalog());
        let raw = guarded(cancel, self.api.create(&request)).await?;
        let tool_call = last_tool_call(&raw);
        let text = output_text(&raw);
        info!(
            model = %options.model,
            tool = tool_call.as_ref().map(|call| call.name.as_str()).unwrap_or("-"),
            "detection finished"
        );
        Ok(Detection {
            tool_call,
            text,
            raw,
        })
    }

    /// Continuation round: run `call` locally, then stream the model's answer.
    ///
    /// A failing tool is not an error here; its failure value is fed back to
    /// the model like any other result.
    pub async fn continue_with_tool(
        &self,
        turn: &ConversationTurn,
        call: ToolCall,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<(ToolExchange, DeltaStream), ChatError> {
        ensure_user_prompt(turn)?;
        if call.name.trim().is_empty() {
            return Err(ValidationError::new("Tool call name is required").into());
        }
        let result = tools::dispatch(&call);
        info!(tool = %call.name, failed = result.is_failure(), "tool executed");
        let exchange = ToolExchange { call, result };
        let request =
            ResponsesRequest::for_turn(turn, Some(&exchange), options, tools::catalog());
        let deltas = guarded(cancel, self.api.stream(&request)).await?;
        debug!(model = %options.model, "continuation stream opened");
        Ok((exchange, relay(deltas, cancel)))
    }

    /// Direct round without tools, buffered.
    pub async fn respond_once(
        &self,
        turn: &ConversationTurn,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<DirectResponse, ChatError> {
        ensure_user_prompt(turn)?;
        let request = ResponsesRequest::for_turn(turn, None, options, &[]);
        let raw = guarded(cancel, self.api.create(&request)).await?;
        let text = output_text(&raw);
        info!(model = %options.model, chars = text.len(), "direct response finished");
        Ok(DirectResponse {
            text,
            model: options.model.clone(),
            raw,
        })
    }

    /// Direct round without tools, streamed.
    pub async fn respond_stream(
        &self,
        turn: &ConversationTurn,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<DeltaStream, ChatError> {
        ensure_user_prompt(turn)?;
        let request = ResponsesRequest::for_turn(turn, None, options, &[]);
        let deltas = guarded(cancel, self.api.stream(&request)).await?;
        debug!(model = %options.model, "direct stream opened");
        Ok(relay(deltas, cancel))
    }

    /// Run a whole turn with or without tools.
    ///
    /// With tools, a turn whose detection round needs no tool answers with the
    /// detection text even when `streaming` is set.
    pub async fn run(
        &self,
        turn: &ConversationTurn,
        options: &RequestOptions,
        tools_enabled: bool,
        streaming: bool,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, ChatError> {
        if tools_enabled {
            let detection = self.detect(turn, options, cancel).await?;
            let Some(call) = detection.tool_call else {
                return Ok(TurnOutcome::Answer(detection.text));
            };
            let (exchange, deltas) = self.continue_with_tool(turn, call, options, cancel).await?;
            return Ok(TurnOutcome::Stream {
                exchange: Some(exchange),
                deltas,
            });
        }
        if streaming {
            let deltas = self.respond_stream(turn, options, cancel).await?;
            Ok(TurnOutcome::Stream {
                exchange: None,
                deltas,
            })
        } else {
            let response = self.respond_once(turn, options, cancel).await?;
            Ok(TurnOutcome::Answer(response.text))
        }
    }
}

fn ensure_user_prompt(turn: &ConversationTurn) -> Result<(), ValidationError> {
    if turn.user_prompt.is_empty() {
        return Err(ValidationError::new("User prompt is required"));
    }
    Ok(())
}

/// Await a remote call unless the token fires first.
async fn guarded<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ChatError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("request cancelled before the remote call finished");
            Err(ChatError::Cancelled)
        }
        result = call => result.map_err(ChatError::from),
    }
}

/// Forward deltas until the upstream ends or the token fires. Dropping the
/// upstream closes the remote connection.
fn relay(deltas: DeltaStream, cancel: &CancellationToken) -> DeltaStream {
    Box::pin(deltas.take_until(cancel.clone().cancelled_owned()))
}
