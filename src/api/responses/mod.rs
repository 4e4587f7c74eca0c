//! `/responses` protocol support.
//!
//! The module is split into:
//! - request builder (`request_builder`)
//! - buffered response parser (`response_parser`)
//! - SSE streaming parser (`sse_parser`)

mod request_builder;
mod response_parser;
mod sse_parser;

use crate::api::{DeltaStream, ResponsesRequest};
use crate::error::ApiError;
use request_builder::build_responses_payload;
pub(crate) use response_parser::{last_tool_call, output_text};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::time::Duration;

/// Send one buffered `/responses` request and return the raw payload.
pub(crate) async fn create(
    http: &reqwest::Client,
    base_url: &str,
    bearer: Option<&str>,
    timeout: Duration,
    request: &ResponsesRequest,
) -> Result<Value, ApiError> {
    let payload = build_responses_payload(request, false);
    let response = send(http, base_url, bearer, &payload, Some(timeout)).await?;
    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|err| ApiError::InvalidResponse(format!("invalid JSON response: {err}")))
}

/// Send one streaming `/responses` request and return its text deltas.
///
/// No overall timeout applies once the stream is open; the caller's
/// cancellation token bounds it instead.
pub(crate) async fn stream(
    http: &reqwest::Client,
    base_url: &str,
    bearer: Option<&str>,
    request: &ResponsesRequest,
) -> Result<DeltaStream, ApiError> {
    let payload = build_responses_payload(request, true);
    let response = send(http, base_url, bearer, &payload, None).await?;

    // Some providers return non-streaming JSON even when stream=true.
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if is_json {
        let body: Value = response.json().await?;
        let text = output_text(&body);
        let items = if text.is_empty() { vec![] } else { vec![Ok(text)] };
        return Ok(Box::pin(futures::stream::iter(items)));
    }

    Ok(sse_parser::delta_stream(response.bytes_stream()))
}

async fn send(
    http: &reqwest::Client,
    base_url: &str,
    bearer: Option<&str>,
    payload: &Value,
    timeout: Option<Duration>,
) -> Result<reqwest::Response, ApiError> {
    let url = format!("{base_url}/responses");
    let mut req = http.post(&url).json(payload);
    if let Some(token) = bearer.filter(|value| !value.trim().is_empty()) {
        req = req.header("Authorization", format!("Bearer {token}"));
    }
    if let Some(timeout) = timeout {
        req = req.timeout(timeout);
    }

    let response = req.send().await?;
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::status(status, body));
    }
    Ok(response)
}
