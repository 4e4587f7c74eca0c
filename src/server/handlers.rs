//! Route handlers.
//!
//! Each request runs under its own cancellation token, a child of the server
//! shutdown token. The token's drop guard lives as long as the response: for
//! streaming routes it moves into the body, so a client that disconnects
//! mid-stream cancels the upstream call.

use super::wire::{self, Prepared};
use super::SharedState;
use crate::api::DeltaStream;
use crate::error::{ChatError, ValidationError};
use crate::tools;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde_json::json;
use tokio_util::sync::DropGuard;
use tracing::{debug, info, warn};

pub(super) async fn health() -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub(super) async fn list_tools() -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "tools": tools::catalog(),
    }))
}

/// `POST /api/respond`: one buffered answer, no tools.
pub(super) async fn respond(State(state): State<SharedState>, body: Bytes) -> Response {
    let cancel = state.request_token();
    let _guard = cancel.clone().drop_guard();

    let Prepared { turn, options } = match prepare(&state, &body, true) {
        Ok(prepared) => prepared,
        Err(err) => return rejected(&err),
    };
    match state.conversation.respond_once(&turn, &options, &cancel).await {
        Ok(response) => Json(wire::respond_ok(response)).into_response(),
        Err(err) => failure_response(&err, wire::failed(&err.to_string())),
    }
}

/// `POST /api/respond/stream`: answer text streamed as it is generated.
pub(super) async fn respond_stream(State(state): State<SharedState>, body: Bytes) -> Response {
    let cancel = state.request_token();
    let guard = cancel.clone().drop_guard();

    let Prepared { turn, options } = match prepare(&state, &body, false) {
        Ok(prepared) => prepared,
        Err(err) => return rejected(&err),
    };
    match state
        .conversation
        .respond_stream(&turn, &options, &cancel)
        .await
    {
        Ok(deltas) => text_stream(deltas, guard),
        Err(err) => failure_response(&err, wire::failed(&err.to_string())),
    }
}

/// `POST /api/tools/detect`: ask whether the turn needs a tool.
pub(super) async fn detect(State(state): State<SharedState>, body: Bytes) -> Response {
    let cancel = state.request_token();
    let _guard = cancel.clone().drop_guard();

    let parsed = wire::parse_body(&body);
    let model = parsed
        .as_ref()
        .ok()
        .and_then(|body| body.model.as_deref())
        .map(str::trim)
        .filter(|model| !model.is_empty())
        .unwrap_or(state.conversation.defaults().model.as_str())
        .to_string();

    let prepared = parsed.and_then(|body| body.prepare(&state.conversation, false));
    let Prepared { turn, options } = match prepared {
        Ok(prepared) => prepared,
        Err(err) => {
            debug!(error = %err, "detect request rejected");
            let body = wire::detect_failed(&model, &err.to_string());
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };
    match state.conversation.detect(&turn, &options, &cancel).await {
        Ok(detection) => Json(wire::detect_ok(&options.model, detection)).into_response(),
        Err(err) => failure_response(&err, wire::detect_failed(&options.model, &err.to_string())),
    }
}

/// `POST /api/tools/continue`: run the tool, then stream the model's answer.
pub(super) async fn continue_with_tool(State(state): State<SharedState>, body: Bytes) -> Response {
    let cancel = state.request_token();
    let guard = cancel.clone().drop_guard();

    let prepared = wire::parse_body(&body).and_then(|body| {
        let prepared = body.prepare(&state.conversation, false)?;
        Ok((prepared, body.tool_call()?))
    });
    let (Prepared { turn, options }, call) = match prepared {
        Ok(prepared) => prepared,
        Err(err) => return rejected(&err),
    };
    match state
        .conversation
        .continue_with_tool(&turn, call, &options, &cancel)
        .await
    {
        Ok((exchange, deltas)) => {
            debug!(
                tool = %exchange.call.name,
                result = %exchange.result.to_json_string(),
                "continuing after tool"
            );
            text_stream(deltas, guard)
        }
        Err(err) => failure_response(&err, wire::failed(&err.to_string())),
    }
}

fn prepare(
    state: &SharedState,
    body: &[u8],
    with_temperature: bool,
) -> Result<Prepared, ValidationError> {
    wire::parse_body(body)?.prepare(&state.conversation, with_temperature)
}

fn rejected(err: &ValidationError) -> Response {
    debug!(error = %err, "request rejected");
    (StatusCode::BAD_REQUEST, Json(wire::failed(&err.to_string()))).into_response()
}

fn failure_response(err: &ChatError, body: serde_json::Value) -> Response {
    let status = match err {
        ChatError::Cancelled => {
            info!("request cancelled");
            StatusCode::SERVICE_UNAVAILABLE
        }
        ChatError::Validation(_) => StatusCode::BAD_REQUEST,
        ChatError::Api(api) => {
            warn!(error = %api, "remote call failed");
            StatusCode::BAD_REQUEST
        }
    };
    (status, Json(body)).into_response()
}

/// Plain-text streaming body. A mid-stream failure aborts the body so the
/// client sees a broken transfer instead of a clean end.
fn text_stream(deltas: DeltaStream, guard: DropGuard) -> Response {
    let body = deltas.map(move |item| {
        let _held = &guard;
        if let Err(err) = &item {
            warn!(error = %err, "stream failed mid-flight");
        }
        item
    });
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body),
    )
        .into_response()
}
