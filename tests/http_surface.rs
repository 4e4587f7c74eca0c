//! End-to-end checks of the HTTP surface: the real router and API client
//! talking to a scripted `/responses` service on a local port.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use toolrelay::api::ApiClient;
use toolrelay::config::ApiConfig;
use toolrelay::conversation::{ChatDefaults, Conversation};
use toolrelay::server::{router, AppState};

type Seen = Arc<Mutex<Vec<Value>>>;

fn sse(events: &[Value]) -> String {
    let mut body = String::new();
    for event in events {
        let kind = event["type"].as_str().unwrap_or("message");
        body.push_str(&format!("event: {kind}\ndata: {event}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

/// Scripted remote service:
/// - streaming calls answer with text deltas, mentioning the tool output if
///   one was supplied;
/// - buffered calls offering tools propose `getServerTime` for prompts that
///   mention a time, otherwise answer in text.
async fn fake_responses(State(seen): State<Seen>, Json(body): Json<Value>) -> Response {
    seen.lock().unwrap().push(body.clone());
    let input = body["input"].as_array().cloned().unwrap_or_default();
    let user = input
        .iter()
        .filter(|item| item["role"] == "user")
        .filter_map(|item| item["content"][0]["text"].as_str())
        .last()
        .unwrap_or_default()
        .to_string();
    let tool_output = input
        .iter()
        .find(|item| item["type"] == "function_call_output")
        .and_then(|item| item["output"].as_str())
        .map(str::to_string);

    if body["stream"] == true {
        let text = match tool_output {
            Some(output) => {
                let output: Value = serde_json::from_str(&output).unwrap_or(Value::Null);
                match output["formatted"].as_str() {
                    Some(formatted) => format!("It is {formatted} in Tokyo."),
                    None => format!("Tool said: {output}"),
                }
            }
            None => format!("Echo: {user}"),
        };
        let words: Vec<Value> = text
            .split_inclusive(' ')
            .map(|piece| json!({ "type": "response.output_text.delta", "delta": piece }))
            .collect();
        let mut events = vec![json!({ "type": "response.created" })];
        events.extend(words);
        events.push(json!({ "type": "response.completed" }));
        return (
            [(header::CONTENT_TYPE, "text/event-stream")],
            sse(&events),
        )
            .into_response();
    }

    let offers_tools = body["tools"].as_array().is_some_and(|tools| !tools.is_empty());
    if offers_tools && user.contains("time") {
        return Json(json!({
            "id": "resp_detect",
            "output": [{
                "type": "function_call",
                "call_id": "call_abc",
                "name": "getServerTime",
                "arguments": "{\"timeZone\":\"Asia/Tokyo\"}"
            }]
        }))
        .into_response();
    }
    Json(json!({
        "id": "resp_text",
        "output_text": format!("Echo: {user}"),
        "output": []
    }))
    .into_response()
}

async fn spawn_remote() -> (SocketAddr, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/v1/responses", post(fake_responses))
        .with_state(seen.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, seen)
}

async fn spawn_relay() -> (String, Seen) {
    let (remote, seen) = spawn_remote().await;
    let client = ApiClient::new(&ApiConfig {
        base_url: format!("http://{remote}/v1"),
        api_key: "sk-test".to_string(),
        model: "gpt-4.1-mini".to_string(),
        timeout_secs: 10,
    });
    let conversation = Conversation::new(Arc::new(client), ChatDefaults::default());
    let app = router(AppState::new(conversation, CancellationToken::new()), false);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

async fn post_json(url: &str, body: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(url)
        .json(&body)
        .send()
        .await
        .expect("request")
}

#[tokio::test]
async fn tokyo_time_runs_detect_then_continue() {
    let (base, seen) = spawn_relay().await;

    let detection: Value = post_json(
        &format!("{base}/api/tools/detect"),
        json!({ "user": "What time is it in Tokyo?" }),
    )
    .await
    .json()
    .await
    .unwrap();
    assert_eq!(detection["ok"], true);
    assert_eq!(detection["model"], "gpt-4.1-mini");
    let tool_call = detection["toolCall"].clone();
    assert_eq!(tool_call["name"], "getServerTime");
    assert!(tool_call["arguments"]["timeZone"]
        .as_str()
        .unwrap()
        .contains("Tokyo"));

    let response = post_json(
        &format!("{base}/api/tools/continue"),
        json!({ "user": "What time is it in Tokyo?", "toolCall": tool_call }),
    )
    .await;
    assert_eq!(response.status(), 200);
    let text = response.text().await.unwrap();
    assert!(text.starts_with("It is "), "{text}");
    assert!(text.ends_with(" in Tokyo."), "{text}");

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0]["tool_choice"], "auto");
    assert_eq!(seen[0]["tools"].as_array().unwrap().len(), 4);
    let replay = seen[1]["input"].as_array().unwrap();
    assert_eq!(replay[2]["type"], "function_call");
    assert_eq!(replay[2]["call_id"], "call_abc");
    assert_eq!(replay[3]["type"], "function_call_output");
    assert_eq!(replay[3]["call_id"], "call_abc");
}

#[tokio::test]
async fn detect_without_tool_returns_text() {
    let (base, _) = spawn_relay().await;
    let detection: Value = post_json(
        &format!("{base}/api/tools/detect"),
        json!({ "user": "Explain X in 3 bullets" }),
    )
    .await
    .json()
    .await
    .unwrap();
    assert!(detection["toolCall"].is_null());
    assert_eq!(detection["text"], "Echo: Explain X in 3 bullets");
}

#[tokio::test]
async fn streamed_text_matches_buffered_text() {
    let (base, seen) = spawn_relay().await;
    let buffered: Value = post_json(&format!("{base}/api/respond"), json!({ "user": "hello there" }))
        .await
        .json()
        .await
        .unwrap();
    let streamed = post_json(
        &format!("{base}/api/respond/stream"),
        json!({ "user": "hello there" }),
    )
    .await
    .text()
    .await
    .unwrap();
    assert_eq!(buffered["text"], streamed);

    let seen = seen.lock().unwrap().clone();
    assert!(seen[0].get("tools").is_none());
    assert!(seen[1].get("tools").is_none());
}

#[tokio::test]
async fn reasoning_models_get_effort_not_temperature() {
    let (base, seen) = spawn_relay().await;
    let response = post_json(
        &format!("{base}/api/respond"),
        json!({ "user": "hi", "model": "gpt-5-mini", "temperature": 0.2, "reasoningEffort": "low" }),
    )
    .await;
    assert_eq!(response.status(), 200);

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen[0]["model"], "gpt-5-mini");
    assert_eq!(seen[0]["reasoning"]["effort"], "low");
    assert!(seen[0].get("temperature").is_none());
}

#[tokio::test]
async fn unknown_tool_is_narrated_not_rejected() {
    let (base, seen) = spawn_relay().await;
    let response = post_json(
        &format!("{base}/api/tools/continue"),
        json!({ "user": "format my disk", "toolCall": { "name": "formatDisk", "arguments": {} } }),
    )
    .await;
    assert_eq!(response.status(), 200);
    let text = response.text().await.unwrap();
    assert!(text.contains("Unknown tool: formatDisk"), "{text}");
    assert_eq!(seen.lock().unwrap().len(), 1);
}
