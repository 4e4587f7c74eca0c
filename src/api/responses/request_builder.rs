//! Helpers for translating a [`ResponsesRequest`] into a `/responses` payload.

use crate::api::{InputItem, ResponsesRequest, Role};
use crate::types::ModelTier;
use serde_json::{json, Map, Value};

/// Build the provider payload for `POST /responses`.
pub(super) fn build_responses_payload(request: &ResponsesRequest, stream: bool) -> Value {
    let options = &request.options;
    let input = request
        .input
        .iter()
        .map(input_item_to_wire)
        .collect::<Vec<_>>();

    let mut payload = Map::new();
    payload.insert("model".to_string(), Value::String(options.model.clone()));
    payload.insert("input".to_string(), Value::Array(input));

    if !request.tools.is_empty() {
        // Function-tool shape expected by `/responses`.
        let tools = request
            .tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                })
            })
            .collect::<Vec<_>>();
        payload.insert("tools".to_string(), Value::Array(tools));
        payload.insert("tool_choice".to_string(), Value::String("auto".to_string()));
    }
    if options.json_mode {
        payload.insert(
            "text".to_string(),
            json!({ "format": { "type": "json_object" } }),
        );
    }
    // Effort and temperature are mutually exclusive per request.
    match options.tier {
        ModelTier::Reasoning { effort } => {
            payload.insert("reasoning".to_string(), json!({ "effort": effort.as_str() }));
        }
        ModelTier::Legacy {
            temperature: Some(temperature),
        } => {
            payload.insert("temperature".to_string(), Value::from(temperature));
        }
        ModelTier::Legacy { temperature: None } => {}
    }
    if stream {
        payload.insert("stream".to_string(), Value::Bool(true));
    }
    Value::Object(payload)
}

/// Convert one input item into its `/responses` wire form.
fn input_item_to_wire(item: &InputItem) -> Value {
    match item {
        InputItem::Message { role, text } => json!({
            "type": "message",
            "role": role_to_wire(*role),
            "content": [ { "type": "input_text", "text": text } ]
        }),
        InputItem::FunctionCall {
            call_id,
            name,
            arguments,
        } => json!({
            "type": "function_call",
            "call_id": call_id,
            "name": name,
            "arguments": arguments,
        }),
        InputItem::FunctionCallOutput { call_id, output } => json!({
            "type": "function_call_output",
            "call_id": call_id,
            "output": output,
        }),
    }
}

fn role_to_wire(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
    }
}
