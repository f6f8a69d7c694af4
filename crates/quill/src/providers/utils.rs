use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use super::base::{StreamChunk, ToolCallDelta};
use crate::models::message::Message;
use crate::models::tool::{Tool, ToolCall};

/// Convert the system prompt plus history into the provider's message
/// array. The system message is synthesized fresh each call and always
/// goes first.
pub fn messages_to_spec(system: &str, messages: &[Message]) -> Vec<Value> {
    let mut spec = vec![json!({
        "role": "system",
        "content": system,
    })];
    spec.extend(messages.iter().map(|message| {
        json!({
            "role": message.role,
            "content": message.content,
        })
    }));
    spec
}

/// Convert tool declarations to the provider's function-calling spec.
pub fn tools_to_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

#[derive(Deserialize, Default)]
struct WireDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCallDelta>>,
}

#[derive(Deserialize, Default)]
struct WireToolCallDelta {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<WireFunctionDelta>,
}

#[derive(Deserialize, Default)]
struct WireFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Parse one SSE `data:` payload into a `StreamChunk`. Payloads without a
/// delta (keep-alives, usage-only frames) yield `None`.
pub fn chunk_from_payload(payload: &Value) -> Option<StreamChunk> {
    let delta = payload.get("choices")?.get(0)?.get("delta")?;
    let wire: WireDelta = serde_json::from_value(delta.clone()).ok()?;

    let tool_calls = wire
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|delta| ToolCallDelta {
            index: delta.index,
            id: delta.id,
            name: delta.function.as_ref().and_then(|f| f.name.clone()),
            arguments: delta.function.and_then(|f| f.arguments),
        })
        .collect::<Vec<_>>();

    if wire.content.is_none() && tool_calls.is_empty() {
        return None;
    }

    Some(StreamChunk {
        content: wire.content,
        tool_calls,
    })
}

/// Reassembles streamed tool-call fragments into complete calls.
///
/// A fragment with a non-empty id opens a new record. Later fragments are
/// routed by `index` when the provider sends one, otherwise to the most
/// recently opened record. Name fragments overwrite (providers send the
/// name whole); argument fragments are concatenated in arrival order.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: Vec<PendingCall>,
}

#[derive(Debug, Default)]
struct PendingCall {
    id: String,
    name: String,
    arguments: String,
}

impl ToolCallAccumulator {
    pub fn apply(&mut self, delta: ToolCallDelta) {
        if let Some(id) = delta.id.as_deref() {
            if !id.is_empty() {
                self.calls.push(PendingCall {
                    id: id.to_string(),
                    ..PendingCall::default()
                });
            }
        }

        let call = match delta.index {
            Some(index) if index < self.calls.len() => &mut self.calls[index],
            _ => match self.calls.last_mut() {
                Some(call) => call,
                // A nameless fragment before any call opened; drop it.
                None => return,
            },
        };

        if let Some(name) = delta.name {
            if !name.is_empty() {
                call.name = name;
            }
        }
        if let Some(arguments) = delta.arguments {
            call.arguments.push_str(&arguments);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// The completed calls, in the order their ids arrived.
    pub fn finish(self) -> Vec<ToolCall> {
        self.calls
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.name,
                arguments: call.arguments,
            })
            .collect()
    }
}
