use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool that can be used by a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The name of the tool
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// JSON schema for the parameters the tool accepts
    pub parameters: Value,
}

impl Tool {
    pub fn new<N, D>(name: N, description: D, parameters: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A fully reassembled tool invocation requested by the model.
///
/// `arguments` is the raw concatenated argument text as streamed by the
/// provider; it is expected, but not guaranteed, to parse as a JSON object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Opaque call id assigned by the provider
    pub id: String,
    /// The name of the tool to execute
    pub name: String,
    /// Raw argument text, concatenated from streamed fragments
    pub arguments: String,
}
