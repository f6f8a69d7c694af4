use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::models::message::Message;
use crate::models::tool::Tool;

/// One streamed fragment of a tool call.
///
/// Providers may spread a single call across many chunks: the id arrives
/// first, the name and argument text follow in later fragments. A fragment
/// carrying a non-empty `id` opens a new call; fragments without one
/// address an already-open call (see `ToolCallAccumulator`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallDelta {
    pub index: Option<usize>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// One incremental chunk of a streamed completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamChunk {
    /// Text fragment to echo immediately
    pub content: Option<String>,
    /// Partial tool-call fragments carried by this chunk
    pub tool_calls: Vec<ToolCallDelta>,
}

impl StreamChunk {
    pub fn text<S: Into<String>>(content: S) -> Self {
        StreamChunk {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_delta(delta: ToolCallDelta) -> Self {
        StreamChunk {
            content: None,
            tool_calls: vec![delta],
        }
    }
}

pub type CompletionStream = BoxStream<'static, Result<StreamChunk>>;

/// A model provider reachable over a streaming completions API.
///
/// Injected into the agent so tests can substitute a scripted fake.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Open a streamed completion for the given system prompt, history,
    /// and tool declarations.
    async fn stream(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<CompletionStream>;
}
