use anyhow::Result;
use futures::StreamExt;
use serde_json::{json, Value};

use crate::models::message::Message;
use crate::providers::base::Provider;
use crate::providers::utils::ToolCallAccumulator;
use crate::toolkit::Toolkit;

pub const SYSTEM_PROMPT: &str = "You are an expert AI coding assistant with access to powerful tools. \
You can read and write files, list directory contents, execute Python code, and run bash commands. \
Use these tools to help the user with their coding tasks. \
When you need information from the filesystem or need to run code, use the appropriate tool rather than guessing.";

/// Receives the agent's output as it is produced.
///
/// The agent never writes to stdout itself; all user-visible output goes
/// through this trait so callers decide how to render it.
pub trait ReplySink: Send {
    /// A text fragment, echoed as it streams in.
    fn on_content(&mut self, fragment: &str);
    /// A tool is about to run.
    fn on_tool_call(&mut self, name: &str);
    /// A tool finished and its result was fed back to the model.
    fn on_tool_result(&mut self);
}

/// Conversation driver: holds the history, streams completions, and runs
/// model-requested tools.
pub struct Agent {
    provider: Box<dyn Provider>,
    toolkit: Toolkit,
    history: Vec<Message>,
}

impl Agent {
    pub fn new(provider: Box<dyn Provider>) -> Self {
        Self::with_toolkit(provider, Toolkit::new())
    }

    pub fn with_toolkit(provider: Box<dyn Provider>, toolkit: Toolkit) -> Self {
        Self {
            provider,
            toolkit,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Process one user turn.
    ///
    /// Streams the completion, echoing text to the sink as it arrives. If
    /// the model requested tools, each is executed in arrival order, its
    /// result appended to the history, and a single follow-up completion is
    /// streamed. Tool requests in the follow-up are not serviced; their
    /// text content is still echoed.
    pub async fn reply(&mut self, user_text: &str, sink: &mut dyn ReplySink) -> Result<()> {
        self.history.push(Message::user(user_text));

        let mut stream = self
            .provider
            .stream(SYSTEM_PROMPT, &self.history, self.toolkit.tools())
            .await?;

        let mut full_text = String::new();
        let mut accumulator = ToolCallAccumulator::default();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Some(fragment) = chunk.content {
                sink.on_content(&fragment);
                full_text.push_str(&fragment);
            }
            for delta in chunk.tool_calls {
                accumulator.apply(delta);
            }
        }

        self.history.push(Message::assistant(&full_text));

        if accumulator.is_empty() {
            return Ok(());
        }

        for call in accumulator.finish() {
            sink.on_tool_call(&call.name);

            let args: Value = serde_json::from_str(&call.arguments).unwrap_or_else(|_| json!({}));
            let result = self.toolkit.dispatch(&call.name, &args).await;

            self.history.push(Message::user(format!(
                "Tool \"{}\" returned: {}",
                call.name, result
            )));
            sink.on_tool_result();
        }

        let mut followup = self
            .provider
            .stream(SYSTEM_PROMPT, &self.history, self.toolkit.tools())
            .await?;

        let mut followup_text = String::new();
        while let Some(chunk) = followup.next().await {
            let chunk = chunk?;
            if let Some(fragment) = chunk.content {
                sink.on_content(&fragment);
                followup_text.push_str(&fragment);
            }
        }

        self.history.push(Message::assistant(&followup_text));

        Ok(())
    }
}
