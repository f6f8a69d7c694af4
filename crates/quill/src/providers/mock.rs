use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::base::{CompletionStream, Provider, StreamChunk};
use crate::models::message::Message;
use crate::models::tool::Tool;

/// A scripted provider for tests: each call to `stream` plays back the
/// next pre-configured chunk sequence, or an empty stream once exhausted.
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Vec<StreamChunk>>>>,
    calls: Arc<Mutex<usize>>,
}

impl MockProvider {
    pub fn new(responses: Vec<Vec<StreamChunk>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// How many streamed requests have been issued so far.
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn call_counter(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn stream(
        &self,
        _system: &str,
        _messages: &[Message],
        _tools: &[Tool],
    ) -> Result<CompletionStream> {
        *self.calls.lock().unwrap() += 1;

        let chunks = {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Vec::new()
            } else {
                responses.remove(0)
            }
        };

        Ok(Box::pin(futures::stream::iter(chunks.into_iter().map(Ok))))
    }
}
