use anyhow::{anyhow, Result};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{CompletionStream, Provider, StreamChunk};
use super::utils::{chunk_from_payload, messages_to_spec, tools_to_spec};
use crate::models::message::Message;
use crate::models::tool::Tool;

pub const GROQ_HOST: &str = "https://api.groq.com";
pub const GROQ_DEFAULT_MODEL: &str = "mixtral-8x7b-32768";

const DEFAULT_MAX_TOKENS: i32 = 8192;
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone)]
pub struct GroqProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: i32,
    pub temperature: f32,
}

impl GroqProviderConfig {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            host: GROQ_HOST.to_string(),
            api_key: api_key.into(),
            model: GROQ_DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

pub struct GroqProvider {
    client: Client,
    config: GroqProviderConfig,
}

impl GroqProvider {
    pub fn new(config: GroqProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn build_payload(&self, system: &str, messages: &[Message], tools: &[Tool]) -> Result<Value> {
        let mut payload = json!({
            "model": self.config.model,
            "messages": messages_to_spec(system, messages),
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "stream": true,
        });

        if !tools.is_empty() {
            payload
                .as_object_mut()
                .expect("payload is an object")
                .insert("tools".to_string(), json!(tools_to_spec(tools)?));
        }

        Ok(payload)
    }
}

/// Accumulates raw network bytes and yields complete lines.
///
/// Chunks are buffered as bytes, not text: a chunk boundary can fall
/// inside a multi-byte UTF-8 sequence, so decoding happens only once the
/// line's newline has arrived.
struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    fn next_line(&mut self) -> Option<String> {
        let newline = self.bytes.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.bytes.drain(..=newline).collect();
        let line = &line[..line.len() - 1];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        Some(String::from_utf8_lossy(line).into_owned())
    }
}

#[async_trait]
impl Provider for GroqProvider {
    async fn stream(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<CompletionStream> {
        let url = format!(
            "{}/openai/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );
        let payload = self.build_payload(system, messages, tools)?;

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Request failed: {}\n{}", status, body));
        }

        let mut bytes = response.bytes_stream();

        Ok(Box::pin(try_stream! {
            // Network chunks do not align with SSE event boundaries, so
            // partial lines are buffered until their newline arrives.
            let mut buffer = LineBuffer::new();
            let mut done = false;

            while let Some(chunk) = bytes.next().await {
                let chunk = chunk?;
                buffer.push(&chunk);

                while let Some(line) = buffer.next_line() {
                    let Some(payload) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    if payload == "[DONE]" {
                        done = true;
                        break;
                    }
                    let Ok(value) = serde_json::from_str::<Value>(payload) else {
                        continue;
                    };
                    if let Some(parsed) = chunk_from_payload(&value) {
                        yield parsed;
                    }
                }

                if done {
                    break;
                }
            }
        }))
    }
}
