//! Streaming client for OpenAI-compatible `/chat/completions` endpoints.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest_eventsource::retry::Never;
use reqwest_eventsource::{Event, EventSource};
use serde::{Deserialize, Serialize};

use super::{
    ChatMessage, ChunkStream, LlmClient, LlmError, StreamChunk, ToolCallDelta, ToolDefinition,
};

pub struct OpenAiCompatClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiCompatClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<StreamToolCall>>,
}

#[derive(Debug, Deserialize)]
struct StreamToolCall {
    index: Option<usize>,
    id: Option<String>,
    function: Option<StreamFunction>,
}

#[derive(Debug, Deserialize)]
struct StreamFunction {
    name: Option<String>,
    arguments: Option<String>,
}

fn chunks_from_event(data: &str) -> Result<Vec<StreamChunk>, LlmError> {
    let parsed: StreamResponse =
        serde_json::from_str(data).map_err(|e| LlmError::Decode(e.to_string()))?;

    let mut chunks = Vec::new();
    for choice in parsed.choices {
        if let Some(content) = choice.delta.content {
            if !content.is_empty() {
                chunks.push(StreamChunk::Text(content));
            }
        }
        for call in choice.delta.tool_calls.unwrap_or_default() {
            let (name, arguments) = match call.function {
                Some(f) => (f.name, f.arguments),
                None => (None, None),
            };
            chunks.push(StreamChunk::ToolCallDelta(ToolCallDelta {
                index: call.index,
                id: call.id,
                name,
                arguments,
            }));
        }
    }
    Ok(chunks)
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn chat_completion_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> anyhow::Result<ChunkStream> {
        let body = ChatCompletionRequest {
            model,
            messages,
            tools: tools.filter(|t| !t.is_empty()),
            stream: true,
        };
        let request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);

        let mut source =
            EventSource::new(request).map_err(|e| LlmError::Request(e.to_string()))?;
        // A finished completion must not be re-requested
        source.set_retry_policy(Box::new(Never));

        tracing::debug!(model, messages = messages.len(), "Streaming chat completion");

        let stream = async_stream::stream! {
            while let Some(event) = source.next().await {
                match event {
                    Ok(Event::Open) => {}
                    Ok(Event::Message(message)) => {
                        let data = message.data.trim();
                        if data == "[DONE]" {
                            break;
                        }
                        match chunks_from_event(data) {
                            Ok(chunks) => {
                                for chunk in chunks {
                                    yield Ok(chunk);
                                }
                            }
                            Err(e) => {
                                yield Err(anyhow::Error::from(e));
                                break;
                            }
                        }
                    }
                    Err(reqwest_eventsource::Error::StreamEnded) => break,
                    Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                        let body = response.text().await.unwrap_or_default();
                        yield Err(anyhow::Error::from(LlmError::Status {
                            status: status.as_u16(),
                            body,
                        }));
                        break;
                    }
                    Err(e) => {
                        yield Err(anyhow::Error::from(LlmError::Stream(e.to_string())));
                        break;
                    }
                }
            }
            source.close();
        };

        Ok(Box::pin(stream))
    }
}
