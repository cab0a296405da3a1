//! LLM access.
//!
//! Messages use the OpenAI chat-completions shape so they can be sent as-is to
//! any compatible endpoint (Gemini exposes one).

mod openai;
#[cfg(test)]
pub(crate) mod testing;

use std::collections::BTreeMap;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use openai::OpenAiCompatClient;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request could not be built: {0}")]
    Request(String),

    #[error("LLM endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM stream failed: {0}")]
    Stream(String),

    #[error("Malformed LLM stream event: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// Assistant message that requests tool calls. Content is dropped when
    /// empty, as most endpoints reject `""` next to `tool_calls`.
    pub fn assistant_tool_calls(content: String, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: (!content.is_empty()).then_some(content),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,

    #[serde(rename = "type", default = "function_type")]
    pub kind: String,

    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,

    /// JSON-encoded arguments, exactly as produced by the model
    pub arguments: String,
}

impl ToolCall {
    /// Parsed arguments; malformed JSON yields an empty object.
    pub fn parsed_arguments(&self) -> Value {
        if self.function.arguments.trim().is_empty() {
            return Value::Object(Default::default());
        }
        serde_json::from_str(&self.function.arguments)
            .unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

fn function_type() -> String {
    "function".to_string()
}

/// Tool advertised to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn function(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            kind: function_type(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// Incremental piece of a streamed completion.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Text(String),
    ToolCallDelta(ToolCallDelta),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallDelta {
    /// Position of the call in the response; some endpoints omit it
    pub index: Option<usize>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

pub type ChunkStream = Pin<Box<dyn Stream<Item = anyhow::Result<StreamChunk>> + Send>>;

/// Streaming chat-completion client.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat_completion_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> anyhow::Result<ChunkStream>;
}

/// Reassembles tool calls from streamed deltas.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<usize, PartialToolCall>,
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

impl ToolCallAccumulator {
    pub fn push(&mut self, delta: ToolCallDelta) {
        let index = match delta.index {
            Some(index) => index,
            None => {
                // Without an index, a fresh id starts a new call
                let last = self.calls.iter().next_back();
                match (last, &delta.id) {
                    (Some((idx, call)), Some(id)) if call.id.as_deref() != Some(id.as_str()) => {
                        idx + 1
                    }
                    (Some((idx, _)), _) => *idx,
                    (None, _) => 0,
                }
            }
        };

        let call = self.calls.entry(index).or_default();
        if let Some(id) = delta.id {
            call.id = Some(id);
        }
        if let Some(name) = delta.name {
            call.name.push_str(&name);
        }
        if let Some(arguments) = delta.arguments {
            call.arguments.push_str(&arguments);
        }
    }

    /// Completed calls in index order. Calls without a name are dropped;
    /// missing ids are synthesized.
    pub fn finish(self) -> Vec<ToolCall> {
        self.calls
            .into_iter()
            .filter(|(_, call)| !call.name.is_empty())
            .map(|(index, call)| ToolCall {
                id: call
                    .id
                    .unwrap_or_else(|| format!("call_{}_{}", index, uuid::Uuid::new_v4().simple())),
                kind: function_type(),
                function: FunctionCall {
                    name: call.name,
                    arguments: call.arguments,
                },
            })
            .collect()
    }
}
