//! Scripted LLM for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatMessage, ChunkStream, LlmClient, StreamChunk, ToolCallDelta, ToolDefinition};

/// One scripted completion: either chunks to stream or an error to return.
pub enum Reply {
    Chunks(Vec<anyhow::Result<StreamChunk>>),
    Fail(String),
}

impl Reply {
    pub fn text(parts: &[&str]) -> Self {
        Self::Chunks(
            parts
                .iter()
                .map(|p| Ok(StreamChunk::Text(p.to_string())))
                .collect(),
        )
    }

    pub fn tool_call(id: &str, name: &str, arguments: &str) -> Self {
        Self::Chunks(vec![Ok(StreamChunk::ToolCallDelta(ToolCallDelta {
            index: Some(0),
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            arguments: Some(arguments.to_string()),
        }))])
    }
}

/// Replays replies in order and records every request's messages.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat_completion_stream(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        _tools: Option<&[ToolDefinition]>,
    ) -> anyhow::Result<ChunkStream> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Chunks(chunks)) => Ok(Box::pin(futures::stream::iter(chunks))),
            Some(Reply::Fail(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("no scripted reply left")),
        }
    }
}
