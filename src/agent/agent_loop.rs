//! Core agent loop implementation.

use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};

use crate::llm::{ChatMessage, LlmClient, StreamChunk, ToolCall, ToolCallAccumulator, ToolDefinition};
use crate::tools::SharedToolConnection;

use super::events::AgentEvent;
use super::prompt::build_system_prompt;

/// Events of one turn. Ends after `TurnComplete` or the first error.
pub type TurnStream = Pin<Box<dyn Stream<Item = anyhow::Result<AgentEvent>> + Send>>;

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub model: String,
    pub instruction: String,
    pub max_iterations: usize,
}

/// The chat agent for one session.
pub struct Agent {
    settings: AgentSettings,
    llm: Arc<dyn LlmClient>,
    tools: SharedToolConnection,
}

impl Agent {
    pub fn new(settings: AgentSettings, llm: Arc<dyn LlmClient>, tools: SharedToolConnection) -> Self {
        Self {
            settings,
            llm,
            tools,
        }
    }

    /// Run one turn on top of `history`.
    ///
    /// An empty history starts a new conversation with the system prompt.
    /// The returned stream owns everything it needs and may outlive `self`.
    pub fn run_turn(&self, history: Vec<ChatMessage>, message: String) -> TurnStream {
        let settings = self.settings.clone();
        let llm = Arc::clone(&self.llm);
        let tools = Arc::clone(&self.tools);

        Box::pin(async_stream::stream! {
            let descriptors = match tools.list_tools().await {
                Ok(descriptors) => descriptors,
                Err(e) => {
                    yield Err(e.context("Failed to list tools"));
                    return;
                }
            };
            let definitions: Vec<ToolDefinition> =
                descriptors.iter().map(|d| d.to_definition()).collect();

            let mut messages = history;
            if messages.is_empty() {
                messages.push(ChatMessage::system(build_system_prompt(
                    &settings.instruction,
                    &descriptors,
                )));
            }
            messages.push(ChatMessage::user(message));

            for iteration in 0..settings.max_iterations {
                tracing::debug!("Agent iteration {}", iteration + 1);

                let mut chunks = match llm
                    .chat_completion_stream(&settings.model, &messages, Some(&definitions))
                    .await
                {
                    Ok(chunks) => chunks,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };

                let mut text = String::new();
                let mut calls = ToolCallAccumulator::default();
                while let Some(chunk) = chunks.next().await {
                    match chunk {
                        Ok(StreamChunk::Text(content)) => {
                            text.push_str(&content);
                            yield Ok(AgentEvent::TextDelta { content });
                        }
                        Ok(StreamChunk::ToolCallDelta(delta)) => calls.push(delta),
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }

                let tool_calls = calls.finish();
                if tool_calls.is_empty() {
                    // No tool calls - this is the final response
                    messages.push(ChatMessage::assistant(text));
                    yield Ok(AgentEvent::TurnComplete { history: messages });
                    return;
                }

                messages.push(ChatMessage::assistant_tool_calls(text, tool_calls.clone()));

                for call in tool_calls {
                    let args = call.parsed_arguments();
                    yield Ok(AgentEvent::ToolCall {
                        id: call.id.clone(),
                        name: call.function.name.clone(),
                        args: args.clone(),
                    });

                    let (result, is_error) = execute_tool_call(&tools, &call, args).await;
                    messages.push(ChatMessage::tool_result(&call.id, &result));
                    yield Ok(AgentEvent::ToolResult {
                        id: call.id,
                        name: call.function.name,
                        result,
                        is_error,
                    });
                }
            }

            yield Err(anyhow::anyhow!(
                "Max iterations ({}) reached without completion",
                settings.max_iterations
            ));
        })
    }
}

/// Execute a single tool call. Failures are reported to the model as text.
async fn execute_tool_call(
    tools: &SharedToolConnection,
    call: &ToolCall,
    args: serde_json::Value,
) -> (String, bool) {
    tracing::debug!(tool = %call.function.name, %args, "Calling tool");
    match tools.call_tool(&call.function.name, args).await {
        Ok(output) => (output, false),
        Err(e) => {
            tracing::warn!(tool = %call.function.name, "Tool failed: {}", e);
            (format!("Error: {}", e), true)
        }
    }
}
