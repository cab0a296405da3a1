use serde_json::Value;

use crate::llm::ChatMessage;

/// Events produced while the agent works on one turn.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Text content being streamed.
    TextDelta { content: String },
    /// Agent is calling a tool.
    ToolCall {
        id: String,
        name: String,
        args: Value,
    },
    /// Tool execution completed.
    ToolResult {
        id: String,
        name: String,
        result: String,
        is_error: bool,
    },
    /// Turn finished; carries the full conversation to keep for the next turn.
    TurnComplete { history: Vec<ChatMessage> },
}
