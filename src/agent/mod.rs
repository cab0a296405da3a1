//! Agent module - the tools-in-a-loop orchestration behind each chat turn.
//!
//! For every user message the agent:
//! 1. Streams a completion with the session's tools advertised
//! 2. Forwards text deltas as they arrive
//! 3. Executes requested tool calls and feeds the results back
//! 4. Repeats until the model answers without tools or max iterations is hit

mod agent_loop;
mod events;
mod prompt;

pub use agent_loop::{Agent, AgentSettings, TurnStream};
pub use events::AgentEvent;
pub use prompt::build_system_prompt;
