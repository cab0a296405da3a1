//! WebSocket chat endpoint.
//!
//! Each connection owns one session and one tool connection. Inbound text
//! frames are user messages; the agent's answer is streamed back as
//! [`ChatFrame`] chunks followed by a completion frame.

mod relay;

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use thiserror::Error;

use crate::agent::{Agent, AgentEvent};
use crate::api::routes::AppState;
use crate::api::types::ChatFrame;
use crate::session::SessionId;

pub use relay::TextRelay;

/// Application name recorded on every session.
pub const APP_NAME: &str = "cocktail_chat";

/// Pause between streamed chunks.
const CHUNK_PAUSE: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
enum RelayError {
    #[error(transparent)]
    Agent(#[from] anyhow::Error),

    #[error("client disconnected")]
    Disconnected,
}

/// WebSocket endpoint for one chat session.
pub async fn chat_ws(
    ws: WebSocketUpgrade,
    Path(session_id): Path<SessionId>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let (sender, receiver) = socket.split();
        handle_client(state, session_id, sender, receiver).await;
    })
}

/// Run a client connection to completion.
///
/// The session and tool connection are released on every exit path.
pub async fn handle_client<S, R, E>(
    state: Arc<AppState>,
    session_id: SessionId,
    mut sender: S,
    mut receiver: R,
) where
    S: Sink<Message> + Unpin + Send,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin + Send,
    E: Display + Send,
{
    tracing::info!("Client #{} connected", session_id);

    if let Err(e) = state
        .sessions
        .create_session(APP_NAME, &session_id.to_string(), session_id)
        .await
    {
        tracing::warn!("Rejecting client #{}: {}", session_id, e);
        let _ = send_frame(&mut sender, &ChatFrame::error(&e)).await;
        let _ = sender.close().await;
        return;
    }

    let tools = match state.tools.connect().await {
        Ok(tools) => tools,
        Err(e) => {
            tracing::error!("Failed to open tool connection for session {}: {:#}", session_id, e);
            let _ = send_frame(&mut sender, &ChatFrame::error(format!("{:#}", e))).await;
            let _ = sender.close().await;
            release_session(&state, session_id).await;
            return;
        }
    };

    let agent = Agent::new(state.agent_settings(), Arc::clone(&state.llm), Arc::clone(&tools));
    relay_messages(&state, session_id, &agent, &mut sender, &mut receiver).await;

    tools.close().await;
    release_session(&state, session_id).await;
    tracing::info!("Client #{} disconnected", session_id);
}

async fn release_session(state: &AppState, session_id: SessionId) {
    if let Err(e) = state.sessions.delete_session(session_id).await {
        tracing::warn!("Failed to delete session {}: {}", session_id, e);
    }
}

/// Answer inbound messages one turn at a time until the client goes away.
async fn relay_messages<S, R, E>(
    state: &AppState,
    session_id: SessionId,
    agent: &Agent,
    sender: &mut S,
    receiver: &mut R,
) where
    S: Sink<Message> + Unpin + Send,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin + Send,
    E: Display + Send,
{
    tracing::info!("Agent task started for session {}", session_id);

    while let Some(message) = receiver.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::info!("Client {} disconnected: {}", session_id, e);
                break;
            }
        };

        let timeout = state.config.turn_timeout;
        let turn = run_turn(state, session_id, agent, text, sender);
        let failure = match tokio::time::timeout(timeout, turn).await {
            Ok(Ok(())) => continue,
            Ok(Err(RelayError::Disconnected)) => {
                tracing::info!("Client {} disconnected.", session_id);
                break;
            }
            Ok(Err(RelayError::Agent(e))) => format!("{:#}", e),
            Err(_) => format!("Turn timed out after {} seconds", timeout.as_secs_f64()),
        };

        tracing::error!("Error in agent task for session {}: {}", session_id, failure);
        if send_frame(sender, &ChatFrame::error(failure)).await.is_err() {
            break;
        }
    }

    tracing::info!("Agent task ending for session {}", session_id);
}

/// Run one agent turn and stream its text to the client.
async fn run_turn<S>(
    state: &AppState,
    session_id: SessionId,
    agent: &Agent,
    text: String,
    sender: &mut S,
) -> Result<(), RelayError>
where
    S: Sink<Message> + Unpin + Send,
    S::Error: Display,
{
    tracing::info!("[user][{}]: {}", session_id, text);

    let history = state
        .sessions
        .get_session(session_id)
        .await
        .map_err(anyhow::Error::msg)?
        .map(|session| session.history)
        .unwrap_or_default();

    let mut events = agent.run_turn(history, text);
    let mut relay = TextRelay::new();

    while let Some(event) = events.next().await {
        match event? {
            AgentEvent::TextDelta { content } => {
                tracing::debug!("[agent][{}]: {}", session_id, content);
                if let Some(unsent) = relay.push(&content) {
                    send_frame(sender, &ChatFrame::chunk(unsent)).await?;
                    tokio::time::sleep(CHUNK_PAUSE).await;
                }
            }
            AgentEvent::ToolCall { name, args, .. } => {
                tracing::info!("[tool][{}]: {} {}", session_id, name, args);
            }
            AgentEvent::ToolResult { name, is_error, result, .. } => {
                if is_error {
                    tracing::warn!("[tool][{}]: {} failed: {}", session_id, name, result);
                } else {
                    tracing::debug!("[tool][{}]: {} returned {} bytes", session_id, name, result.len());
                }
            }
            AgentEvent::TurnComplete { history } => {
                state
                    .sessions
                    .update_history(session_id, history)
                    .await
                    .map_err(anyhow::Error::msg)?;
            }
        }
    }

    tracing::info!(
        "[agent][{}]: Full response assembled. Length: {}",
        session_id,
        relay.accumulated_len()
    );
    send_frame(sender, &ChatFrame::complete()).await
}

async fn send_frame<S>(sender: &mut S, frame: &ChatFrame) -> Result<(), RelayError>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    sender
        .send(Message::Text(frame.to_json()))
        .await
        .map_err(|e| {
            tracing::debug!("Failed to send frame: {}", e);
            RelayError::Disconnected
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cocktail::format::fixtures::margarita_json;
    use crate::config::{Config, ToolServerConfig, ToolTransport};
    use crate::llm::testing::{Reply, ScriptedLlm};
    use crate::llm::{ChatMessage, ChunkStream, LlmClient, Role, StreamChunk, ToolCallDelta, ToolDefinition};
    use crate::session::{InMemorySessionStore, SharedSessionStore};
    use crate::tools::{
        SharedToolConnection, ToolConnection, ToolConnector, ToolDescriptor, ToolSource,
    };
    use async_trait::async_trait;
    use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, Ordering};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Calls `search_cocktail_by_name` once, then streams the tool output back.
    struct EchoToolResultLlm;

    #[async_trait]
    impl LlmClient for EchoToolResultLlm {
        async fn chat_completion_stream(
            &self,
            _model: &str,
            messages: &[ChatMessage],
            _tools: Option<&[ToolDefinition]>,
        ) -> anyhow::Result<ChunkStream> {
            let last = messages.last().cloned();
            let chunks: Vec<anyhow::Result<StreamChunk>> = match last {
                Some(ChatMessage { role: Role::Tool, content: Some(content), .. }) => content
                    .lines()
                    .map(|line| Ok(StreamChunk::Text(format!("{}\n", line))))
                    .collect(),
                Some(ChatMessage { content: Some(query), .. }) => {
                    vec![Ok(StreamChunk::ToolCallDelta(ToolCallDelta {
                        index: Some(0),
                        id: Some("call_1".into()),
                        name: Some("search_cocktail_by_name".into()),
                        arguments: Some(json!({ "name": query }).to_string()),
                    }))]
                }
                _ => Vec::new(),
            };
            Ok(Box::pin(futures::stream::iter(chunks)))
        }
    }

    /// Never produces anything.
    struct StalledLlm;

    #[async_trait]
    impl LlmClient for StalledLlm {
        async fn chat_completion_stream(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _tools: Option<&[ToolDefinition]>,
        ) -> anyhow::Result<ChunkStream> {
            Ok(Box::pin(futures::stream::pending()))
        }
    }

    #[derive(Default)]
    struct RecordingTools {
        closed: AtomicBool,
    }

    #[async_trait]
    impl ToolConnection for RecordingTools {
        async fn list_tools(&self) -> anyhow::Result<Vec<ToolDescriptor>> {
            Ok(Vec::new())
        }

        async fn call_tool(&self, name: &str, _args: Value) -> anyhow::Result<String> {
            anyhow::bail!("no tool named {}", name)
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    struct FixedSource(Arc<RecordingTools>);

    #[async_trait]
    impl ToolSource for FixedSource {
        async fn connect(&self) -> anyhow::Result<SharedToolConnection> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ToolSource for FailingSource {
        async fn connect(&self) -> anyhow::Result<SharedToolConnection> {
            anyhow::bail!("tool server not found")
        }
    }

    fn state(llm: Arc<dyn LlmClient>, tools: Arc<dyn ToolSource>) -> (Arc<AppState>, SharedSessionStore) {
        let mut config = Config::new("key".into(), "test-model".into(), "static".into());
        config.turn_timeout = Duration::from_secs(5);
        let sessions: SharedSessionStore = Arc::new(InMemorySessionStore::new());
        let state = AppState {
            config,
            sessions: sessions.clone(),
            llm,
            tools,
        };
        (Arc::new(state), sessions)
    }

    struct Client {
        tx: UnboundedSender<Result<Message, axum::Error>>,
        rx: UnboundedReceiver<Message>,
        task: tokio::task::JoinHandle<()>,
    }

    impl Client {
        fn connect(state: Arc<AppState>, session_id: SessionId) -> Self {
            let (tx, server_rx) = unbounded();
            let (server_tx, rx) = unbounded();
            let task = tokio::spawn(handle_client(state, session_id, server_tx, server_rx));
            Self { tx, rx, task }
        }

        fn say(&self, text: &str) {
            self.tx.unbounded_send(Ok(Message::Text(text.to_string()))).unwrap();
        }

        async fn frame(&mut self) -> Value {
            match self.rx.next().await {
                Some(Message::Text(text)) => serde_json::from_str(&text).unwrap(),
                other => panic!("expected a text frame, got {:?}", other),
            }
        }

        /// Frames up to and including the completion or error frame.
        async fn turn(&mut self) -> Vec<Value> {
            let mut frames = Vec::new();
            loop {
                let frame = self.frame().await;
                let done = frame["complete"] == json!(true) || frame["error"] == json!(true);
                frames.push(frame);
                if done {
                    return frames;
                }
            }
        }

        async fn disconnect(self) {
            drop(self.tx);
            tokio::time::timeout(Duration::from_secs(5), self.task)
                .await
                .unwrap()
                .unwrap();
        }
    }

    #[tokio::test]
    async fn margarita_is_streamed_end_to_end() {
        let api = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.php"))
            .and(query_param("s", "margarita"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"drinks": [margarita_json()]})))
            .expect(1)
            .mount(&api)
            .await;

        let connector = ToolConnector::new(
            ToolServerConfig {
                transport: ToolTransport::InProcess,
                command: None,
                args: Vec::new(),
            },
            api.uri(),
        );
        let (state, sessions) = state(Arc::new(EchoToolResultLlm), Arc::new(connector));
        let mut client = Client::connect(state, 1);
        client.say("margarita");

        let frames = client.turn().await;
        let (last, chunks) = frames.split_last().unwrap();
        assert_eq!(last, &json!({"message": "", "streaming": false, "complete": true}));
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|f| f["streaming"] == json!(true)));
        let text: String = chunks.iter().map(|f| f["message"].as_str().unwrap()).collect();
        assert!(text.contains("Name: Margarita"), "{}", text);

        let session = sessions.get_session(1).await.unwrap().unwrap();
        assert_eq!(session.history.last().unwrap().role, Role::Assistant);

        client.disconnect().await;
        assert!(sessions.get_session(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_turn_sends_error_and_keeps_serving() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Reply::Fail("quota exceeded".into()),
            Reply::text(&["Cheers", " ", "!"]),
        ]));
        let tools = Arc::new(RecordingTools::default());
        let (state, _) = state(llm.clone(), Arc::new(FixedSource(tools.clone())));
        let mut client = Client::connect(state, 2);

        client.say("first");
        let frames = client.turn().await;
        assert_eq!(frames, vec![json!({"message": "Error: quota exceeded", "error": true})]);

        client.say("second");
        let frames = client.turn().await;
        let text: Vec<&str> = frames.iter().map(|f| f["message"].as_str().unwrap()).collect();
        assert_eq!(text, vec!["Cheers", " !", ""]);

        // The failed turn left no history behind, so the second starts fresh
        let second = &llm.requests()[1];
        assert_eq!(second[0].role, Role::System);
        assert_eq!(second.last().unwrap().content.as_deref(), Some("second"));

        client.disconnect().await;
    }

    #[tokio::test]
    async fn history_carries_over_between_turns() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Reply::text(&["One"]),
            Reply::text(&["Two"]),
        ]));
        let (state, _) = state(
            llm.clone(),
            Arc::new(FixedSource(Arc::new(RecordingTools::default()))),
        );
        let mut client = Client::connect(state, 3);

        client.say("first");
        client.turn().await;
        client.say("second");
        client.turn().await;

        let contents: Vec<Option<String>> = llm.requests()[1]
            .iter()
            .skip(1)
            .map(|m| m.content.clone())
            .collect();
        assert_eq!(
            contents,
            vec![Some("first".into()), Some("One".into()), Some("second".into())]
        );
        client.disconnect().await;
    }

    #[tokio::test]
    async fn disconnect_closes_tools_and_destroys_session() {
        let tools = Arc::new(RecordingTools::default());
        let (state, sessions) = state(
            Arc::new(ScriptedLlm::default()),
            Arc::new(FixedSource(tools.clone())),
        );
        let client = Client::connect(state, 4);
        tokio::task::yield_now().await;
        client.disconnect().await;

        assert!(tools.closed.load(Ordering::SeqCst));
        assert!(sessions.get_session(4).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn close_frame_ends_the_connection() {
        let tools = Arc::new(RecordingTools::default());
        let (state, _) = state(
            Arc::new(ScriptedLlm::default()),
            Arc::new(FixedSource(tools.clone())),
        );
        let client = Client::connect(state, 5);
        client.tx.unbounded_send(Ok(Message::Binary(vec![1, 2, 3]))).unwrap();
        client.tx.unbounded_send(Ok(Message::Close(None))).unwrap();
        tokio::time::timeout(Duration::from_secs(5), client.task)
            .await
            .unwrap()
            .unwrap();
        assert!(tools.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn stalled_turn_times_out() {
        let tools = Arc::new(RecordingTools::default());
        let (state, _) = state(Arc::new(StalledLlm), Arc::new(FixedSource(tools)));
        let mut state = Arc::try_unwrap(state).ok().unwrap();
        state.config.turn_timeout = Duration::from_millis(50);
        let mut client = Client::connect(Arc::new(state), 6);

        client.say("hello?");
        let frames = client.turn().await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["error"], json!(true));
        assert!(frames[0]["message"].as_str().unwrap().contains("timed out"));
        client.disconnect().await;
    }

    #[tokio::test]
    async fn duplicate_session_is_rejected_and_existing_one_kept() {
        let tools = Arc::new(RecordingTools::default());
        let (state, sessions) = state(
            Arc::new(ScriptedLlm::default()),
            Arc::new(FixedSource(tools.clone())),
        );
        sessions.create_session(APP_NAME, "7", 7).await.unwrap();

        let mut client = Client::connect(state, 7);
        let frame = client.frame().await;
        assert_eq!(frame["error"], json!(true));
        assert!(frame["message"].as_str().unwrap().contains("already exists"));
        client.disconnect().await;

        assert!(sessions.get_session(7).await.unwrap().is_some());
        assert!(!tools.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn tool_connection_failure_is_reported() {
        let (state, sessions) = state(Arc::new(ScriptedLlm::default()), Arc::new(FailingSource));
        let mut client = Client::connect(state, 8);
        let frame = client.frame().await;
        assert_eq!(frame, json!({"message": "Error: tool server not found", "error": true}));
        client.disconnect().await;
        assert!(sessions.get_session(8).await.unwrap().is_none());
    }
}
