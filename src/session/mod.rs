//! Conversation sessions.
//!
//! A session is created when a client connects and destroyed when it leaves.
//! It carries the agent's message history between turns.

mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::llm::ChatMessage;

pub use memory::InMemorySessionStore;

pub type SessionId = u64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub app_name: String,
    pub user_id: String,
    /// Free-form session state; empty on creation
    pub state: Map<String, Value>,
    pub history: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, app_name: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            app_name: app_name.into(),
            user_id: user_id.into(),
            state: Map::new(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Session storage backend.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create an empty session. Fails if `id` is already taken.
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        id: SessionId,
    ) -> Result<Session, String>;

    async fn get_session(&self, id: SessionId) -> Result<Option<Session>, String>;

    /// Replace the message history of an existing session.
    async fn update_history(&self, id: SessionId, history: Vec<ChatMessage>)
        -> Result<(), String>;

    /// Remove a session. Returns whether it existed.
    async fn delete_session(&self, id: SessionId) -> Result<bool, String>;
}

pub type SharedSessionStore = Arc<dyn SessionStore>;
