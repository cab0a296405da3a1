//! In-memory session store (non-persistent).

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Session, SessionId, SessionStore};
use crate::llm::ChatMessage;

#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        id: SessionId,
    ) -> Result<Session, String> {
        match self.sessions.write().await.entry(id) {
            Entry::Occupied(_) => Err(format!("Session {} already exists", id)),
            Entry::Vacant(slot) => Ok(slot.insert(Session::new(id, app_name, user_id)).clone()),
        }
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<Session>, String> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn update_history(
        &self,
        id: SessionId,
        history: Vec<ChatMessage>,
    ) -> Result<(), String> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| format!("Session {} not found", id))?;
        session.history = history;
        session.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_session(&self, id: SessionId) -> Result<bool, String> {
        Ok(self.sessions.write().await.remove(&id).is_some())
    }
}
