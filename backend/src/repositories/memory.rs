//! In-memory store, used by the integration tests and as the fallback
//! backend when no database is configured.
//!
//! Semantics match the Postgres store exactly: session commits are
//! compare-and-swap on the version counter and `mark_fired` is a
//! conditional transition of `fired_at`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::session::Session;
use crate::models::voice_message::VoiceMessage;
use crate::repositories::session_store::SessionStore;
use crate::repositories::voice_message_store::VoiceMessageStore;
use crate::types::{EventId, SessionId, UserId, VoiceMessageId};

#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
    messages: RwLock<HashMap<VoiceMessageId, VoiceMessage>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, session: &Session) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "duplicate session id {}",
                session.id
            )));
        }
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: SessionId) -> Result<Option<Session>, AppError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&id).cloned())
    }

    async fn find_by_event_and_user(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<Option<Session>, AppError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .find(|session| session.event_id == event_id && session.user_id == user_id)
            .cloned())
    }

    async fn update(&self, session: &Session, expected_version: i64) -> Result<bool, AppError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session.id) {
            Some(stored) if stored.version == expected_version => {
                *stored = session.clone();
                Ok(true)
            }
            // A missing row and a version mismatch both read as a lost
            // race, matching rows_affected == 0 on the Postgres side.
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl VoiceMessageStore for MemoryStore {
    async fn create(&self, message: &VoiceMessage) -> Result<(), AppError> {
        let mut messages = self.messages.write().await;
        if messages.contains_key(&message.id) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "duplicate voice message id {}",
                message.id
            )));
        }
        messages.insert(message.id, message.clone());
        Ok(())
    }

    async fn unfired_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<VoiceMessage>, AppError> {
        let messages = self.messages.read().await;
        let mut pending: Vec<VoiceMessage> = messages
            .values()
            .filter(|message| message.session_id == session_id && !message.is_fired())
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(pending)
    }

    async fn mark_fired(
        &self,
        id: VoiceMessageId,
        fired_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut messages = self.messages.write().await;
        match messages.get_mut(&id) {
            Some(stored) if stored.fired_at.is_none() => {
                stored.fired_at = Some(fired_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
