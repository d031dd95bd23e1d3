//! Voice message store trait for dependency injection and testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::voice_message::VoiceMessage;
use crate::types::{SessionId, VoiceMessageId};

/// Durable storage for voice-message triggers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoiceMessageStore: Send + Sync {
    async fn create(&self, message: &VoiceMessage) -> Result<(), AppError>;

    /// Pending (unfired) messages for one session, oldest first.
    async fn unfired_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<VoiceMessage>, AppError>;

    /// Sets `fired_at` only when it is currently unset. Returns true when
    /// this caller performed the transition; this is the exactly-once
    /// guard for concurrent or retried evaluations.
    async fn mark_fired(
        &self,
        id: VoiceMessageId,
        fired_at: DateTime<Utc>,
    ) -> Result<bool, AppError>;
}
