//! Session store trait for dependency injection and testing.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::session::Session;
use crate::types::{EventId, SessionId, UserId};

/// Durable storage for sessions.
///
/// The store only needs per-document atomicity: `update` is a
/// compare-and-swap on the session's version counter, which is what
/// serializes concurrent writers to one session. Mockable with
/// `MockSessionStore` in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: &Session) -> Result<(), AppError>;

    async fn find_by_id(&self, id: SessionId) -> Result<Option<Session>, AppError>;

    /// One session per user per event; used to make registration
    /// idempotent.
    async fn find_by_event_and_user(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<Option<Session>, AppError>;

    /// Persists `session` only if the stored version still equals
    /// `expected_version`. Returns whether this writer won; a losing
    /// writer reloads and retries.
    async fn update(&self, session: &Session, expected_version: i64) -> Result<bool, AppError>;
}
