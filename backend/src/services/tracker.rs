//! Session tracking: the update protocol that ties the distance
//! accumulator and the trigger engine together.
//!
//! Every mutation of one session is serialized through a compare-and-swap
//! on the session's version counter. A writer that loses the race reloads
//! and re-validates, so an update racing a stop either lands before the
//! stop is visible or is rejected because the session is no longer
//! active. It is never half-applied.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::location::{self, LocationSample};
use crate::models::session::{Session, SessionStatus};
use crate::models::voice_message::{CreateVoiceMessageRequest, VoiceMessage};
use crate::repositories::{SessionStore, VoiceMessageStore};
use crate::services::{distance, triggers};
use crate::types::{EventId, SessionId, UserId};

/// Bounded retries for the per-session compare-and-swap commit. One
/// authenticated device reports per session, so more than a couple of
/// lost races means the storage layer is struggling.
const MAX_COMMIT_ATTEMPTS: u32 = 5;

/// Result of one accepted batched update.
#[derive(Debug)]
pub struct UpdateOutcome {
    pub session: Session,
    /// Messages whose threshold this update crossed, won exactly once by
    /// this request. The caller forwards them for playback.
    pub messages_to_play: Vec<VoiceMessage>,
}

pub struct SessionTracker {
    sessions: Arc<dyn SessionStore>,
    messages: Arc<dyn VoiceMessageStore>,
}

impl SessionTracker {
    pub fn new(sessions: Arc<dyn SessionStore>, messages: Arc<dyn VoiceMessageStore>) -> Self {
        Self { sessions, messages }
    }

    /// Creates a registered session for `user_id` in `event_id`, or
    /// returns the one that already exists for the pair.
    pub async fn register(&self, event_id: EventId, user_id: UserId) -> Result<Session, AppError> {
        if let Some(existing) = self
            .sessions
            .find_by_event_and_user(event_id, user_id)
            .await?
        {
            tracing::debug!(session_id = %existing.id, "existing registration reused");
            return Ok(existing);
        }

        let session = Session::register(event_id, user_id, Utc::now());
        self.sessions.create(&session).await?;
        tracing::info!(session_id = %session.id, event_id = %event_id, "session registered");
        Ok(session)
    }

    /// `registered -> active`. Records the client start instant when
    /// given, the server clock otherwise.
    pub async fn start_session(
        &self,
        session_id: SessionId,
        caller: UserId,
        start_time: Option<DateTime<Utc>>,
    ) -> Result<Session, AppError> {
        let session = self
            .commit_with_retries(session_id, caller, |session, now| {
                session.start(start_time.unwrap_or(now), now)
            })
            .await?;
        tracing::info!(session_id = %session_id, "session started");
        Ok(session)
    }

    /// One batched device update: sort, accumulate, commit atomically,
    /// then evaluate triggers against the post-update totals.
    pub async fn update_session(
        &self,
        session_id: SessionId,
        caller: UserId,
        samples: Vec<LocationSample>,
        elapsed_time_seconds: i64,
    ) -> Result<UpdateOutcome, AppError> {
        if samples.is_empty() {
            return Err(AppError::InvalidInput(
                "locations must not be empty".to_string(),
            ));
        }
        let mut points = samples
            .into_iter()
            .map(LocationSample::into_point)
            .collect::<Result<Vec<_>, _>>()?;
        location::sort_by_timestamp(&mut points);

        let session = self
            .commit_with_retries(session_id, caller, |session, now| {
                if session.status != SessionStatus::Active {
                    return Err(AppError::InvalidState(format!(
                        "session is {}, updates require an active session",
                        session.status.as_str()
                    )));
                }
                let batch = distance::accumulate(&points, session.last_known_location.as_ref());
                session.apply_batch(
                    points.clone(),
                    batch.meters,
                    batch.last_point,
                    elapsed_time_seconds,
                    now,
                );
                Ok(())
            })
            .await?;

        tracing::debug!(
            session_id = %session_id,
            total_distance_meters = session.elapsed_distance_meters,
            "update committed"
        );

        let messages_to_play = self.fire_due_messages(&session).await?;
        Ok(UpdateOutcome {
            session,
            messages_to_play,
        })
    }

    /// Completes the session, folding in an optional final batch first.
    /// Stopping an already completed session is a no-op success.
    pub async fn stop_session(
        &self,
        session_id: SessionId,
        caller: UserId,
        samples: Option<Vec<LocationSample>>,
        elapsed_time_seconds: Option<i64>,
    ) -> Result<Session, AppError> {
        let final_points = match samples {
            Some(samples) if !samples.is_empty() => {
                let mut points = samples
                    .into_iter()
                    .map(LocationSample::into_point)
                    .collect::<Result<Vec<_>, _>>()?;
                location::sort_by_timestamp(&mut points);
                Some(points)
            }
            _ => None,
        };

        for attempt in 0..MAX_COMMIT_ATTEMPTS {
            let mut session = self.load_owned(session_id, caller).await?;
            if session.status == SessionStatus::Completed {
                return Ok(session);
            }

            let now = Utc::now();
            if session.status == SessionStatus::Active {
                if let Some(points) = &final_points {
                    let batch = distance::accumulate(points, session.last_known_location.as_ref());
                    let elapsed = elapsed_time_seconds.unwrap_or(session.elapsed_time_seconds);
                    session.apply_batch(points.clone(), batch.meters, batch.last_point, elapsed, now);
                } else if let Some(elapsed) = elapsed_time_seconds {
                    session.elapsed_time_seconds = elapsed;
                }
            }
            session.complete(now);

            let expected = session.version;
            session.version += 1;
            if self.sessions.update(&session, expected).await? {
                tracing::info!(
                    session_id = %session_id,
                    total_distance_meters = session.elapsed_distance_meters,
                    "session completed"
                );
                return Ok(session);
            }
            tracing::debug!(session_id = %session_id, attempt, "stop lost a version race, retrying");
        }

        Err(contention(session_id))
    }

    /// Owner-only session snapshot.
    pub async fn get_session(
        &self,
        session_id: SessionId,
        caller: UserId,
    ) -> Result<Session, AppError> {
        self.load_owned(session_id, caller).await
    }

    /// Attaches a voice-message trigger to a session. Any authenticated
    /// supporter may cheer any session.
    pub async fn create_voice_message(
        &self,
        session_id: SessionId,
        request: CreateVoiceMessageRequest,
    ) -> Result<VoiceMessage, AppError> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("session {session_id} not found")))?;

        let message = request.into_message(session.id, Utc::now());
        self.messages.create(&message).await?;
        tracing::info!(
            message_id = %message.id,
            session_id = %session.id,
            trigger_type = message.trigger_type.as_str(),
            trigger_value = message.trigger_value,
            "voice message queued"
        );
        Ok(message)
    }

    /// Marks every message due at the session's current totals, keeping
    /// only the ones whose conditional write this request won.
    async fn fire_due_messages(&self, session: &Session) -> Result<Vec<VoiceMessage>, AppError> {
        let pending = self.messages.unfired_for_session(session.id).await?;
        let due = triggers::due_messages(
            &pending,
            session.elapsed_distance_meters,
            session.elapsed_time_seconds,
        );

        let now = Utc::now();
        let mut fired = Vec::with_capacity(due.len());
        for mut message in due {
            if self.messages.mark_fired(message.id, now).await? {
                message.fired_at = Some(now);
                tracing::info!(
                    message_id = %message.id,
                    session_id = %session.id,
                    "voice message fired"
                );
                fired.push(message);
            }
        }
        Ok(fired)
    }

    async fn load_owned(
        &self,
        session_id: SessionId,
        caller: UserId,
    ) -> Result<Session, AppError> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("session {session_id} not found")))?;
        if !session.is_owned_by(caller) {
            return Err(AppError::Forbidden(
                "session belongs to another user".to_string(),
            ));
        }
        Ok(session)
    }

    async fn commit_with_retries<F>(
        &self,
        session_id: SessionId,
        caller: UserId,
        mut mutate: F,
    ) -> Result<Session, AppError>
    where
        F: FnMut(&mut Session, DateTime<Utc>) -> Result<(), AppError>,
    {
        for attempt in 0..MAX_COMMIT_ATTEMPTS {
            let mut session = self.load_owned(session_id, caller).await?;
            mutate(&mut session, Utc::now())?;

            let expected = session.version;
            session.version += 1;
            if self.sessions.update(&session, expected).await? {
                return Ok(session);
            }
            tracing::debug!(session_id = %session_id, attempt, "commit lost a version race, retrying");
        }

        Err(contention(session_id))
    }
}

fn contention(session_id: SessionId) -> AppError {
    AppError::StorageUnavailable(format!(
        "session {session_id} is under write contention, retry the request"
    ))
}
