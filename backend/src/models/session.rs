//! Session model and its lifecycle state machine.
//!
//! A session is one participant's tracked attempt at one event. It moves
//! forward-only through `registered -> active -> completed`; the running
//! distance total is server-computed and monotonically non-decreasing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;
use crate::models::location::{LocationPoint, LocationSample};
use crate::models::voice_message::VoiceMessageResponse;
use crate::types::{EventId, SessionId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Registered,
    Active,
    Completed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Registered => "registered",
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "registered" => Some(SessionStatus::Registered),
            "active" => Some(SessionStatus::Active),
            "completed" => Some(SessionStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub event_id: EventId,
    pub user_id: UserId,
    pub status: SessionStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Client-reported elapsed time. Stored verbatim; the server does not
    /// re-derive it from timestamps.
    pub elapsed_time_seconds: i64,
    /// Server-computed running total in meters. Never decreases.
    pub elapsed_distance_meters: f64,
    /// Seed for the next batch's first segment. `None` until the first
    /// accepted update.
    pub last_known_location: Option<LocationPoint>,
    /// Append-only log of every accepted point, in accepted order.
    pub locations: Vec<LocationPoint>,
    /// Optimistic-concurrency token; bumped on every committed write.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates a freshly registered session for one user in one event.
    pub fn register(event_id: EventId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::new(),
            event_id,
            user_id,
            status: SessionStatus::Registered,
            start_time: None,
            end_time: None,
            elapsed_time_seconds: 0,
            elapsed_distance_meters: 0.0,
            last_known_location: None,
            locations: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// `registered -> active`. Permitted exactly once.
    pub fn start(&mut self, start_time: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), AppError> {
        match self.status {
            SessionStatus::Registered => {
                self.status = SessionStatus::Active;
                self.start_time = Some(start_time);
                self.updated_at = now;
                Ok(())
            }
            SessionStatus::Active => Err(AppError::InvalidState(
                "session is already started".to_string(),
            )),
            SessionStatus::Completed => Err(AppError::InvalidState(
                "session is already completed".to_string(),
            )),
        }
    }

    /// Transition to `completed`. Returns false when the session was
    /// already completed (idempotent no-op). A registered session may be
    /// completed directly, closing out an abandoned registration.
    pub fn complete(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == SessionStatus::Completed {
            return false;
        }
        self.status = SessionStatus::Completed;
        self.end_time = Some(now);
        self.updated_at = now;
        true
    }

    /// Folds one accumulated batch into the running totals and the
    /// append-only point log.
    pub fn apply_batch(
        &mut self,
        points: Vec<LocationPoint>,
        batch_meters: f64,
        new_last_point: Option<LocationPoint>,
        elapsed_time_seconds: i64,
        now: DateTime<Utc>,
    ) {
        self.elapsed_distance_meters += batch_meters;
        if let Some(point) = new_last_point {
            self.last_known_location = Some(point);
        }
        self.elapsed_time_seconds = elapsed_time_seconds;
        self.locations.extend(points);
        self.updated_at = now;
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    /// Client-side start instant (ISO-8601). Defaults to the server clock.
    pub start_time: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    #[validate(length(min = 1, message = "locations must not be empty"), nested)]
    pub locations: Vec<LocationSample>,
    #[validate(range(min = 0, message = "elapsedTimeSeconds must not be negative"))]
    pub elapsed_time_seconds: i64,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StopSessionRequest {
    /// Final partial batch, folded in before completion.
    #[serde(default)]
    #[validate(nested)]
    pub locations: Option<Vec<LocationSample>>,
    #[serde(default)]
    #[validate(range(min = 0, message = "elapsedTimeSeconds must not be negative"))]
    pub elapsed_time_seconds: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionResponse {
    pub total_distance_meters: f64,
    pub messages_to_play: Vec<VoiceMessageResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StopSessionResponse {
    pub status: SessionStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: SessionId,
    pub event_id: EventId,
    pub user_id: UserId,
    pub status: SessionStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub elapsed_time_seconds: i64,
    pub elapsed_distance_meters: f64,
    pub last_known_location: Option<LocationPoint>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            event_id: session.event_id,
            user_id: session.user_id,
            status: session.status,
            start_time: session.start_time,
            end_time: session.end_time,
            elapsed_time_seconds: session.elapsed_time_seconds,
            elapsed_distance_meters: session.elapsed_distance_meters,
            last_known_location: session.last_known_location,
        }
    }
}
