//! Postgres-backed store.
//!
//! Queries are plain runtime SQL with explicit row mapping. Location data
//! is serialized as JSON text; per-session serialization rides on the
//! `version` compare-and-swap and trigger firing on a conditional
//! `fired_at` update, so no multi-statement transactions are needed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::AppError;
use crate::models::location::LocationPoint;
use crate::models::session::{Session, SessionStatus};
use crate::models::voice_message::{TriggerType, VoiceMessage};
use crate::repositories::session_store::SessionStore;
use crate::repositories::voice_message_store::VoiceMessageStore;
use crate::types::{EventId, SessionId, UserId, VoiceMessageId};

const SESSION_COLUMNS: &str = "id, event_id, user_id, status, start_time, end_time, \
     elapsed_time_seconds, elapsed_distance_meters, last_known_location, locations, \
     version, created_at, updated_at";

const MESSAGE_COLUMNS: &str =
    "id, session_id, sender_name, audio_file_url, trigger_type, trigger_value, fired_at, created_at";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn session_from_row(row: &PgRow) -> Result<Session, AppError> {
    let id: String = row.try_get("id")?;
    let event_id: String = row.try_get("event_id")?;
    let user_id: String = row.try_get("user_id")?;
    let status: String = row.try_get("status")?;
    let last_known_location: Option<String> = row.try_get("last_known_location")?;
    let locations: String = row.try_get("locations")?;

    Ok(Session {
        id: parse_id::<SessionId>(&id)?,
        event_id: parse_id::<EventId>(&event_id)?,
        user_id: parse_id::<UserId>(&user_id)?,
        status: SessionStatus::parse(&status).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("unknown session status {status:?}"))
        })?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        elapsed_time_seconds: row.try_get("elapsed_time_seconds")?,
        elapsed_distance_meters: row.try_get("elapsed_distance_meters")?,
        last_known_location: decode_optional_point(last_known_location.as_deref())?,
        locations: decode_points(&locations)?,
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn message_from_row(row: &PgRow) -> Result<VoiceMessage, AppError> {
    let id: String = row.try_get("id")?;
    let session_id: String = row.try_get("session_id")?;
    let trigger_type: String = row.try_get("trigger_type")?;

    Ok(VoiceMessage {
        id: parse_id::<VoiceMessageId>(&id)?,
        session_id: parse_id::<SessionId>(&session_id)?,
        sender_name: row.try_get("sender_name")?,
        audio_file_url: row.try_get("audio_file_url")?,
        trigger_type: TriggerType::parse(&trigger_type).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("unknown trigger type {trigger_type:?}"))
        })?,
        trigger_value: row.try_get("trigger_value")?,
        fired_at: row.try_get("fired_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn parse_id<T>(raw: &str) -> Result<T, AppError>
where
    T: std::str::FromStr<Err = uuid::Error>,
{
    raw.parse::<T>()
        .map_err(|err| AppError::Internal(anyhow::anyhow!("malformed id {raw:?}: {err}")))
}

fn encode_points(points: &[LocationPoint]) -> Result<String, AppError> {
    serde_json::to_string(points).map_err(|err| AppError::Internal(err.into()))
}

fn encode_optional_point(point: Option<&LocationPoint>) -> Result<Option<String>, AppError> {
    point
        .map(|p| serde_json::to_string(p).map_err(|err| AppError::Internal(err.into())))
        .transpose()
}

fn decode_points(raw: &str) -> Result<Vec<LocationPoint>, AppError> {
    serde_json::from_str(raw).map_err(|err| AppError::Internal(err.into()))
}

fn decode_optional_point(raw: Option<&str>) -> Result<Option<LocationPoint>, AppError> {
    raw.map(|r| serde_json::from_str(r).map_err(|err| AppError::Internal(err.into())))
        .transpose()
}

#[async_trait]
impl SessionStore for PgStore {
    async fn create(&self, session: &Session) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO sessions \
             (id, event_id, user_id, status, start_time, end_time, elapsed_time_seconds, \
              elapsed_distance_meters, last_known_location, locations, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(session.id.to_string())
        .bind(session.event_id.to_string())
        .bind(session.user_id.to_string())
        .bind(session.status.as_str())
        .bind(session.start_time)
        .bind(session.end_time)
        .bind(session.elapsed_time_seconds)
        .bind(session.elapsed_distance_meters)
        .bind(encode_optional_point(session.last_known_location.as_ref())?)
        .bind(encode_points(&session.locations)?)
        .bind(session.version)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: SessionId) -> Result<Option<Session>, AppError> {
        let query = format!("SELECT {} FROM sessions WHERE id = $1", SESSION_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(session_from_row).transpose()
    }

    async fn find_by_event_and_user(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<Option<Session>, AppError> {
        let query = format!(
            "SELECT {} FROM sessions WHERE event_id = $1 AND user_id = $2 \
             ORDER BY created_at LIMIT 1",
            SESSION_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(event_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(session_from_row).transpose()
    }

    async fn update(&self, session: &Session, expected_version: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE sessions SET status = $2, start_time = $3, end_time = $4, \
             elapsed_time_seconds = $5, elapsed_distance_meters = $6, \
             last_known_location = $7, locations = $8, version = $9, updated_at = $10 \
             WHERE id = $1 AND version = $11",
        )
        .bind(session.id.to_string())
        .bind(session.status.as_str())
        .bind(session.start_time)
        .bind(session.end_time)
        .bind(session.elapsed_time_seconds)
        .bind(session.elapsed_distance_meters)
        .bind(encode_optional_point(session.last_known_location.as_ref())?)
        .bind(encode_points(&session.locations)?)
        .bind(session.version)
        .bind(session.updated_at)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl VoiceMessageStore for PgStore {
    async fn create(&self, message: &VoiceMessage) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO voice_messages \
             (id, session_id, sender_name, audio_file_url, trigger_type, trigger_value, fired_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(message.id.to_string())
        .bind(message.session_id.to_string())
        .bind(&message.sender_name)
        .bind(&message.audio_file_url)
        .bind(message.trigger_type.as_str())
        .bind(message.trigger_value)
        .bind(message.fired_at)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn unfired_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<VoiceMessage>, AppError> {
        let query = format!(
            "SELECT {} FROM voice_messages \
             WHERE session_id = $1 AND fired_at IS NULL \
             ORDER BY created_at, id",
            MESSAGE_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(session_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(message_from_row).collect()
    }

    async fn mark_fired(
        &self,
        id: VoiceMessageId,
        fired_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE voice_messages SET fired_at = $2 WHERE id = $1 AND fired_at IS NULL")
                .bind(id.to_string())
                .bind(fired_at)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
