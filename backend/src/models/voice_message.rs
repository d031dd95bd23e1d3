//! Voice messages: pre-recorded cheers bound to a distance or time
//! threshold within one session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::types::{SessionId, VoiceMessageId};

/// The supporter web UI collects distance thresholds in miles; they are
/// normalized to meters on creation.
pub const MILES_TO_METERS: f64 = 1609.34;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    Distance,
    Time,
}

impl TriggerType {
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerType::Distance => "distance",
            TriggerType::Time => "time",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "distance" => Some(TriggerType::Distance),
            "time" => Some(TriggerType::Time),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceMessage {
    pub id: VoiceMessageId,
    pub session_id: SessionId,
    pub sender_name: String,
    /// Public-read URL of the uploaded audio blob.
    pub audio_file_url: String,
    pub trigger_type: TriggerType,
    /// Meters for distance triggers, seconds for time triggers.
    pub trigger_value: f64,
    /// Set exactly once, when the threshold is first crossed.
    pub fired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl VoiceMessage {
    pub fn is_fired(&self) -> bool {
        self.fired_at.is_some()
    }

    /// Whether the post-update totals have crossed this message's
    /// threshold. Already-fired messages are never due again.
    pub fn is_due(&self, distance_meters: f64, elapsed_seconds: i64) -> bool {
        if self.is_fired() {
            return false;
        }
        match self.trigger_type {
            TriggerType::Distance => distance_meters >= self.trigger_value,
            TriggerType::Time => elapsed_seconds as f64 >= self.trigger_value,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVoiceMessageRequest {
    #[validate(length(min = 1, max = 100, message = "senderName must be 1-100 characters"))]
    pub sender_name: String,
    #[validate(url(message = "audioFileUrl must be a valid URL"))]
    pub audio_file_url: String,
    pub trigger_type: TriggerType,
    /// Miles for distance triggers (the supporter UI unit), seconds for
    /// time triggers.
    #[validate(range(exclusive_min = 0.0, message = "triggerValue must be positive"))]
    pub trigger_value: f64,
}

impl CreateVoiceMessageRequest {
    /// Threshold in the engine's units: meters or seconds.
    pub fn normalized_trigger_value(&self) -> f64 {
        match self.trigger_type {
            TriggerType::Distance => self.trigger_value * MILES_TO_METERS,
            TriggerType::Time => self.trigger_value,
        }
    }

    pub fn into_message(self, session_id: SessionId, now: DateTime<Utc>) -> VoiceMessage {
        let trigger_value = self.normalized_trigger_value();
        VoiceMessage {
            id: VoiceMessageId::new(),
            session_id,
            sender_name: self.sender_name,
            audio_file_url: self.audio_file_url,
            trigger_type: self.trigger_type,
            trigger_value,
            fired_at: None,
            created_at: now,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoiceMessageResponse {
    pub id: VoiceMessageId,
    pub session_id: SessionId,
    pub sender_name: String,
    pub audio_file_url: String,
    pub trigger_type: TriggerType,
    pub trigger_value: f64,
    pub fired_at: Option<DateTime<Utc>>,
}

impl From<VoiceMessage> for VoiceMessageResponse {
    fn from(message: VoiceMessage) -> Self {
        Self {
            id: message.id,
            session_id: message.session_id,
            sender_name: message.sender_name,
            audio_file_url: message.audio_file_url,
            trigger_type: message.trigger_type,
            trigger_value: message.trigger_value,
            fired_at: message.fired_at,
        }
    }
}
