//! GPS location points and their wire representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;
use crate::validation::rules;

/// A single GPS fix. Immutable once accepted into a session's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocationPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

/// Wire form of a location sample as batched by the device.
///
/// Timestamps arrive either as ISO-8601 strings or as epoch-millisecond
/// strings, depending on the client build.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    #[validate(range(min = -90.0, max = 90.0, message = "latitude out of range"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "longitude out of range"))]
    pub longitude: f64,
    #[validate(custom(function = rules::validate_timestamp))]
    pub timestamp: String,
}

impl LocationSample {
    pub fn into_point(self) -> Result<LocationPoint, AppError> {
        let timestamp = parse_timestamp(&self.timestamp)?;
        Ok(LocationPoint {
            latitude: self.latitude,
            longitude: self.longitude,
            timestamp,
        })
    }
}

/// Parses an ISO-8601 timestamp, falling back to epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(millis) = raw.parse::<i64>() {
        if let Some(parsed) = DateTime::from_timestamp_millis(millis) {
            return Ok(parsed);
        }
    }
    Err(AppError::InvalidInput(format!(
        "unparseable timestamp: {raw}"
    )))
}

/// Stable sort by timestamp; equal timestamps keep submission order.
pub fn sort_by_timestamp(points: &mut [LocationPoint]) {
    points.sort_by_key(|p| p.timestamp);
}
