//! Common validation rules shared across request payloads.

use validator::ValidationError;

use crate::models::location::parse_timestamp;

/// Validates that a wire timestamp is either ISO-8601 or epoch
/// milliseconds.
pub fn validate_timestamp(raw: &str) -> Result<(), ValidationError> {
    parse_timestamp(raw)
        .map(|_| ())
        .map_err(|_| ValidationError::new("timestamp_unparseable"))
}
