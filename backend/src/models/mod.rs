//! Data models shared across storage access and API handlers.

pub mod location;
pub mod session;
pub mod voice_message;
