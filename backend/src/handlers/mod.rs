pub mod health;
pub mod sessions;
pub mod voice_messages;
