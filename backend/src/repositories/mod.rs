pub mod memory;
pub mod postgres;
pub mod session_store;
pub mod voice_message_store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use session_store::SessionStore;
pub use voice_message_store::VoiceMessageStore;
