//! Storage module - Session-scoped persistence for captured headers
//!
//! Provides:
//! - The host session storage seam (cleared when the browsing session ends)
//! - An encrypted per-tab record store layered on top of it

mod encrypted_store;
mod session;

pub use encrypted_store::{EncryptedSessionStore, DEFAULT_RECORD_PREFIX};
pub use session::{MemorySessionStorage, SessionStorage, StorageError};
