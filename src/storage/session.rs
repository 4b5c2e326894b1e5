//! Session-scoped key/value storage provided by the host
//!
//! The host clears this area when the browsing session ends. Nothing in this
//! crate implements that expiry; it is a property of the backing store.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur while talking to session storage
#[derive(Debug, Error)]
pub enum StorageError {
    /// The host storage area rejected or failed the operation
    #[error("Session storage unavailable: {0}")]
    Unavailable(String),
}

/// Host storage area that lives exactly as long as the browsing session
///
/// Values are strings; binary payloads are base64-encoded by callers.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Reads a value, `None` if the key was never set or has been removed
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a value, replacing any previous one
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Removes a value; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process session storage
///
/// Survives restarts of the capture service as long as the same instance is
/// handed to the new service. `clear` models the end of the browsing session.
#[derive(Default)]
pub struct MemorySessionStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every entry, as the host does when the session ends
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
