//! Encrypted header records keyed by tab
//!
//! Thin persistence boundary over session storage. Every record lives under
//! `<prefix><tabId>` (default `h_<tabId>`) so it cannot collide with the salt
//! or anything else sharing the storage area. Values are opaque cipher blobs;
//! this layer never sees plaintext.

use std::sync::Arc;

use super::session::{SessionStorage, StorageError};
use crate::tabs::TabId;

/// Default prefix for per-tab record keys
pub const DEFAULT_RECORD_PREFIX: &str = "h_";

/// Per-tab store of encrypted header blobs
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use authtap_lib::storage::{EncryptedSessionStore, MemorySessionStorage};
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let store = EncryptedSessionStore::new(Arc::new(MemorySessionStorage::new()));
///     store.put(7, "b64blob".to_string()).await.unwrap();
///     assert_eq!(store.get(7).await.unwrap().as_deref(), Some("b64blob"));
///     store.remove(7).await.unwrap();
///     assert_eq!(store.get(7).await.unwrap(), None);
/// });
/// ```
pub struct EncryptedSessionStore {
    storage: Arc<dyn SessionStorage>,
    prefix: String,
}

impl EncryptedSessionStore {
    /// Creates a store using the default `h_` prefix
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self::with_prefix(storage, DEFAULT_RECORD_PREFIX)
    }

    /// Creates a store with a custom record prefix
    pub fn with_prefix(storage: Arc<dyn SessionStorage>, prefix: impl Into<String>) -> Self {
        Self {
            storage,
            prefix: prefix.into(),
        }
    }

    /// Returns the storage key for a tab's record
    pub fn record_key(&self, tab_id: TabId) -> String {
        format!("{}{}", self.prefix, tab_id)
    }

    /// Stores a blob for a tab, replacing any previous record
    pub async fn put(&self, tab_id: TabId, blob: String) -> Result<(), StorageError> {
        self.storage.set(&self.record_key(tab_id), blob).await
    }

    /// Reads a tab's blob
    ///
    /// # Returns
    ///
    /// `Some(blob)` if a record exists, `None` if the tab never had an
    /// admitted header or its record was removed
    pub async fn get(&self, tab_id: TabId) -> Result<Option<String>, StorageError> {
        self.storage.get(&self.record_key(tab_id)).await
    }

    /// Removes a tab's record
    pub async fn remove(&self, tab_id: TabId) -> Result<(), StorageError> {
        self.storage.remove(&self.record_key(tab_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySessionStorage;

    fn store() -> (Arc<MemorySessionStorage>, EncryptedSessionStore) {
        let storage = Arc::new(MemorySessionStorage::new());
        let store = EncryptedSessionStore::new(storage.clone());
        (storage, store)
    }

    #[test]
    fn test_record_key() {
        let (_, store) = store();
        assert_eq!(store.record_key(7), "h_7");
        assert_eq!(store.record_key(0), "h_0");

        let custom = EncryptedSessionStore::with_prefix(
            Arc::new(MemorySessionStorage::new()),
            "authtap:tab:",
        );
        assert_eq!(custom.record_key(12), "authtap:tab:12");
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (storage, store) = store();
        store.put(3, "blob-a".to_string()).await.unwrap();

        assert_eq!(store.get(3).await.unwrap().as_deref(), Some("blob-a"));
        // Written under the namespaced key
        assert_eq!(storage.get("h_3").await.unwrap().as_deref(), Some("blob-a"));
    }

    #[tokio::test]
    async fn test_overwrite_last_writer_wins() {
        let (_, store) = store();
        store.put(3, "first".to_string()).await.unwrap();
        store.put(3, "second".to_string()).await.unwrap();
        assert_eq!(store.get(3).await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_tabs_are_partitioned() {
        let (_, store) = store();
        store.put(1, "one".to_string()).await.unwrap();
        store.put(2, "two".to_string()).await.unwrap();

        store.remove(1).await.unwrap();
        assert_eq!(store.get(1).await.unwrap(), None);
        assert_eq!(store.get(2).await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_does_not_touch_salt() {
        let (storage, store) = store();
        storage.set("sessionSalt", "salt".to_string()).await.unwrap();
        store.put(1, "one".to_string()).await.unwrap();
        store.remove(1).await.unwrap();

        assert_eq!(
            storage.get("sessionSalt").await.unwrap().as_deref(),
            Some("salt")
        );
    }
}
