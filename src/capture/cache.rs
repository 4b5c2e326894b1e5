//! In-memory last-header cache
//!
//! Fast path for retrieval within the same process: no storage round trip and
//! no decryption. Never persisted. Values are zeroized on eviction.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::security::SecureString;
use crate::tabs::TabId;

/// Last admitted header per tab, plaintext, process-local
#[derive(Default)]
pub struct LastHeaderCache {
    entries: RwLock<HashMap<TabId, SecureString>>,
}

impl LastHeaderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached header for a tab
    pub fn set(&self, tab_id: TabId, header: SecureString) {
        self.entries.write().insert(tab_id, header);
    }

    /// Returns a copy of the cached header for a tab
    pub fn get(&self, tab_id: TabId) -> Option<String> {
        self.entries.read().get(&tab_id).map(SecureString::expose)
    }

    /// Evicts a tab's header
    ///
    /// # Returns
    ///
    /// `true` if an entry was present
    pub fn remove(&self, tab_id: TabId) -> bool {
        self.entries.write().remove(&tab_id).is_some()
    }

    pub fn contains(&self, tab_id: TabId) -> bool {
        self.entries.read().contains_key(&tab_id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
