//! Retrieval service - answers "last captured header for the active tab"
//!
//! This is the only surface the UI layer talks to. Every failure below it
//! (missing tab, missing record, storage error, bad ciphertext) collapses to
//! `{ "header": null }`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capture::LastHeaderCache;
use crate::security::SessionCipher;
use crate::storage::EncryptedSessionStore;
use crate::tabs::{TabId, TabQuery};

/// Inbound UI message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    #[serde(rename = "getLastAuthHeader")]
    GetLastAuthHeader,
}

impl Request {
    /// Parses a raw message, `None` for message types this service does not
    /// answer
    pub fn from_message(message: &Value) -> Option<Self> {
        serde_json::from_value(message.clone()).ok()
    }
}

/// Reply to [`Request::GetLastAuthHeader`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub header: Option<String>,
}

/// Reads captured headers back out of the cache or encrypted storage
pub struct RetrievalService {
    tabs: Arc<dyn TabQuery>,
    cache: Arc<LastHeaderCache>,
    store: Arc<EncryptedSessionStore>,
    cipher: Arc<SessionCipher>,
}

impl RetrievalService {
    pub fn new(
        tabs: Arc<dyn TabQuery>,
        cache: Arc<LastHeaderCache>,
        store: Arc<EncryptedSessionStore>,
        cipher: Arc<SessionCipher>,
    ) -> Self {
        Self {
            tabs,
            cache,
            store,
            cipher,
        }
    }

    /// Answers a UI request
    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::GetLastAuthHeader => Response {
                header: self.get_last_header_for_active_tab().await,
            },
        }
    }

    /// Last captured header for the active tab of the focused window
    pub async fn get_last_header_for_active_tab(&self) -> Option<String> {
        let tab_id = self.tabs.active_tab().await?;
        self.get_last_header_for_tab(tab_id).await
    }

    /// Last captured header for a specific tab
    ///
    /// Cache first; falls back to decrypting the session record, which is the
    /// path taken after the service restarted mid-session.
    pub async fn get_last_header_for_tab(&self, tab_id: TabId) -> Option<String> {
        if let Some(header) = self.cache.get(tab_id).filter(|h| !h.is_empty()) {
            return Some(header);
        }

        let blob = match self.store.get(tab_id).await {
            Ok(Some(blob)) => blob,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(tab_id, "Failed to read stored header: {}", e);
                return None;
            }
        };

        match self.cipher.decrypt(&blob).await {
            Ok(header) if !header.is_empty() => Some(header),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(tab_id, "Decryption failed: {}", e);
                None
            }
        }
    }
}
