//! Capture service - owned state for one browsing session
//!
//! Wires the tracker, cache, cipher, encrypted store, interceptor and
//! retrieval service together and exposes them as host event handlers.
//! Create one per background-process start; drop it when the process goes
//! away. Session storage outlives it, so a new instance picks up the same
//! key and records.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::capture::{Admission, HeaderInterceptor, LastHeaderCache, SendHeadersDetails};
use crate::config::CaptureConfig;
use crate::retrieval::{Request, Response, RetrievalService};
use crate::security::SessionCipher;
use crate::storage::{EncryptedSessionStore, SessionStorage};
use crate::tabs::{TabId, TabOriginTracker, TabQuery};

/// Tab status reported once a navigation has finished loading
pub const STATUS_COMPLETE: &str = "complete";

/// Inbound host event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HostEvent {
    /// Tab load state changed
    #[serde(rename_all = "camelCase")]
    TabUpdated {
        tab_id: TabId,
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        url: Option<String>,
    },
    /// Tab became active in its window
    #[serde(rename_all = "camelCase")]
    TabActivated { tab_id: TabId },
    /// Tab closed
    #[serde(rename_all = "camelCase")]
    TabRemoved { tab_id: TabId },
    /// Request headers finalized
    SendHeaders(SendHeadersDetails),
    /// Message from the UI layer
    Message { body: Value },
}

/// Session-scoped header capture service
pub struct CaptureService {
    config: CaptureConfig,
    tabs: Arc<dyn TabQuery>,
    tracker: Arc<TabOriginTracker>,
    cache: Arc<LastHeaderCache>,
    store: Arc<EncryptedSessionStore>,
    interceptor: HeaderInterceptor,
    retrieval: RetrievalService,
}

impl CaptureService {
    /// Creates a service with the default configuration
    pub fn new(storage: Arc<dyn SessionStorage>, tabs: Arc<dyn TabQuery>) -> Self {
        Self::with_config(CaptureConfig::default(), storage, tabs)
    }

    /// Creates a service with a custom configuration
    pub fn with_config(
        config: CaptureConfig,
        storage: Arc<dyn SessionStorage>,
        tabs: Arc<dyn TabQuery>,
    ) -> Self {
        let tracker = Arc::new(TabOriginTracker::new());
        let cache = Arc::new(LastHeaderCache::new());
        let cipher = Arc::new(SessionCipher::with_salt_key(
            Arc::clone(&storage),
            config.salt_key.clone(),
        ));
        let store = Arc::new(EncryptedSessionStore::with_prefix(
            storage,
            config.record_prefix.clone(),
        ));

        let interceptor = HeaderInterceptor::new(
            config.clone(),
            Arc::clone(&tracker),
            Arc::clone(&cache),
            Arc::clone(&cipher),
            Arc::clone(&store),
        );
        let retrieval = RetrievalService::new(
            Arc::clone(&tabs),
            Arc::clone(&cache),
            Arc::clone(&store),
            cipher,
        );

        tracing::info!(header = %config.header_name, "Capture service started");

        Self {
            config,
            tabs,
            tracker,
            cache,
            store,
            interceptor,
            retrieval,
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn tracker(&self) -> &TabOriginTracker {
        &self.tracker
    }

    pub fn cache(&self) -> &LastHeaderCache {
        &self.cache
    }

    pub fn store(&self) -> &EncryptedSessionStore {
        &self.store
    }

    /// Applies a tab update; only finished loads with a URL count as navigation
    pub fn on_tab_updated(&self, tab_id: TabId, status: Option<&str>, url: Option<&str>) -> bool {
        match (status, url) {
            (Some(STATUS_COMPLETE), Some(url)) => self.on_navigation_complete(tab_id, url),
            _ => false,
        }
    }

    pub fn on_navigation_complete(&self, tab_id: TabId, url: &str) -> bool {
        self.tracker.on_navigation_complete(tab_id, url)
    }

    pub async fn on_tab_activated(&self, tab_id: TabId) -> bool {
        self.tracker.on_tab_activated(tab_id, self.tabs.as_ref()).await
    }

    /// Forgets everything held for a closed tab
    ///
    /// In-memory state goes first and synchronously; the encrypted record is
    /// removed after. A storage failure is logged and otherwise ignored.
    pub async fn on_tab_removed(&self, tab_id: TabId) {
        self.cache.remove(tab_id);
        self.tracker.on_tab_removed(tab_id);
        if let Err(e) = self.store.remove(tab_id).await {
            tracing::warn!(tab_id, "Failed to remove stored header: {}", e);
        }
        tracing::debug!(tab_id, "Tab state cleared");
    }

    pub fn on_send_headers(&self, details: &SendHeadersDetails) -> Admission {
        self.interceptor.on_send_headers(details)
    }

    pub async fn get_last_header_for_active_tab(&self) -> Option<String> {
        self.retrieval.get_last_header_for_active_tab().await
    }

    /// Answers a UI message, `None` for message types this service ignores
    pub async fn handle_message(&self, message: &Value) -> Option<Response> {
        let request = Request::from_message(message)?;
        Some(self.retrieval.handle(request).await)
    }

    /// Message-port style dispatch with a deferred reply
    ///
    /// # Returns
    ///
    /// `true` if a reply will be sent on `responder` later, `false` if the
    /// message is not for this service (the responder is dropped)
    pub fn on_message(
        self: &Arc<Self>,
        message: Value,
        responder: oneshot::Sender<Response>,
    ) -> bool {
        let Some(request) = Request::from_message(&message) else {
            return false;
        };
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("No async runtime; message left unanswered");
                return false;
            }
        };

        let service = Arc::clone(self);
        handle.spawn(async move {
            let response = service.retrieval.handle(request).await;
            if responder.send(response).is_err() {
                tracing::debug!("Message sender went away before the reply");
            }
        });
        true
    }

    /// Dispatches one host event
    ///
    /// # Returns
    ///
    /// The reply for message events this service answers
    pub async fn handle_event(&self, event: HostEvent) -> Option<Response> {
        match event {
            HostEvent::TabUpdated {
                tab_id,
                status,
                url,
            } => {
                self.on_tab_updated(tab_id, status.as_deref(), url.as_deref());
                None
            }
            HostEvent::TabActivated { tab_id } => {
                self.on_tab_activated(tab_id).await;
                None
            }
            HostEvent::TabRemoved { tab_id } => {
                self.on_tab_removed(tab_id).await;
                None
            }
            HostEvent::SendHeaders(details) => {
                self.on_send_headers(&details);
                None
            }
            HostEvent::Message { body } => self.handle_message(&body).await,
        }
    }

    /// Waits for in-flight encrypted writes
    pub async fn flush(&self) {
        self.interceptor.flush().await;
    }
}
