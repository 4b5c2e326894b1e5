//! Header interceptor - observes outgoing requests and captures credentials
//!
//! Runs synchronously inside the host's send-headers hook. It never touches
//! the request itself: it decides admission, updates the in-memory cache, and
//! hands encryption and persistence to a background task so the request is
//! never delayed.
//!
//! Admission is a strict hostname equality check against the tab's last
//! navigation. Suffix or registrable-domain matching would let a sibling
//! subdomain harvest the parent's credentials.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;

use super::cache::LastHeaderCache;
use crate::config::CaptureConfig;
use crate::security::{Sanitizer, SecureString, SessionCipher};
use crate::storage::EncryptedSessionStore;
use crate::tabs::{hostname_from_url, TabId, TabOriginTracker};

/// Host resource kind of an outgoing request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    MainFrame,
    SubFrame,
    Stylesheet,
    Script,
    Image,
    Font,
    Object,
    /// Programmatic `fetch` and `XMLHttpRequest`
    #[serde(rename = "xmlhttprequest")]
    XmlHttpRequest,
    Ping,
    CspReport,
    Media,
    Websocket,
    #[serde(other)]
    Other,
}

/// One request header as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub name: String,
    /// Absent when the host only reports a binary value
    #[serde(default)]
    pub value: Option<String>,
}

impl HttpHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// Per-request details delivered when headers are finalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendHeadersDetails {
    /// Owning tab, negative when the request has no tab
    pub tab_id: TabId,
    pub url: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(default)]
    pub request_headers: Option<Vec<HttpHeader>>,
}

/// Why a request was not considered for capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Not tied to a concrete tab
    NoTab,
    /// Resource kind outside the capture filter
    ResourceType,
    /// Host delivered no header list
    NoHeaders,
    /// No header with the configured name (or it had no text value)
    NoAuthorization,
}

/// Why a present header was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Tab has no recorded navigation hostname
    UnknownTabOrigin,
    /// Request hostname differs from the tab's hostname
    CrossOrigin,
    /// Request URL did not parse or has no host
    MalformedUrl,
}

/// Outcome of inspecting one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Header cached and queued for encrypted persistence
    Admitted,
    /// Nothing to capture
    Ignored(IgnoreReason),
    /// A header was present but failed the same-origin rule
    Denied(DenyReason),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Admission::Denied(_))
    }
}

/// Captures the configured header from same-origin requests
pub struct HeaderInterceptor {
    config: CaptureConfig,
    tracker: Arc<TabOriginTracker>,
    cache: Arc<LastHeaderCache>,
    cipher: Arc<SessionCipher>,
    store: Arc<EncryptedSessionStore>,
    writes: TaskTracker,
}

impl HeaderInterceptor {
    pub fn new(
        config: CaptureConfig,
        tracker: Arc<TabOriginTracker>,
        cache: Arc<LastHeaderCache>,
        cipher: Arc<SessionCipher>,
        store: Arc<EncryptedSessionStore>,
    ) -> Self {
        Self {
            config,
            tracker,
            cache,
            cipher,
            store,
            writes: TaskTracker::new(),
        }
    }

    /// Inspects a request whose headers are about to be sent
    ///
    /// On admission the cache is updated before this returns; the encrypted
    /// write completes later. Must be called from within a tokio runtime for
    /// the write to happen; otherwise the capture stays memory-only.
    pub fn on_send_headers(&self, details: &SendHeadersDetails) -> Admission {
        let (header, generation) = match self.admit(details) {
            Ok(admitted) => admitted,
            Err(outcome) => {
                if let Admission::Denied(reason) = outcome {
                    tracing::debug!(
                        tab_id = details.tab_id,
                        url = %Sanitizer::sanitize_url(&details.url),
                        ?reason,
                        "Header capture denied"
                    );
                }
                return outcome;
            }
        };

        let tab_id = details.tab_id;
        tracing::debug!(
            tab_id,
            header = %Sanitizer::sanitize_header(header),
            "Captured header"
        );

        self.cache.set(tab_id, SecureString::new(header.to_string()));
        self.persist(tab_id, generation, SecureString::new(header.to_string()));
        Admission::Admitted
    }

    /// Applies the capture filter and the same-origin rule
    ///
    /// Returns the header value with the tab generation it was admitted under.
    fn admit<'a>(&self, details: &'a SendHeadersDetails) -> Result<(&'a str, u64), Admission> {
        if details.tab_id < 0 {
            return Err(Admission::Ignored(IgnoreReason::NoTab));
        }
        if !self.config.captures(details.resource_type) {
            return Err(Admission::Ignored(IgnoreReason::ResourceType));
        }
        let headers = details
            .request_headers
            .as_deref()
            .ok_or(Admission::Ignored(IgnoreReason::NoHeaders))?;

        let header = headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(&self.config.header_name))
            .and_then(|h| h.value.as_deref())
            .ok_or(Admission::Ignored(IgnoreReason::NoAuthorization))?;

        let request_host = match hostname_from_url(&details.url) {
            Ok(Some(host)) => host,
            _ => return Err(Admission::Denied(DenyReason::MalformedUrl)),
        };
        let tab = self
            .tracker
            .state_of(details.tab_id)
            .ok_or(Admission::Denied(DenyReason::UnknownTabOrigin))?;
        let tab_host = tab
            .hostname
            .ok_or(Admission::Denied(DenyReason::UnknownTabOrigin))?;

        if request_host != tab_host {
            return Err(Admission::Denied(DenyReason::CrossOrigin));
        }
        Ok((header, tab.generation))
    }

    /// Encrypts and stores a captured header off the request path
    ///
    /// The record is written only while the tab still holds `generation`. If
    /// the tab closes while `put` is in flight, the record is removed again.
    fn persist(&self, tab_id: TabId, generation: u64, header: SecureString) {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(tab_id, "No async runtime; capture kept in memory only");
                return;
            }
        };

        let cipher = Arc::clone(&self.cipher);
        let store = Arc::clone(&self.store);
        let tracker = Arc::clone(&self.tracker);

        self.writes.spawn_on(
            async move {
                let blob = match cipher.encrypt(header.as_str()).await {
                    Ok(blob) => blob,
                    Err(e) => {
                        tracing::warn!(tab_id, "Dropping capture, encryption failed: {}", e);
                        return;
                    }
                };
                if tracker.generation_of(tab_id) != Some(generation) {
                    tracing::debug!(tab_id, "Tab closed before write completed");
                    return;
                }
                if let Err(e) = store.put(tab_id, blob).await {
                    tracing::warn!(tab_id, "Failed to persist capture: {}", e);
                    return;
                }
                if tracker.generation_of(tab_id) != Some(generation) {
                    tracing::debug!(tab_id, "Tab closed during write, removing record");
                    if let Err(e) = store.remove(tab_id).await {
                        tracing::warn!(tab_id, "Failed to remove stale record: {}", e);
                    }
                }
            },
            &handle,
        );
    }

    /// Waits for every background write issued so far
    ///
    /// Not meant to be called from several tasks at once.
    pub async fn flush(&self) {
        self.writes.close();
        self.writes.wait().await;
        self.writes.reopen();
    }

    /// Number of background writes still running
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }
}
