//! authtap - Per-tab Authorization header capture for a browsing session
//!
//! Observes outgoing requests, keeps the most recent Authorization header
//! seen for each tab, and hands it back on request to a UI surface.
//!
//! ## Guarantees
//!
//! - A header is kept only if the request's hostname equals the hostname of
//!   the tab's last completed navigation
//! - Persisted values are AES-GCM encrypted under a key that lives only as
//!   long as the browsing session's storage
//! - The key is derived at most once per session, even under concurrent
//!   first use, and survives background-process restarts
//! - Closing a tab forgets its hostname, cached header, and stored record
//!
//! ## Architecture
//!
//! - **Tabs**: origin tracking and host tab lookups
//! - **Capture**: request interception and the in-memory header cache
//! - **Security**: session cipher, log redaction, zeroized secrets
//! - **Storage**: session storage seam and the encrypted per-tab store
//! - **Retrieval**: the request/response surface used by the UI
//! - **Service**: owned state for one session and host event dispatch

pub mod capture;
pub mod config;
pub mod retrieval;
pub mod security;
pub mod service;
pub mod storage;
pub mod tabs;

pub use capture::{
    Admission, DenyReason, HttpHeader, IgnoreReason, ResourceType, SendHeadersDetails,
};
pub use config::CaptureConfig;
pub use retrieval::{Request, Response, RetrievalService};
pub use service::{CaptureService, HostEvent};

use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber used by the binary and by embedders
///
/// Honors `RUST_LOG`; defaults to `info` with debug output for this crate.
/// Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,authtap_lib=debug,authtap=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
