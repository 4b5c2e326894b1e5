//! Capture module - Request observation and the last-header cache
//!
//! Provides:
//! - The send-headers interceptor enforcing same-origin admission
//! - The volatile per-tab plaintext cache used as the retrieval fast path

mod cache;
mod interceptor;

pub use cache::LastHeaderCache;
pub use interceptor::{
    Admission, DenyReason, HeaderInterceptor, HttpHeader, IgnoreReason, ResourceType,
    SendHeadersDetails,
};
