//! Captured credential holder with memory zeroization
//!
//! Header values kept in the in-memory cache are wrapped so they are wiped
//! when evicted and never show up in `Debug` output.

use std::fmt;
use std::ops::Deref;
use zeroize::Zeroize;

/// A string that clears its memory when dropped
///
/// # Example
///
/// ```
/// use authtap_lib::security::SecureString;
///
/// let header = SecureString::new("Bearer abc123".to_string());
/// assert_eq!(header.as_str(), "Bearer abc123");
/// assert!(!format!("{:?}", header).contains("abc123"));
/// ```
#[derive(Clone)]
pub struct SecureString {
    inner: String,
}

impl SecureString {
    /// Takes ownership of the value; its buffer is wiped on drop
    pub fn new(s: String) -> Self {
        Self { inner: s }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Copies the value out for a caller that needs an owned `String`
    ///
    /// The copy is not zeroized. Used only at the retrieval boundary where the
    /// value leaves the core.
    pub fn expose(&self) -> String {
        self.inner.clone()
    }
}

impl Drop for SecureString {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl Zeroize for SecureString {
    fn zeroize(&mut self) {
        self.inner.zeroize();
    }
}

impl Deref for SecureString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureString")
            .field("len", &self.inner.len())
            .field("content", &"[REDACTED]")
            .finish()
    }
}
