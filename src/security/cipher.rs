//! Session cipher - ephemeral AES-GCM key tied to the browsing session
//!
//! The key is imported directly from a 16-byte random salt (AES-128-GCM).
//! The salt lives in session storage under `sessionSalt` so a restarted
//! service re-imports the identical key instead of orphaning the records
//! written before the restart.
//!
//! Blob layout, base64 (standard alphabet) encoded:
//!
//! ```text
//! [12 bytes: nonce][N bytes: ciphertext + 16-byte tag]
//! ```

use std::fmt;
use std::sync::Arc;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;
use tokio::sync::OnceCell;
use zeroize::Zeroizing;

use crate::storage::SessionStorage;

/// Salt length in bytes; the salt is the raw AES-128 key
pub const SALT_LEN: usize = 16;
/// AES-GCM nonce length in bytes
pub const NONCE_LEN: usize = 12;
/// AES-GCM authentication tag length in bytes
pub const TAG_LEN: usize = 16;

/// Default session-storage key holding the base64 salt
pub const DEFAULT_SALT_KEY: &str = "sessionSalt";

/// Errors that can occur in the session cipher
#[derive(Debug, Error)]
pub enum CipherError {
    /// Session storage could not be read or written during key setup
    #[error("Key initialization failed: {0}")]
    KeyInit(String),

    /// The stored salt does not decode to a usable key
    #[error("Stored salt is invalid: {0}")]
    InvalidSalt(String),

    /// AES-GCM refused to encrypt the payload
    #[error("Encryption failed")]
    Encrypt,

    /// The blob is not base64 or is too short to hold nonce and tag
    #[error("Malformed blob: {0}")]
    Malformed(String),

    /// Tag mismatch: tampered ciphertext or a key from another session
    #[error("Authentication failed")]
    Authentication,

    /// Decrypted bytes are not UTF-8
    #[error("Decrypted header is not valid UTF-8")]
    Utf8,
}

/// Imported session key
///
/// One instance exists per service lifetime; callers share it through `Arc`.
pub struct SessionKey {
    cipher: Aes128Gcm,
}

impl SessionKey {
    fn import(salt: &[u8]) -> Result<Self, CipherError> {
        if salt.len() != SALT_LEN {
            return Err(CipherError::InvalidSalt(format!(
                "expected {} bytes, got {}",
                SALT_LEN,
                salt.len()
            )));
        }
        let cipher = Aes128Gcm::new_from_slice(salt)
            .map_err(|e| CipherError::InvalidSalt(e.to_string()))?;
        Ok(Self { cipher })
    }

    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CipherError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn open(&self, raw: &[u8]) -> Result<Zeroizing<Vec<u8>>, CipherError> {
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::Malformed(format!(
                "{} bytes is shorter than nonce and tag",
                raw.len()
            )));
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| CipherError::Authentication)
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKey")
            .field("algorithm", &"AES-128-GCM")
            .field("material", &"[REDACTED]")
            .finish()
    }
}

/// Encrypts captured headers under the session key
///
/// The key is derived lazily on first use. Concurrent first callers all wait
/// on the same initialization, so at most one salt is ever generated and
/// stored per session. A failed initialization is not cached; the next call
/// tries again from storage.
pub struct SessionCipher {
    storage: Arc<dyn SessionStorage>,
    salt_key: String,
    key: OnceCell<Arc<SessionKey>>,
}

impl SessionCipher {
    /// Creates a cipher that keeps its salt under `sessionSalt`
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self::with_salt_key(storage, DEFAULT_SALT_KEY)
    }

    /// Creates a cipher with a custom salt storage key
    pub fn with_salt_key(storage: Arc<dyn SessionStorage>, salt_key: impl Into<String>) -> Self {
        Self {
            storage,
            salt_key: salt_key.into(),
            key: OnceCell::new(),
        }
    }

    /// Returns the storage key the salt is kept under
    pub fn salt_key(&self) -> &str {
        &self.salt_key
    }

    /// Returns true once the key has been derived in this process
    pub fn is_initialized(&self) -> bool {
        self.key.initialized()
    }

    /// Returns the session key, deriving it at most once
    pub async fn get_or_init_key(&self) -> Result<Arc<SessionKey>, CipherError> {
        self.key
            .get_or_try_init(|| self.derive_key())
            .await
            .map(Arc::clone)
    }

    async fn derive_key(&self) -> Result<Arc<SessionKey>, CipherError> {
        let stored = self
            .storage
            .get(&self.salt_key)
            .await
            .map_err(|e| CipherError::KeyInit(e.to_string()))?;

        let salt = match stored {
            Some(encoded) => {
                let salt = STANDARD
                    .decode(encoded.as_bytes())
                    .map(Zeroizing::new)
                    .map_err(|e| CipherError::InvalidSalt(e.to_string()))?;
                tracing::info!("Restored session key from stored salt");
                salt
            }
            None => {
                let salt = Zeroizing::new(Aes128Gcm::generate_key(&mut OsRng).to_vec());
                self.storage
                    .set(&self.salt_key, STANDARD.encode(salt.as_slice()))
                    .await
                    .map_err(|e| CipherError::KeyInit(e.to_string()))?;
                tracing::info!("Generated new session salt");
                salt
            }
        };

        SessionKey::import(&salt).map(Arc::new)
    }

    /// Encrypts a header value under a fresh random nonce
    ///
    /// Returns the base64 blob ready for session storage.
    pub async fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let key = self.get_or_init_key().await?;
        let sealed = key.seal(plaintext.as_bytes())?;
        Ok(STANDARD.encode(sealed))
    }

    /// Decrypts a blob produced by [`SessionCipher::encrypt`]
    ///
    /// Malformed input and authentication failures come back as errors;
    /// nothing here panics on hostile input.
    pub async fn decrypt(&self, blob: &str) -> Result<String, CipherError> {
        let raw = STANDARD
            .decode(blob.as_bytes())
            .map_err(|e| CipherError::Malformed(e.to_string()))?;
        let key = self.get_or_init_key().await?;
        let plaintext = key.open(&raw)?;
        String::from_utf8(plaintext.to_vec()).map_err(|_| CipherError::Utf8)
    }
}
