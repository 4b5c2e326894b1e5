//! Security module - Session encryption, redaction, and secret handling
//!
//! This module provides security primitives for:
//! - Encrypting captured headers under an ephemeral session key
//! - Sanitizing credentials and URLs for logs
//! - Secret strings with zeroization

mod cipher;
mod sanitizer;
mod secure_string;

pub use cipher::{
    CipherError, SessionCipher, SessionKey, DEFAULT_SALT_KEY, NONCE_LEN, SALT_LEN, TAG_LEN,
};
pub use sanitizer::Sanitizer;
pub use secure_string::SecureString;
