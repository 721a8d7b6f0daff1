//! Crypto error types.

use thiserror::Error;

/// Result type for primitive operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors surfaced by the primitives layer.
///
/// Every AEAD verification failure collapses to [`CryptoError::Integrity`]
/// so callers cannot distinguish a wrong key from tampered data.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("integrity check failed (wrong key or tampered data)")]
    Integrity,

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("invalid public key encoding")]
    InvalidPublicKey,
}
