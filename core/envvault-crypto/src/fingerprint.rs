//! Public-key fingerprints and base64 encoding.

use crate::error::{CryptoError, CryptoResult};
use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};

/// Raw X25519 public key length in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Fingerprint length in hex characters.
pub const FINGERPRINT_LEN: usize = 16;

/// First 8 bytes of SHA-256(public key), as 16 lowercase hex characters.
///
/// A display identifier with a 32-bit birthday bound; not an
/// authentication token.
pub fn fingerprint(public_key: &[u8; PUBLIC_KEY_SIZE]) -> String {
    let digest = Sha256::digest(public_key);
    hex::encode(&digest[..FINGERPRINT_LEN / 2])
}

/// Decodes a base64 public key, rejecting anything but exactly 32 raw bytes.
pub fn decode_public_key(encoded: &str) -> CryptoResult<[u8; PUBLIC_KEY_SIZE]> {
    let bytes = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| CryptoError::InvalidPublicKey)?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidPublicKey)
}

/// Encodes a raw public key as base64 for display and the recipients file.
pub fn encode_public_key(public_key: &[u8; PUBLIC_KEY_SIZE]) -> String {
    general_purpose::STANDARD.encode(public_key)
}
