//! Authenticated symmetric encryption for vault payloads.
//!
//! AES-256-GCM with a random 12-byte IV per encryption.
//! Wire layout: `IV (12) || ciphertext || auth tag (16)`.

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::DerivedKey;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;

/// GCM nonce length in bytes.
pub const IV_SIZE: usize = 12;

/// GCM authentication tag length in bytes.
pub const TAG_SIZE: usize = 16;

/// Shortest well-formed ciphertext: IV plus tag over an empty plaintext.
pub const MIN_CIPHERTEXT_SIZE: usize = IV_SIZE + TAG_SIZE;

/// Encrypts `plaintext` under `key`, prepending a fresh random IV.
///
/// Two encryptions of identical plaintext produce different outputs.
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let mut iv = [0u8; IV_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|e| CryptoError::Encryption(format!("aead encrypt: {e}")))?;

    let mut out = Vec::with_capacity(IV_SIZE + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypts `IV || ciphertext || tag` produced by [`encrypt`].
///
/// Fails with [`CryptoError::Integrity`] when the input is shorter than
/// 28 bytes or the authentication tag does not verify.
pub fn decrypt(key: &DerivedKey, data: &[u8]) -> CryptoResult<Vec<u8>> {
    if data.len() < MIN_CIPHERTEXT_SIZE {
        return Err(CryptoError::Integrity);
    }

    let (iv, ciphertext) = data.split_at(IV_SIZE);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| CryptoError::Integrity)
}
