//! Anonymous public-key envelopes for wrapping data encryption keys.
//!
//! X25519 key exchange + XSalsa20-Poly1305. Each seal generates a fresh
//! ephemeral keypair and attaches its public half, so the recipient can
//! open the envelope without knowing the sender, and compromise of one
//! envelope does not affect others.
//!
//! Wire layout: `ephemeral public (32) || nonce (24) || ciphertext+tag`.

use crate::error::{CryptoError, CryptoResult};
use crypto_box::aead::Aead;
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use rand::RngCore;

/// Ephemeral public key length in bytes.
pub const EPHEMERAL_PK_SIZE: usize = 32;

/// XSalsa20 nonce length in bytes.
pub const ENVELOPE_NONCE_SIZE: usize = 24;

/// Shortest well-formed envelope: header plus the Poly1305 tag of an
/// empty message.
pub const ENVELOPE_MIN_SIZE: usize = EPHEMERAL_PK_SIZE + ENVELOPE_NONCE_SIZE + 16;

/// Long-term X25519 keypair for a device identity.
///
/// The secret key implements `ZeroizeOnDrop` (from crypto_box).
pub struct DeviceKeyPair {
    pub secret: SecretKey,
    pub public: PublicKey,
}

impl DeviceKeyPair {
    pub fn generate() -> Self {
        let secret = SecretKey::generate(&mut rand::rngs::OsRng);
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Returns the public key as a raw 32-byte array.
    pub fn public_bytes(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }

    /// Returns the secret key as a raw 32-byte array.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    /// Reconstructs a keypair from raw secret key bytes.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        let secret = SecretKey::from(bytes);
        let public = secret.public_key();
        Self { secret, public }
    }
}

/// Seals `message` for a recipient public key.
///
/// A fresh ephemeral keypair is generated per call; it is consumed here
/// and never exposed to the caller.
pub fn seal(message: &[u8], recipient_pk: &PublicKey) -> CryptoResult<Vec<u8>> {
    let ephemeral = SecretKey::generate(&mut rand::rngs::OsRng);
    let ephemeral_pk = ephemeral.public_key();

    let salsa_box = SalsaBox::new(recipient_pk, &ephemeral);

    let mut nonce = [0u8; ENVELOPE_NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let ciphertext = salsa_box
        .encrypt(crypto_box::Nonce::from_slice(&nonce), message)
        .map_err(|e| CryptoError::Encryption(format!("envelope seal: {e}")))?;

    let mut out = Vec::with_capacity(ENVELOPE_MIN_SIZE + message.len());
    out.extend_from_slice(ephemeral_pk.as_bytes());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Opens an envelope produced by [`seal`] with the recipient's secret key.
///
/// Fails with [`CryptoError::Integrity`] on truncation or any tag mismatch.
pub fn open(data: &[u8], recipient_sk: &SecretKey) -> CryptoResult<Vec<u8>> {
    if data.len() < ENVELOPE_MIN_SIZE {
        return Err(CryptoError::Integrity);
    }

    let mut pk_bytes = [0u8; EPHEMERAL_PK_SIZE];
    pk_bytes.copy_from_slice(&data[..EPHEMERAL_PK_SIZE]);
    let ephemeral_pk = PublicKey::from(pk_bytes);

    let nonce = &data[EPHEMERAL_PK_SIZE..EPHEMERAL_PK_SIZE + ENVELOPE_NONCE_SIZE];
    let ciphertext = &data[EPHEMERAL_PK_SIZE + ENVELOPE_NONCE_SIZE..];

    let salsa_box = SalsaBox::new(&ephemeral_pk, recipient_sk);

    salsa_box
        .decrypt(crypto_box::Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Integrity)
}
