//! Cryptographic primitives for env-vault.
//!
//! Provides the three operations the vault engine is built on:
//! - AES-256-GCM authenticated encryption for vault payloads
//! - X25519 + XSalsa20-Poly1305 sealed envelopes for wrapping data keys
//! - scrypt key derivation from passwords, with a legacy parameter set
//!   kept read-only for migrating older identities
//!
//! # Architecture
//!
//! The vault uses a two-tier key system:
//!
//! 1. **Identity key**: a long-term X25519 keypair per device. The private
//!    half is stored only as ciphertext under a password-derived key.
//!
//! 2. **DEK (data encryption key)**: a random 32-byte key per vault,
//!    rotated on every content change. The DEK is sealed separately for
//!    each recipient's public key, so granting access means wrapping the
//!    DEK once more, and revoking means rotating it.
//!
//! All functions here are stateless and operate on byte sequences; no
//! filesystem or policy decisions live in this crate.

mod cipher;
mod envelope;
mod error;
mod fingerprint;
mod kdf;

pub use cipher::{decrypt, encrypt, IV_SIZE, MIN_CIPHERTEXT_SIZE, TAG_SIZE};
pub use envelope::{open, seal, DeviceKeyPair, ENVELOPE_MIN_SIZE, ENVELOPE_NONCE_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use fingerprint::{
    decode_public_key, encode_public_key, fingerprint, FINGERPRINT_LEN, PUBLIC_KEY_SIZE,
};
pub use kdf::{derive_key, generate_random_key, DerivedKey, KdfParams, Salt, KEY_SIZE, SALT_SIZE};

pub use crypto_box::{PublicKey, SecretKey};
