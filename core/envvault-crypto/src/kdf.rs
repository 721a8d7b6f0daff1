//! Password-based key derivation (scrypt) and symmetric key material.

use crate::error::{CryptoError, CryptoResult};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Symmetric key length in bytes.
pub const KEY_SIZE: usize = 32;

/// KDF salt length in bytes.
pub const SALT_SIZE: usize = 16;

/// scrypt parameter set `{N = 2^log_n, r, p}`, output fixed at 32 bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KdfParams {
    pub log_n: u8,
    pub r: u32,
    pub p: u32,
}

impl KdfParams {
    /// Parameters for new identities (N = 131072, ~128 MiB working set).
    pub const CURRENT: Self = Self { log_n: 17, r: 8, p: 1 };

    /// Parameters of identities created by older releases (N = 16384).
    /// Accepted on unlock only; never used for new material.
    pub const LEGACY: Self = Self { log_n: 14, r: 8, p: 1 };

    /// The scrypt cost factor N.
    pub fn n(&self) -> u64 {
        1u64 << self.log_n
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// 16-byte KDF salt. Generated once at identity init, immutable after.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// A 32-byte symmetric key, zeroized on drop.
///
/// Used both for password-derived keys and for per-vault DEKs; neither is
/// ever written to disk in the clear.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// Generates a fresh random 32-byte key (a per-vault DEK).
pub fn generate_random_key() -> DerivedKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    DerivedKey(bytes)
}

/// Derives a 32-byte key from a password and salt.
///
/// Deterministic for identical inputs; distinct salts with the same
/// password produce distinct keys.
pub fn derive_key(password: &str, salt: &Salt, params: &KdfParams) -> CryptoResult<DerivedKey> {
    let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, KEY_SIZE)
        .map_err(|e| CryptoError::KeyDerivation(format!("scrypt params: {e}")))?;

    let mut out = [0u8; KEY_SIZE];
    scrypt::scrypt(
        password.as_bytes(),
        salt.as_bytes(),
        &scrypt_params,
        &mut out,
    )
    .map_err(|e| CryptoError::KeyDerivation(format!("scrypt derive: {e}")))?;

    Ok(DerivedKey(out))
}
