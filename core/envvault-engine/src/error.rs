//! Engine error taxonomy.
//!
//! Every cryptographic failure below the engine collapses into two
//! externally visible kinds: [`VaultError::BadCredentials`] for password
//! failures and [`VaultError::Integrity`] for data failures. Messages
//! never echo ciphertext, keys, or plaintext, and `Integrity` never says
//! whether the key was wrong or the data tampered.

use envvault_crypto::CryptoError;
use envvault_identity::IdentityError;
use envvault_store::StoreError;
use thiserror::Error;

/// Result type for vault engine operations.
pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("no identity found (run init first)")]
    NoIdentity,

    #[error("identity already initialized")]
    AlreadyInitialized,

    #[error("wrong password")]
    BadCredentials,

    #[error("integrity check failed (wrong key or tampered data)")]
    Integrity,

    #[error("this device is not a recipient of vault {0:?}")]
    NoAccess(String),

    #[error("fingerprint {0} is not a recipient")]
    NotARecipient(String),

    #[error("cannot revoke your own access")]
    SelfRevoke,

    #[error("invalid vault name: {0:?}")]
    InvalidName(String),

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("vault {0:?} already exists")]
    AlreadyExists(String),

    #[error("vault {0:?} not found")]
    VaultNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<IdentityError> for VaultError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::NoIdentity => VaultError::NoIdentity,
            IdentityError::AlreadyInitialized => VaultError::AlreadyInitialized,
            IdentityError::WrongPassword | IdentityError::PasswordTooShort => {
                VaultError::BadCredentials
            }
            IdentityError::Corrupt(_) | IdentityError::Config(_) => VaultError::Integrity,
            IdentityError::NoHome => VaultError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "cannot determine home directory",
            )),
            IdentityError::Io(e) => VaultError::Io(e),
        }
    }
}

impl From<StoreError> for VaultError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidName(name) => VaultError::InvalidName(name),
            StoreError::Document(_) => VaultError::Integrity,
            StoreError::Io(e) => VaultError::Io(e),
        }
    }
}

impl From<CryptoError> for VaultError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidPublicKey => VaultError::InvalidPublicKey,
            _ => VaultError::Integrity,
        }
    }
}
