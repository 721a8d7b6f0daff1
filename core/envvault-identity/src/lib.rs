//! Device identity for env-vault.
//!
//! One identity per host user, rooted at `~/.env-vault/`:
//!
//! ```text
//! <root>/config.json          device label, fingerprint, created-at
//! <root>/identity/private.key X25519 secret, AEAD-sealed under the password key
//! <root>/identity/public.key  32 raw bytes, stored in the clear
//! <root>/identity/salt        16 raw bytes, immutable
//! ```
//!
//! The password never persists; unlocking derives a key (current scrypt
//! parameters first, then the legacy set for identities created by older
//! releases) and opens the sealed private key in memory. Unlock never
//! writes — migrating a legacy identity to current parameters is a
//! separate, explicit operation.

mod config;

pub use config::{DeviceConfig, KdfGeneration};

use chrono::Utc;
use envvault_crypto::{
    decrypt, derive_key, encrypt, fingerprint, CryptoError, DeviceKeyPair, KdfParams, Salt,
    PUBLIC_KEY_SIZE, SALT_SIZE,
};
use envvault_store::atomic::{create_dir_secure, read_optional, write_atomic, MODE_SECRET_FILE};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Default identity root directory name, under the user's home.
pub const ROOT_DIR: &str = ".env-vault";

const IDENTITY_DIR: &str = "identity";
const PRIVATE_KEY_FILE: &str = "private.key";
const PUBLIC_KEY_FILE: &str = "public.key";
const SALT_FILE: &str = "salt";
const CONFIG_FILE: &str = "config.json";

/// Minimum password length in bytes.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("no identity found (run init first)")]
    NoIdentity,

    #[error("identity already initialized")]
    AlreadyInitialized,

    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,

    #[error("wrong password")]
    WrongPassword,

    #[error("identity files corrupted: {0}")]
    Corrupt(String),

    #[error("cannot determine home directory")]
    NoHome,

    #[error("malformed config: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// An identity opened with the correct password.
pub struct UnlockedIdentity {
    pub keypair: DeviceKeyPair,
    /// Set when the private key only opened under the legacy KDF
    /// parameters; callers should surface an upgrade advisory.
    pub used_legacy_kdf: bool,
}

/// Handle on the identity files under one root directory.
pub struct IdentityStore {
    root: PathBuf,
}

impl IdentityStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// The conventional per-user root, `~/.env-vault`.
    pub fn default_root() -> IdentityResult<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(ROOT_DIR))
            .ok_or(IdentityError::NoHome)
    }

    pub fn open_default() -> IdentityResult<Self> {
        Ok(Self {
            root: Self::default_root()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn identity_dir(&self) -> PathBuf {
        self.root.join(IDENTITY_DIR)
    }

    pub fn private_key_path(&self) -> PathBuf {
        self.identity_dir().join(PRIVATE_KEY_FILE)
    }

    pub fn public_key_path(&self) -> PathBuf {
        self.identity_dir().join(PUBLIC_KEY_FILE)
    }

    pub fn salt_path(&self) -> PathBuf {
        self.identity_dir().join(SALT_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn is_initialized(&self) -> bool {
        self.private_key_path().is_file() && self.salt_path().is_file()
    }

    /// Creates the identity: keypair, salt, sealed private key, config.
    ///
    /// New identities always use the current KDF parameters.
    pub fn initialize(&self, password: &str, device_label: &str) -> IdentityResult<DeviceConfig> {
        self.initialize_with_params(password, device_label, &KdfParams::CURRENT)
    }

    /// As [`initialize`](Self::initialize), with explicit KDF parameters.
    ///
    /// Exists so tests and migration tooling can materialize identities
    /// as older releases wrote them; everything else wants `initialize`.
    pub fn initialize_with_params(
        &self,
        password: &str,
        device_label: &str,
        params: &KdfParams,
    ) -> IdentityResult<DeviceConfig> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(IdentityError::PasswordTooShort);
        }
        if self.is_initialized() {
            return Err(IdentityError::AlreadyInitialized);
        }

        let keypair = DeviceKeyPair::generate();
        let salt = Salt::random();
        let derived = derive_key(password, &salt, params).map_err(corrupt)?;
        let sealed = encrypt(&derived, &keypair.secret_bytes()).map_err(corrupt)?;

        let generation = if *params == KdfParams::CURRENT {
            KdfGeneration::Current
        } else {
            KdfGeneration::Legacy
        };
        let config = DeviceConfig {
            created_at: Utc::now(),
            device_label: device_label.to_string(),
            fingerprint: fingerprint(&keypair.public_bytes()),
            kdf: Some(generation),
        };

        create_dir_secure(&self.root)?;
        create_dir_secure(&self.identity_dir())?;
        write_atomic(&self.salt_path(), salt.as_bytes(), MODE_SECRET_FILE)?;
        write_atomic(&self.public_key_path(), &keypair.public_bytes(), MODE_SECRET_FILE)?;
        write_atomic(&self.private_key_path(), &sealed, MODE_SECRET_FILE)?;

        let mut config_bytes = serde_json::to_vec_pretty(&config)?;
        config_bytes.push(b'\n');
        write_atomic(&self.config_path(), &config_bytes, MODE_SECRET_FILE)?;

        info!(fingerprint = %config.fingerprint, "identity initialized");
        Ok(config)
    }

    /// Opens the sealed private key with `password`.
    ///
    /// Tries the current KDF parameters, then the legacy set. Both
    /// failing reads as [`IdentityError::WrongPassword`]; nothing in the
    /// error distinguishes a bad password from tampered key material,
    /// and no file is written either way.
    pub fn unlock(&self, password: &str) -> IdentityResult<UnlockedIdentity> {
        if !self.is_initialized() {
            return Err(IdentityError::NoIdentity);
        }

        let salt = self.load_salt()?;
        let sealed = read_optional(&self.private_key_path())?.ok_or(IdentityError::NoIdentity)?;

        for (params, legacy) in [(KdfParams::CURRENT, false), (KdfParams::LEGACY, true)] {
            let derived = derive_key(password, &salt, &params).map_err(corrupt)?;
            match decrypt(&derived, &sealed) {
                Ok(secret) => {
                    let secret: [u8; 32] = secret
                        .try_into()
                        .map_err(|_| IdentityError::Corrupt("private key length".into()))?;
                    if legacy {
                        warn!("identity uses legacy KDF parameters; an upgrade is recommended");
                    }
                    return Ok(UnlockedIdentity {
                        keypair: DeviceKeyPair::from_secret_bytes(secret),
                        used_legacy_kdf: legacy,
                    });
                }
                Err(CryptoError::Integrity) => continue,
                Err(e) => return Err(corrupt(e)),
            }
        }

        Err(IdentityError::WrongPassword)
    }

    /// The device public key; readable without the password.
    pub fn public_key(&self) -> IdentityResult<[u8; PUBLIC_KEY_SIZE]> {
        let bytes = read_optional(&self.public_key_path())?.ok_or(IdentityError::NoIdentity)?;
        bytes
            .try_into()
            .map_err(|_| IdentityError::Corrupt("public key length".into()))
    }

    /// Fingerprint of the device public key; readable without the password.
    pub fn fingerprint(&self) -> IdentityResult<String> {
        Ok(fingerprint(&self.public_key()?))
    }

    pub fn config(&self) -> IdentityResult<DeviceConfig> {
        let bytes = read_optional(&self.config_path())?.ok_or(IdentityError::NoIdentity)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Deletes the identity root: identity material and central vaults.
    /// Consent is the caller's concern.
    pub fn reset(&self) -> IdentityResult<()> {
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root)?;
        }
        info!("identity root removed");
        Ok(())
    }

    fn load_salt(&self) -> IdentityResult<Salt> {
        let bytes = read_optional(&self.salt_path())?.ok_or(IdentityError::NoIdentity)?;
        let bytes: [u8; SALT_SIZE] = bytes
            .try_into()
            .map_err(|_| IdentityError::Corrupt("salt length".into()))?;
        Ok(Salt::from_bytes(bytes))
    }
}

fn corrupt(e: CryptoError) -> IdentityError {
    IdentityError::Corrupt(e.to_string())
}
