//! Vault engine: the DEK lifecycle over identity and artifact storage.
//!
//! Every vault payload is encrypted under a per-vault DEK; the DEK is
//! sealed separately for each recipient's public key inside the
//! recipients document. The engine owns the invariant that ciphertext,
//! recipients document, and `dek_version` agree:
//!
//! - content mutations (`put`, a non-trivial `edit`) and `revoke` rotate
//!   the DEK and bump `dek_version`
//! - `share` wraps the *current* DEK once more; the version is unchanged
//! - writes go payload first, then recipients — a crash in between is
//!   detected as `Integrity` on the next decrypt and repaired by
//!   re-running the mutation
//!
//! The engine borrows an [`IdentityStore`] and an [`ArtifactStore`] and
//! holds no state of its own across calls.

mod error;
pub mod doctor;

pub use doctor::{run_doctor, DoctorReport};
pub use error::{VaultError, VaultResult};
pub use envvault_store::{ArtifactStore, RecipientRecord, RecipientsDoc, VaultMeta};

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use envvault_crypto::{
    decode_public_key, decrypt, encode_public_key, encrypt, fingerprint, generate_random_key,
    open, seal, DerivedKey, DeviceKeyPair, PublicKey,
};
use envvault_identity::IdentityStore;
use serde::Serialize;
use tracing::{debug, info};

/// Outcome of a `share` call; adding an existing recipient is an
/// idempotent report, not an error.
#[derive(Debug)]
pub enum ShareOutcome {
    Added { fingerprint: String, label: String },
    AlreadyShared { fingerprint: String, label: String },
}

/// One row of the recipients listing.
#[derive(Debug, Serialize)]
pub struct RecipientInfo {
    pub fingerprint: String,
    pub label: String,
    #[serde(rename = "publicKey")]
    pub public_key: String,
    #[serde(rename = "addedAt")]
    pub added_at: DateTime<Utc>,
    #[serde(rename = "isCaller")]
    pub is_caller: bool,
}

/// Read-only view of a vault's recipients document.
#[derive(Debug, Serialize)]
pub struct RecipientsList {
    pub dek_version: u64,
    pub recipients: Vec<RecipientInfo>,
}

/// Executes vault operations against one identity and one vault.
pub struct VaultEngine<'a> {
    identity: &'a IdentityStore,
    store: &'a ArtifactStore,
}

impl<'a> VaultEngine<'a> {
    pub fn new(identity: &'a IdentityStore, store: &'a ArtifactStore) -> Self {
        Self { identity, store }
    }

    /// Creates the vault with `plaintext` as its first payload.
    ///
    /// The caller becomes the sole recipient, labelled from the device
    /// config, at `dek_version` 1. An existing vault fails with
    /// `AlreadyExists` unless `overwrite` consent was given.
    pub fn init_vault(&self, password: &str, plaintext: &[u8], overwrite: bool) -> VaultResult<()> {
        if !self.identity.is_initialized() {
            return Err(VaultError::NoIdentity);
        }
        if self.store.exists() && !overwrite {
            return Err(VaultError::AlreadyExists(self.store.name().to_string()));
        }

        let unlocked = self.identity.unlock(password)?;
        let label = self.identity.config()?.device_label;

        let dek = generate_random_key();
        let payload = encrypt(&dek, plaintext)?;

        let mut doc = RecipientsDoc::new(1);
        let caller_pk = unlocked.keypair.public_bytes();
        doc.recipients.insert(
            fingerprint(&caller_pk),
            RecipientRecord {
                label,
                public_key: encode_public_key(&caller_pk),
                wrapped_dek: wrap_for(&dek, &PublicKey::from(caller_pk))?,
                added_at: Utc::now(),
            },
        );

        self.store.save_payload(&payload)?;
        self.store.save_recipients(&doc)?;
        self.store.save_meta(&VaultMeta {
            name: self.store.name().to_string(),
            created_at: Utc::now(),
        })?;

        info!(vault = %self.store.name(), "vault created");
        Ok(())
    }

    /// Replaces the vault content, rotating the DEK.
    ///
    /// Behaves like [`init_vault`](Self::init_vault) when the vault does
    /// not exist yet. Otherwise the new DEK is re-wrapped for every
    /// pre-existing recipient (labels, keys, and added-at preserved) and
    /// `dek_version` increases by one, so a revoked recipient who kept
    /// old wrapped-DEK copies cannot read anything written after the
    /// revocation.
    pub fn put(&self, password: &str, plaintext: &[u8]) -> VaultResult<()> {
        if !self.store.exists() {
            return self.init_vault(password, plaintext, false);
        }

        let unlocked = self.identity.unlock(password)?;
        let mut doc = self.load_recipients_required()?;
        let caller_fp = fingerprint(&unlocked.keypair.public_bytes());

        let record = doc
            .get(&caller_fp)
            .ok_or_else(|| VaultError::NoAccess(self.store.name().to_string()))?;
        // Opening the current DEK proves the caller's record is intact
        let _current = open_wrapped(record, &unlocked.keypair)?;

        let new_dek = generate_random_key();
        let payload = encrypt(&new_dek, plaintext)?;
        rewrap_all(&mut doc, &new_dek)?;
        doc.dek_version += 1;

        self.store.save_payload(&payload)?;
        self.store.save_recipients(&doc)?;

        info!(
            vault = %self.store.name(),
            dek_version = doc.dek_version,
            recipients = doc.recipients.len(),
            "content replaced, DEK rotated"
        );
        Ok(())
    }

    /// Decrypts and returns the vault content. Never writes.
    pub fn get(&self, password: &str) -> VaultResult<Vec<u8>> {
        let unlocked = self.identity.unlock(password)?;
        let doc = self.load_recipients_required()?;
        let caller_fp = fingerprint(&unlocked.keypair.public_bytes());

        let record = doc
            .get(&caller_fp)
            .ok_or_else(|| VaultError::NoAccess(self.store.name().to_string()))?;
        let dek = open_wrapped(record, &unlocked.keypair)?;

        let payload = self
            .store
            .load_payload()?
            .ok_or_else(|| VaultError::VaultNotFound(self.store.name().to_string()))?;

        Ok(decrypt(&dek, &payload)?)
    }

    /// Grants `public_key_b64` access by wrapping the current DEK for it.
    ///
    /// Sharing extends the readership of the same DEK: `dek_version` is
    /// unchanged and the payload is untouched. A fingerprint that is
    /// already present is reported, not re-added.
    pub fn share(
        &self,
        password: &str,
        public_key_b64: &str,
        label: Option<&str>,
    ) -> VaultResult<ShareOutcome> {
        let pk_bytes = decode_public_key(public_key_b64)?;
        let fp = fingerprint(&pk_bytes);

        let mut doc = self.load_recipients_required()?;
        if let Some(existing) = doc.get(&fp) {
            debug!(vault = %self.store.name(), fingerprint = %fp, "already a recipient");
            return Ok(ShareOutcome::AlreadyShared {
                fingerprint: fp,
                label: existing.label.clone(),
            });
        }

        let unlocked = self.identity.unlock(password)?;
        let caller_fp = fingerprint(&unlocked.keypair.public_bytes());
        let record = doc
            .get(&caller_fp)
            .ok_or_else(|| VaultError::NoAccess(self.store.name().to_string()))?;
        let dek = open_wrapped(record, &unlocked.keypair)?;

        let label = label
            .map(str::to_string)
            .unwrap_or_else(|| format!("device-{}", &fp[..8]));

        doc.recipients.insert(
            fp.clone(),
            RecipientRecord {
                label: label.clone(),
                public_key: encode_public_key(&pk_bytes),
                wrapped_dek: wrap_for(&dek, &PublicKey::from(pk_bytes))?,
                added_at: Utc::now(),
            },
        );

        self.store.save_recipients(&doc)?;

        info!(vault = %self.store.name(), fingerprint = %fp, "recipient added");
        Ok(ShareOutcome::Added {
            fingerprint: fp,
            label,
        })
    }

    /// Removes a recipient and rotates the DEK.
    ///
    /// The payload is re-encrypted under a fresh DEK, wrapped only for
    /// the remaining recipients; `dek_version` increases by one.
    pub fn revoke(&self, password: &str, target_fp: &str) -> VaultResult<()> {
        let caller_fp = self.identity.fingerprint()?;
        if target_fp == caller_fp {
            return Err(VaultError::SelfRevoke);
        }

        let mut doc = self.load_recipients_required()?;
        if !doc.contains(target_fp) {
            return Err(VaultError::NotARecipient(target_fp.to_string()));
        }

        let unlocked = self.identity.unlock(password)?;
        let record = doc
            .get(&caller_fp)
            .ok_or_else(|| VaultError::NoAccess(self.store.name().to_string()))?;
        let current = open_wrapped(record, &unlocked.keypair)?;

        let payload = self
            .store
            .load_payload()?
            .ok_or_else(|| VaultError::VaultNotFound(self.store.name().to_string()))?;
        let plaintext = decrypt(&current, &payload)?;

        doc.recipients.remove(target_fp);

        let new_dek = generate_random_key();
        let new_payload = encrypt(&new_dek, &plaintext)?;
        rewrap_all(&mut doc, &new_dek)?;
        doc.dek_version += 1;

        self.store.save_payload(&new_payload)?;
        self.store.save_recipients(&doc)?;

        info!(
            vault = %self.store.name(),
            fingerprint = %target_fp,
            dek_version = doc.dek_version,
            "recipient revoked, DEK rotated"
        );
        Ok(())
    }

    /// Applies `apply` to the decrypted content and writes the result
    /// back through [`put`](Self::put).
    ///
    /// Returns whether anything changed; a byte-identical result writes
    /// nothing and leaves `dek_version` alone.
    pub fn edit<F>(&self, password: &str, apply: F) -> VaultResult<bool>
    where
        F: FnOnce(Vec<u8>) -> VaultResult<Vec<u8>>,
    {
        let current = self.get(password)?;
        let updated = apply(current.clone())?;

        if updated == current {
            debug!(vault = %self.store.name(), "edit made no changes");
            return Ok(false);
        }

        self.put(password, &updated)?;
        Ok(true)
    }

    /// Read-only recipients listing; no password required.
    pub fn recipients(&self) -> VaultResult<RecipientsList> {
        let doc = self.load_recipients_required()?;
        let caller_fp = self.identity.fingerprint().ok();

        let recipients = doc
            .recipients
            .iter()
            .map(|(fp, record)| RecipientInfo {
                fingerprint: fp.clone(),
                label: record.label.clone(),
                public_key: record.public_key.clone(),
                added_at: record.added_at,
                is_caller: caller_fp.as_deref() == Some(fp.as_str()),
            })
            .collect();

        Ok(RecipientsList {
            dek_version: doc.dek_version,
            recipients,
        })
    }

    fn load_recipients_required(&self) -> VaultResult<RecipientsDoc> {
        self.store
            .load_recipients()?
            .ok_or_else(|| VaultError::VaultNotFound(self.store.name().to_string()))
    }
}

/// Seals `dek` for `public_key`, returning the base64 the recipients
/// document stores.
fn wrap_for(dek: &DerivedKey, public_key: &PublicKey) -> VaultResult<String> {
    let envelope = seal(dek.as_bytes(), public_key)?;
    Ok(general_purpose::STANDARD.encode(envelope))
}

/// Opens a stored wrapped DEK with the caller's secret key.
fn open_wrapped(record: &RecipientRecord, keypair: &DeviceKeyPair) -> VaultResult<DerivedKey> {
    let envelope = general_purpose::STANDARD
        .decode(&record.wrapped_dek)
        .map_err(|_| VaultError::Integrity)?;
    let dek = open(&envelope, &keypair.secret)?;
    let dek: [u8; 32] = dek.try_into().map_err(|_| VaultError::Integrity)?;
    Ok(DerivedKey::from_bytes(dek))
}

/// Rewrites every record's wrapped DEK to seal `dek` under that
/// recipient's stored public key. Labels, keys, and added-at survive.
fn rewrap_all(doc: &mut RecipientsDoc, dek: &DerivedKey) -> VaultResult<()> {
    for record in doc.recipients.values_mut() {
        let pk_bytes = decode_public_key(&record.public_key).map_err(|_| VaultError::Integrity)?;
        record.wrapped_dek = wrap_for(dek, &PublicKey::from(pk_bytes))?;
    }
    Ok(())
}
