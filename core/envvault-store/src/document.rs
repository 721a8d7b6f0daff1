//! On-disk document types for a vault.
//!
//! `recipients.json` maps each recipient fingerprint to their record and
//! carries the vault's monotonic DEK version. The map is a `BTreeMap` so
//! serialization emits fingerprints in stable sorted order, keeping diffs
//! quiet when the artifacts live in version control.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One recipient's entry in the recipients document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecipientRecord {
    /// Human-readable device label.
    pub label: String,
    /// Recipient's X25519 public key, base64 of 32 raw bytes.
    #[serde(rename = "publicKey")]
    pub public_key: String,
    /// Current DEK sealed to `public_key`, base64 of the envelope bytes.
    #[serde(rename = "wrappedDEK")]
    pub wrapped_dek: String,
    /// When this recipient was first granted access.
    #[serde(rename = "addedAt")]
    pub added_at: DateTime<Utc>,
}

/// The recipients document: DEK version plus fingerprint-keyed records.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecipientsDoc {
    /// Strictly increases on every rotation (content mutation or revoke).
    pub dek_version: u64,
    pub recipients: BTreeMap<String, RecipientRecord>,
}

impl RecipientsDoc {
    pub fn new(dek_version: u64) -> Self {
        Self {
            dek_version,
            recipients: BTreeMap::new(),
        }
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.recipients.contains_key(fingerprint)
    }

    pub fn get(&self, fingerprint: &str) -> Option<&RecipientRecord> {
        self.recipients.get(fingerprint)
    }
}

/// Optional vault metadata (`meta.json`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VaultMeta {
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}
