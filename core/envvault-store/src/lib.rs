//! Artifact storage for env-vault.
//!
//! A vault is three files — `secrets.enc` (encrypted payload),
//! `recipients.json` (recipients document), `meta.json` (optional
//! metadata) — living in one of two physical layouts:
//!
//! - **central**: `<identity root>/repos/<name>/`, addressed by a
//!   validated vault name
//! - **local**: `<project>/.env-vault/`, addressed by being present in
//!   the working directory; the encrypted artifacts are meant to be
//!   committed alongside the code
//!
//! [`ArtifactStore`] presents both behind one interface. All writes are
//! atomic (sibling temp file, fsync, rename) and mode-restricted; see
//! [`atomic`].

pub mod atomic;
mod document;
mod error;
mod name;

pub use document::{RecipientRecord, RecipientsDoc, VaultMeta};
pub use error::{StoreError, StoreResult};
pub use name::{is_valid_name, validate_name, MAX_NAME_LEN};

use atomic::{
    create_dir_secure, read_optional, write_atomic, MODE_PUBLIC_FILE, MODE_SECRET_FILE,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Encrypted payload file name.
pub const SECRETS_FILE: &str = "secrets.enc";

/// Recipients document file name.
pub const RECIPIENTS_FILE: &str = "recipients.json";

/// Optional metadata file name.
pub const META_FILE: &str = "meta.json";

/// Per-project artifact directory name.
pub const LOCAL_DIR: &str = ".env-vault";

/// Central per-name vault directory, under the identity root.
pub const REPOS_DIR: &str = "repos";

/// Ignore plaintext env files next to the artifacts; keep ciphertext
/// tracked so the repository is the distribution channel.
const GITIGNORE_BODY: &str = "*.env\n*.env.*\n!*.enc\n";

/// Which physical layout a store is backed by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Central,
    Local,
}

/// One vault's artifact directory.
pub struct ArtifactStore {
    dir: PathBuf,
    name: String,
    backend: Backend,
}

impl ArtifactStore {
    /// Store for a named vault under the central root.
    ///
    /// The name is validated before any path is formed; invalid names
    /// never touch the filesystem.
    pub fn central(identity_root: &Path, vault_name: &str) -> StoreResult<Self> {
        validate_name(vault_name)?;
        Ok(Self {
            dir: identity_root.join(REPOS_DIR).join(vault_name),
            name: vault_name.to_string(),
            backend: Backend::Central,
        })
    }

    /// Store for the per-project layout inside `project_dir`.
    ///
    /// The display name is the project directory's basename.
    pub fn local(project_dir: &Path) -> Self {
        let name = project_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());
        Self {
            dir: project_dir.join(LOCAL_DIR),
            name,
            backend: Backend::Local,
        }
    }

    /// Display name of the vault.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// The artifact directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn payload_path(&self) -> PathBuf {
        self.dir.join(SECRETS_FILE)
    }

    pub fn recipients_path(&self) -> PathBuf {
        self.dir.join(RECIPIENTS_FILE)
    }

    pub fn meta_path(&self) -> PathBuf {
        self.dir.join(META_FILE)
    }

    /// Whether the vault exists: a non-empty `secrets.enc` is present.
    pub fn exists(&self) -> bool {
        matches!(read_optional(&self.payload_path()), Ok(Some(_)))
    }

    /// Reads the encrypted payload; missing or zero-length reads as absent.
    pub fn load_payload(&self) -> StoreResult<Option<Vec<u8>>> {
        Ok(read_optional(&self.payload_path())?)
    }

    /// Writes the encrypted payload atomically with mode 0600.
    pub fn save_payload(&self, bytes: &[u8]) -> StoreResult<()> {
        self.ensure_dir()?;
        write_atomic(&self.payload_path(), bytes, MODE_SECRET_FILE)?;
        debug!(vault = %self.name, len = bytes.len(), "payload written");
        Ok(())
    }

    /// Reads the recipients document; missing or zero-length reads as absent.
    pub fn load_recipients(&self) -> StoreResult<Option<RecipientsDoc>> {
        match read_optional(&self.recipients_path())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Writes the recipients document atomically with mode 0600.
    ///
    /// Pretty-printed with `BTreeMap` key order, so the emitted JSON is
    /// byte-stable for identical content.
    pub fn save_recipients(&self, doc: &RecipientsDoc) -> StoreResult<()> {
        self.ensure_dir()?;
        let mut bytes = serde_json::to_vec_pretty(doc)?;
        bytes.push(b'\n');
        write_atomic(&self.recipients_path(), &bytes, MODE_SECRET_FILE)?;
        debug!(vault = %self.name, dek_version = doc.dek_version, "recipients written");
        Ok(())
    }

    pub fn load_meta(&self) -> StoreResult<Option<VaultMeta>> {
        match read_optional(&self.meta_path())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn save_meta(&self, meta: &VaultMeta) -> StoreResult<()> {
        self.ensure_dir()?;
        let mut bytes = serde_json::to_vec_pretty(meta)?;
        bytes.push(b'\n');
        write_atomic(&self.meta_path(), &bytes, MODE_SECRET_FILE)?;
        Ok(())
    }

    /// Deletes the vault directory and everything in it.
    pub fn remove(&self) -> StoreResult<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        Ok(())
    }

    fn ensure_dir(&self) -> StoreResult<()> {
        create_dir_secure(&self.dir)?;
        if self.backend == Backend::Local {
            self.ensure_gitignore()?;
        }
        Ok(())
    }

    /// Provisions `.env-vault/.gitignore` once; an existing file is the
    /// user's to edit and is left alone.
    fn ensure_gitignore(&self) -> StoreResult<()> {
        let path = self.dir.join(".gitignore");
        if !path.exists() {
            write_atomic(&path, GITIGNORE_BODY.as_bytes(), MODE_PUBLIC_FILE)?;
        }
        Ok(())
    }
}

/// Lists central vault names under `identity_root`.
///
/// Only directories holding a non-empty `secrets.enc` count; dotfiles,
/// stray temp files, and non-directories are skipped.
pub fn list_central(identity_root: &Path) -> StoreResult<Vec<String>> {
    let repos = identity_root.join(REPOS_DIR);
    if !repos.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(&repos)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        if name.starts_with('.') || !entry.path().is_dir() {
            continue;
        }
        let store = ArtifactStore {
            dir: entry.path(),
            name: name.into_owned(),
            backend: Backend::Central,
        };
        if store.exists() {
            names.push(store.name);
        }
    }
    names.sort();
    Ok(names)
}
