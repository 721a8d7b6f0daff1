// Most tests materialize identities with the legacy KDF parameters to keep
// the suite fast; the current set costs deliberate seconds per derivation.

use envvault_crypto::KdfParams;
use envvault_identity::{IdentityError, IdentityStore, KdfGeneration};
use std::fs;
use tempfile::tempdir;

const PASSWORD: &str = "correct horse battery staple";

fn legacy_store(root: &std::path::Path) -> IdentityStore {
    let store = IdentityStore::new(root);
    store
        .initialize_with_params(PASSWORD, "laptop", &KdfParams::LEGACY)
        .unwrap();
    store
}

#[test]
fn initialize_writes_all_identity_files() {
    let dir = tempdir().unwrap();
    let store = legacy_store(dir.path());

    assert!(store.is_initialized());
    assert!(store.private_key_path().is_file());
    assert!(store.public_key_path().is_file());
    assert!(store.salt_path().is_file());
    assert!(store.config_path().is_file());

    assert_eq!(fs::read(store.public_key_path()).unwrap().len(), 32);
    assert_eq!(fs::read(store.salt_path()).unwrap().len(), 16);

    // Sealed private key is IV + 32-byte key + tag
    assert_eq!(fs::read(store.private_key_path()).unwrap().len(), 12 + 32 + 16);
}

#[test]
fn config_records_label_fingerprint_and_kdf_generation() {
    let dir = tempdir().unwrap();
    let store = legacy_store(dir.path());

    let config = store.config().unwrap();
    assert_eq!(config.device_label, "laptop");
    assert_eq!(config.fingerprint, store.fingerprint().unwrap());
    assert_eq!(config.kdf, Some(KdfGeneration::Legacy));
}

#[test]
fn short_password_rejected() {
    let dir = tempdir().unwrap();
    let store = IdentityStore::new(dir.path());

    let result = store.initialize_with_params("seven77", "laptop", &KdfParams::LEGACY);
    assert!(matches!(result, Err(IdentityError::PasswordTooShort)));
    assert!(!store.is_initialized());
}

#[test]
fn double_initialize_rejected() {
    let dir = tempdir().unwrap();
    let store = legacy_store(dir.path());

    let result = store.initialize_with_params(PASSWORD, "other", &KdfParams::LEGACY);
    assert!(matches!(result, Err(IdentityError::AlreadyInitialized)));
}

#[test]
fn unlock_with_correct_password_recovers_keypair() {
    let dir = tempdir().unwrap();
    let store = legacy_store(dir.path());

    let unlocked = store.unlock(PASSWORD).unwrap();
    assert_eq!(unlocked.keypair.public_bytes().as_slice(), fs::read(store.public_key_path()).unwrap());
}

#[test]
fn unlock_with_wrong_password_fails_without_writing() {
    let dir = tempdir().unwrap();
    let store = legacy_store(dir.path());

    let before = snapshot(&store);
    let result = store.unlock("wrong password entirely");
    assert!(matches!(result, Err(IdentityError::WrongPassword)));
    assert_eq!(before, snapshot(&store), "unlock must not modify identity files");

    // Retry with the right password still works
    assert!(store.unlock(PASSWORD).is_ok());
}

#[test]
fn legacy_identity_unlocks_with_advisory() {
    let dir = tempdir().unwrap();
    let store = legacy_store(dir.path());

    let before = snapshot(&store);
    let unlocked = store.unlock(PASSWORD).unwrap();
    assert!(unlocked.used_legacy_kdf);
    assert_eq!(before, snapshot(&store), "files unchanged until explicit upgrade");
}

#[test]
fn current_identity_unlocks_without_advisory() {
    let dir = tempdir().unwrap();
    let store = IdentityStore::new(dir.path());
    store.initialize(PASSWORD, "laptop").unwrap();

    assert_eq!(store.config().unwrap().kdf, Some(KdfGeneration::Current));

    let unlocked = store.unlock(PASSWORD).unwrap();
    assert!(!unlocked.used_legacy_kdf);
}

#[test]
fn unlock_without_identity_fails() {
    let dir = tempdir().unwrap();
    let store = IdentityStore::new(dir.path());

    assert!(matches!(store.unlock(PASSWORD), Err(IdentityError::NoIdentity)));
    assert!(matches!(store.public_key(), Err(IdentityError::NoIdentity)));
    assert!(matches!(store.config(), Err(IdentityError::NoIdentity)));
}

#[test]
fn tampered_private_key_reads_as_wrong_password() {
    let dir = tempdir().unwrap();
    let store = legacy_store(dir.path());

    let mut sealed = fs::read(store.private_key_path()).unwrap();
    let mid = sealed.len() / 2;
    sealed[mid] ^= 0xFF;
    fs::write(store.private_key_path(), sealed).unwrap();

    // No oracle: tampering is indistinguishable from a bad password
    assert!(matches!(store.unlock(PASSWORD), Err(IdentityError::WrongPassword)));
}

#[test]
fn fingerprint_matches_public_key() {
    let dir = tempdir().unwrap();
    let store = legacy_store(dir.path());

    let expected = envvault_crypto::fingerprint(&store.public_key().unwrap());
    assert_eq!(store.fingerprint().unwrap(), expected);
}

#[test]
fn reset_removes_everything() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("vault-root");
    let store = IdentityStore::new(&root);
    store
        .initialize_with_params(PASSWORD, "laptop", &KdfParams::LEGACY)
        .unwrap();

    store.reset().unwrap();
    assert!(!root.exists());
    assert!(!store.is_initialized());
}

#[cfg(unix)]
#[test]
fn identity_files_are_mode_restricted() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let root = dir.path().join("vault-root");
    let store = IdentityStore::new(&root);
    store
        .initialize_with_params(PASSWORD, "laptop", &KdfParams::LEGACY)
        .unwrap();

    let mode = |p: &std::path::Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;

    assert_eq!(mode(&root), 0o700);
    assert_eq!(mode(&root.join("identity")), 0o700);
    for path in [
        store.private_key_path(),
        store.public_key_path(),
        store.salt_path(),
        store.config_path(),
    ] {
        assert_eq!(mode(&path), 0o600, "{} must be 0600", path.display());
    }
}

fn snapshot(store: &IdentityStore) -> Vec<(String, Vec<u8>)> {
    [
        store.private_key_path(),
        store.public_key_path(),
        store.salt_path(),
        store.config_path(),
    ]
    .iter()
    .map(|p| (p.display().to_string(), fs::read(p).unwrap()))
    .collect()
}
