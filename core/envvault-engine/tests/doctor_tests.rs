#![cfg(unix)]

use envvault_crypto::KdfParams;
use envvault_engine::{run_doctor, ArtifactStore, VaultEngine};
use envvault_identity::IdentityStore;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::tempdir;

const PW: &str = "correct horse battery staple";

fn init_identity(root: &Path) -> IdentityStore {
    let identity = IdentityStore::new(root);
    identity
        .initialize_with_params(PW, "laptop", &KdfParams::LEGACY)
        .unwrap();
    identity
}

fn chmod(path: &Path, mode: u32) {
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

fn mode_of(path: &Path) -> u32 {
    fs::metadata(path).unwrap().permissions().mode() & 0o777
}

#[test]
fn healthy_identity_passes_with_legacy_warning() {
    let dir = tempdir().unwrap();
    let identity = init_identity(dir.path());

    let report = run_doctor(&identity, None, false).unwrap();

    assert!(report.is_healthy(), "issues: {:?}", report.issues);
    assert!(report.fixes_applied.is_empty());
    // Legacy KDF generation is advisory, not an issue
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("legacy scrypt parameters")));
}

#[test]
fn missing_identity_is_a_warning() {
    let dir = tempdir().unwrap();
    let identity = IdentityStore::new(dir.path());

    let report = run_doctor(&identity, None, false).unwrap();

    assert!(report.is_healthy());
    assert!(report.warnings.iter().any(|w| w.contains("no identity")));
}

#[test]
fn loose_file_mode_is_flagged_and_fixed() {
    let dir = tempdir().unwrap();
    let identity = init_identity(dir.path());

    chmod(&identity.private_key_path(), 0o644);

    let report = run_doctor(&identity, None, false).unwrap();
    assert!(report
        .issues
        .iter()
        .any(|i| i.contains("private.key") && i.contains("644")));

    let report = run_doctor(&identity, None, true).unwrap();
    assert!(report.issues.is_empty());
    assert!(!report.fixes_applied.is_empty());
    assert_eq!(mode_of(&identity.private_key_path()), 0o600);
}

#[test]
fn loose_directory_mode_is_flagged_and_fixed() {
    let dir = tempdir().unwrap();
    let identity = init_identity(dir.path());

    chmod(identity.root(), 0o755);

    let report = run_doctor(&identity, None, false).unwrap();
    assert!(!report.is_healthy());

    run_doctor(&identity, None, true).unwrap();
    assert_eq!(mode_of(identity.root()), 0o700);
}

#[test]
fn fix_never_loosens_tight_modes() {
    let dir = tempdir().unwrap();
    let identity = init_identity(dir.path());

    chmod(&identity.salt_path(), 0o400);

    let report = run_doctor(&identity, None, true).unwrap();
    assert!(report.fixes_applied.is_empty());
    assert_eq!(mode_of(&identity.salt_path()), 0o400);
}

#[test]
fn central_vault_artifacts_are_checked() {
    let dir = tempdir().unwrap();
    let identity = init_identity(dir.path());

    let store = ArtifactStore::central(dir.path(), "proj").unwrap();
    VaultEngine::new(&identity, &store).put(PW, b"A=1\n").unwrap();

    // A freshly created vault must already pass, repos/ included
    let report = run_doctor(&identity, None, false).unwrap();
    assert!(report.is_healthy(), "clean baseline expected: {:?}", report.issues);

    chmod(&store.payload_path(), 0o664);

    let report = run_doctor(&identity, None, false).unwrap();
    assert!(report.issues.iter().any(|i| i.contains("secrets.enc")));

    run_doctor(&identity, None, true).unwrap();
    assert_eq!(mode_of(&store.payload_path()), 0o600);
}

#[test]
fn vault_missing_recipients_is_an_issue() {
    let dir = tempdir().unwrap();
    let identity = init_identity(dir.path());

    let vault_dir = dir.path().join("repos").join("broken");
    fs::create_dir_all(&vault_dir).unwrap();
    fs::write(vault_dir.join("secrets.enc"), b"ciphertext").unwrap();

    let report = run_doctor(&identity, None, false).unwrap();
    assert!(report
        .issues
        .iter()
        .any(|i| i.contains("broken") && i.contains("no recipients")));
}

#[test]
fn project_gitignore_warning_and_fix() {
    let home = tempdir().unwrap();
    let identity = init_identity(home.path());

    let project = tempdir().unwrap();
    fs::write(project.path().join(".gitignore"), "target/\n").unwrap();

    let report = run_doctor(&identity, Some(project.path()), false).unwrap();
    assert!(report.warnings.iter().any(|w| w.contains(".gitignore")));

    let report = run_doctor(&identity, Some(project.path()), true).unwrap();
    assert!(report
        .fixes_applied
        .iter()
        .any(|f| f.contains(".gitignore")));

    let body = fs::read_to_string(project.path().join(".gitignore")).unwrap();
    assert!(body.contains("target/"), "existing entries preserved");
    assert!(body.contains("*.env"));

    // Second run is clean
    let report = run_doctor(&identity, Some(project.path()), false).unwrap();
    assert!(!report.warnings.iter().any(|w| w.contains(".gitignore")));
}

#[test]
fn local_vault_modes_are_checked() {
    let home = tempdir().unwrap();
    let identity = init_identity(home.path());

    let project = tempdir().unwrap();
    let store = ArtifactStore::local(project.path());
    VaultEngine::new(&identity, &store).put(PW, b"A=1\n").unwrap();

    chmod(&store.recipients_path(), 0o644);

    let report = run_doctor(&identity, Some(project.path()), false).unwrap();
    assert!(report.issues.iter().any(|i| i.contains("recipients.json")));
}
