use chrono::Utc;
use envvault_store::{
    is_valid_name, list_central, ArtifactStore, Backend, RecipientRecord, RecipientsDoc,
    StoreError, VaultMeta,
};
use std::fs;
use tempfile::tempdir;

fn sample_doc(version: u64) -> RecipientsDoc {
    let mut doc = RecipientsDoc::new(version);
    doc.recipients.insert(
        "deadbeefdeadbeef".to_string(),
        RecipientRecord {
            label: "laptop".to_string(),
            public_key: "cHVibGljLWtleS1ieXRlcy1wdWJsaWMta2V5LWI=".to_string(),
            wrapped_dek: "d3JhcHBlZA==".to_string(),
            added_at: Utc::now(),
        },
    );
    doc
}

#[test]
fn central_store_resolves_under_repos() {
    let root = tempdir().unwrap();
    let store = ArtifactStore::central(root.path(), "backend-api").unwrap();

    assert_eq!(store.name(), "backend-api");
    assert_eq!(store.backend(), Backend::Central);
    assert!(store
        .dir()
        .starts_with(root.path().join("repos")));
}

#[test]
fn invalid_names_rejected_without_touching_disk() {
    let root = tempdir().unwrap();

    for bad in [
        "",
        ".",
        "..",
        "../x",
        "foo/bar",
        "foo\\bar",
        "a..b",
        ".hidden",
        "-leading-dash",
        &"x".repeat(101),
    ] {
        let result = ArtifactStore::central(root.path(), bad);
        assert!(
            matches!(result, Err(StoreError::InvalidName(_))),
            "{bad:?} must be rejected"
        );
    }

    // Nothing was created
    assert!(!root.path().join("repos").exists());
}

#[test]
fn valid_names_accepted() {
    for good in ["a", "backend-api", "my.service_2", &"x".repeat(100)] {
        assert!(is_valid_name(good), "{good:?} must be accepted");
    }
}

#[test]
fn missing_payload_reads_as_absent() {
    let root = tempdir().unwrap();
    let store = ArtifactStore::central(root.path(), "empty").unwrap();

    assert!(!store.exists());
    assert!(store.load_payload().unwrap().is_none());
    assert!(store.load_recipients().unwrap().is_none());
}

#[test]
fn zero_byte_payload_reads_as_absent() {
    let root = tempdir().unwrap();
    let store = ArtifactStore::central(root.path(), "truncated").unwrap();

    fs::create_dir_all(store.dir()).unwrap();
    fs::write(store.payload_path(), b"").unwrap();

    assert!(!store.exists());
    assert!(store.load_payload().unwrap().is_none());
}

#[test]
fn payload_roundtrip() {
    let root = tempdir().unwrap();
    let store = ArtifactStore::central(root.path(), "proj").unwrap();

    store.save_payload(b"ciphertext-bytes").unwrap();

    assert!(store.exists());
    assert_eq!(
        store.load_payload().unwrap().unwrap(),
        b"ciphertext-bytes"
    );
}

#[test]
fn recipients_roundtrip_preserves_version_and_records() {
    let root = tempdir().unwrap();
    let store = ArtifactStore::central(root.path(), "proj").unwrap();

    store.save_recipients(&sample_doc(3)).unwrap();

    let loaded = store.load_recipients().unwrap().unwrap();
    assert_eq!(loaded.dek_version, 3);
    assert_eq!(loaded.recipients.len(), 1);
    assert_eq!(loaded.recipients["deadbeefdeadbeef"].label, "laptop");
}

#[test]
fn recipients_serialization_is_stable_and_sorted() {
    let root = tempdir().unwrap();
    let store = ArtifactStore::central(root.path(), "proj").unwrap();

    let added_at = Utc::now();
    let mut doc = RecipientsDoc::new(1);
    // Insert out of order; BTreeMap serializes sorted
    for fp in ["ffffffffffffffff", "0000000000000000", "89abcdef01234567"] {
        doc.recipients.insert(
            fp.to_string(),
            RecipientRecord {
                label: fp[..4].to_string(),
                public_key: "cGs=".to_string(),
                wrapped_dek: "ZGVr".to_string(),
                added_at,
            },
        );
    }

    store.save_recipients(&doc).unwrap();
    let first = fs::read(store.recipients_path()).unwrap();
    store.save_recipients(&doc).unwrap();
    let second = fs::read(store.recipients_path()).unwrap();

    assert_eq!(first, second, "identical content must emit identical bytes");

    let text = String::from_utf8(first).unwrap();
    let pos_0 = text.find("0000000000000000").unwrap();
    let pos_8 = text.find("89abcdef01234567").unwrap();
    let pos_f = text.find("ffffffffffffffff").unwrap();
    assert!(pos_0 < pos_8 && pos_8 < pos_f, "fingerprints must be sorted");
}

#[test]
fn recipients_json_uses_wire_field_names() {
    let root = tempdir().unwrap();
    let store = ArtifactStore::central(root.path(), "proj").unwrap();

    store.save_recipients(&sample_doc(1)).unwrap();
    let text = fs::read_to_string(store.recipients_path()).unwrap();

    assert!(text.contains("\"dek_version\""));
    assert!(text.contains("\"publicKey\""));
    assert!(text.contains("\"wrappedDEK\""));
    assert!(text.contains("\"addedAt\""));
}

#[test]
fn meta_roundtrip() {
    let root = tempdir().unwrap();
    let store = ArtifactStore::central(root.path(), "proj").unwrap();

    store
        .save_meta(&VaultMeta {
            name: "proj".to_string(),
            created_at: Utc::now(),
        })
        .unwrap();

    assert_eq!(store.load_meta().unwrap().unwrap().name, "proj");
}

#[cfg(unix)]
#[test]
fn writes_are_mode_restricted() {
    use std::os::unix::fs::PermissionsExt;

    let root = tempdir().unwrap();
    let store = ArtifactStore::central(root.path(), "proj").unwrap();
    store.save_payload(b"bytes").unwrap();
    store.save_recipients(&sample_doc(1)).unwrap();

    let dir_mode = fs::metadata(store.dir()).unwrap().permissions().mode() & 0o777;
    assert_eq!(dir_mode, 0o700);

    for path in [store.payload_path(), store.recipients_path()] {
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "{} must be 0600", path.display());
    }
}

#[cfg(unix)]
#[test]
fn central_vault_creation_tightens_intermediate_dirs() {
    use std::os::unix::fs::PermissionsExt;

    let root = tempdir().unwrap();
    let store = ArtifactStore::central(root.path(), "proj").unwrap();
    store.save_payload(b"bytes").unwrap();

    // The repos/ component is created on the way to the vault dir and
    // must not be left at the umask default
    for dir in [root.path().join("repos"), store.dir().to_path_buf()] {
        let mode = fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o700, "{} must be 0700", dir.display());
    }
}

#[cfg(unix)]
#[test]
fn local_store_leaves_project_dir_mode_alone() {
    use std::os::unix::fs::PermissionsExt;

    let project = tempdir().unwrap();
    fs::set_permissions(project.path(), fs::Permissions::from_mode(0o755)).unwrap();

    let store = ArtifactStore::local(project.path());
    store.save_payload(b"bytes").unwrap();

    let project_mode = fs::metadata(project.path()).unwrap().permissions().mode() & 0o777;
    assert_eq!(project_mode, 0o755, "pre-existing project dir must not be chmod'd");

    let vault_mode = fs::metadata(store.dir()).unwrap().permissions().mode() & 0o777;
    assert_eq!(vault_mode, 0o700);
}

#[test]
fn local_store_provisions_gitignore() {
    let project = tempdir().unwrap();
    let store = ArtifactStore::local(project.path());

    assert_eq!(store.backend(), Backend::Local);
    store.save_payload(b"bytes").unwrap();

    let gitignore = fs::read_to_string(store.dir().join(".gitignore")).unwrap();
    assert!(gitignore.contains("*.env"));
    assert!(gitignore.contains("!*.enc"));
}

#[test]
fn local_store_keeps_existing_gitignore() {
    let project = tempdir().unwrap();
    let store = ArtifactStore::local(project.path());

    fs::create_dir_all(store.dir()).unwrap();
    fs::write(store.dir().join(".gitignore"), "# custom\n").unwrap();

    store.save_payload(b"bytes").unwrap();
    assert_eq!(
        fs::read_to_string(store.dir().join(".gitignore")).unwrap(),
        "# custom\n"
    );
}

#[test]
fn listing_skips_incomplete_and_hidden_entries() {
    let root = tempdir().unwrap();
    let repos = root.path().join("repos");
    fs::create_dir_all(&repos).unwrap();

    // Complete vault
    let complete = ArtifactStore::central(root.path(), "complete").unwrap();
    complete.save_payload(b"bytes").unwrap();

    // Directory without a payload
    fs::create_dir_all(repos.join("no-payload")).unwrap();

    // Zero-byte payload
    let empty = repos.join("zero-byte");
    fs::create_dir_all(&empty).unwrap();
    fs::write(empty.join("secrets.enc"), b"").unwrap();

    // Dotfile and stray file
    fs::create_dir_all(repos.join(".hidden")).unwrap();
    fs::write(repos.join("stray.tmp"), b"x").unwrap();

    assert_eq!(list_central(root.path()).unwrap(), vec!["complete"]);
}

#[test]
fn listing_with_no_repos_dir_is_empty() {
    let root = tempdir().unwrap();
    assert!(list_central(root.path()).unwrap().is_empty());
}

#[test]
fn remove_deletes_vault_directory() {
    let root = tempdir().unwrap();
    let store = ArtifactStore::central(root.path(), "gone").unwrap();
    store.save_payload(b"bytes").unwrap();
    assert!(store.dir().exists());

    store.remove().unwrap();
    assert!(!store.dir().exists());
    assert!(list_central(root.path()).unwrap().is_empty());
}

#[test]
fn atomic_overwrite_replaces_whole_content() {
    let root = tempdir().unwrap();
    let store = ArtifactStore::central(root.path(), "proj").unwrap();

    store.save_payload(b"first version, long enough to matter").unwrap();
    store.save_payload(b"second").unwrap();

    assert_eq!(store.load_payload().unwrap().unwrap(), b"second");

    // No stray temp files left behind
    let leftovers: Vec<_> = fs::read_dir(store.dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "stray temp files: {leftovers:?}");
}
