//! Integrity checker for on-disk state.
//!
//! Walks the identity root and, when given, the current project's local
//! vault: file and directory modes, artifact presence, the KDF parameter
//! generation, and the project `.gitignore`. Fix mode tightens modes in
//! place and supplies missing `.gitignore` patterns; it never loosens
//! anything.

use crate::error::VaultResult;
use envvault_identity::{IdentityStore, KdfGeneration};
use envvault_store::{ArtifactStore, META_FILE, RECIPIENTS_FILE, REPOS_DIR, SECRETS_FILE};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

const GITIGNORE_PATTERNS: &str = "*.env\n*.env.*\n";

/// Structured result of a doctor run.
#[derive(Debug, Default, Serialize)]
pub struct DoctorReport {
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub fixes_applied: Vec<String>,
}

impl DoctorReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Checks the identity root and optionally `project_dir`; `fix` applies
/// repairs as it goes.
pub fn run_doctor(
    identity: &IdentityStore,
    project_dir: Option<&Path>,
    fix: bool,
) -> VaultResult<DoctorReport> {
    let mut report = DoctorReport::default();

    if !identity.is_initialized() {
        report
            .warnings
            .push("no identity initialized (run init)".to_string());
    } else {
        check_identity(identity, fix, &mut report)?;
        check_central_vaults(identity.root(), fix, &mut report)?;
    }

    if let Some(project) = project_dir {
        check_project(project, fix, &mut report)?;
    }

    info!(
        issues = report.issues.len(),
        warnings = report.warnings.len(),
        fixes = report.fixes_applied.len(),
        "doctor finished"
    );
    Ok(report)
}

fn check_identity(
    identity: &IdentityStore,
    fix: bool,
    report: &mut DoctorReport,
) -> VaultResult<()> {
    check_dir_mode(identity.root(), fix, report)?;
    check_dir_mode(&identity.root().join("identity"), fix, report)?;

    for path in [
        identity.private_key_path(),
        identity.public_key_path(),
        identity.salt_path(),
        identity.config_path(),
    ] {
        if path.is_file() {
            check_file_mode(&path, fix, report)?;
        } else {
            report
                .issues
                .push(format!("missing identity file: {}", path.display()));
        }
    }

    match identity.config() {
        Ok(config) => {
            if config.kdf != Some(KdfGeneration::Current) {
                report.warnings.push(
                    "identity uses legacy scrypt parameters (N=16384; current is N=131072); \
                     re-initialization with the current parameters is recommended"
                        .to_string(),
                );
            }
        }
        Err(_) => report
            .issues
            .push("device config unreadable or malformed".to_string()),
    }

    Ok(())
}

fn check_central_vaults(root: &Path, fix: bool, report: &mut DoctorReport) -> VaultResult<()> {
    let repos = root.join(REPOS_DIR);
    if !repos.is_dir() {
        return Ok(());
    }
    check_dir_mode(&repos, fix, report)?;

    for entry in fs::read_dir(&repos)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !entry.path().is_dir() {
            continue;
        }
        check_vault_dir(&entry.path(), &name, fix, report)?;
    }
    Ok(())
}

fn check_vault_dir(
    dir: &Path,
    name: &str,
    fix: bool,
    report: &mut DoctorReport,
) -> VaultResult<()> {
    check_dir_mode(dir, fix, report)?;

    let secrets = dir.join(SECRETS_FILE);
    let recipients = dir.join(RECIPIENTS_FILE);
    match (secrets.is_file(), recipients.is_file()) {
        (true, false) => report
            .issues
            .push(format!("vault {name:?} has a payload but no recipients document")),
        (false, true) => report
            .issues
            .push(format!("vault {name:?} has a recipients document but no payload")),
        _ => {}
    }

    for file in [secrets, recipients, dir.join(META_FILE)] {
        if file.is_file() {
            check_file_mode(&file, fix, report)?;
        }
    }
    Ok(())
}

fn check_project(project: &Path, fix: bool, report: &mut DoctorReport) -> VaultResult<()> {
    let local = ArtifactStore::local(project);
    if local.dir().is_dir() {
        check_vault_dir(local.dir(), local.name(), fix, report)?;
    }

    let gitignore = project.join(".gitignore");
    let has_env_pattern = fs::read_to_string(&gitignore)
        .map(|body| body.lines().any(|l| l.trim().contains(".env")))
        .unwrap_or(false);

    if !has_env_pattern {
        if fix {
            append_gitignore_patterns(&gitignore)?;
            report
                .fixes_applied
                .push(format!("added .env patterns to {}", gitignore.display()));
        } else {
            report.warnings.push(
                "project .gitignore does not exclude .env files; plaintext secrets could be \
                 committed"
                    .to_string(),
            );
        }
    }
    Ok(())
}

fn append_gitignore_patterns(gitignore: &Path) -> VaultResult<()> {
    let mut body = fs::read_to_string(gitignore).unwrap_or_default();
    if !body.is_empty() && !body.ends_with('\n') {
        body.push('\n');
    }
    body.push_str(GITIGNORE_PATTERNS);
    fs::write(gitignore, body)?;
    Ok(())
}

#[cfg(unix)]
fn check_dir_mode(dir: &Path, fix: bool, report: &mut DoctorReport) -> VaultResult<()> {
    check_mode(dir, 0o077, 0o700, "directory", fix, report)
}

#[cfg(unix)]
fn check_file_mode(file: &Path, fix: bool, report: &mut DoctorReport) -> VaultResult<()> {
    check_mode(file, 0o177, 0o600, "file", fix, report)
}

/// Flags a path whose mode has any of `excess` set; fix chmods to `target`.
#[cfg(unix)]
fn check_mode(
    path: &Path,
    excess: u32,
    target: u32,
    kind: &str,
    fix: bool,
    report: &mut DoctorReport,
) -> VaultResult<()> {
    use std::os::unix::fs::PermissionsExt;

    if !path.exists() {
        return Ok(());
    }
    let mode = fs::metadata(path)?.permissions().mode() & 0o777;
    if mode & excess == 0 {
        return Ok(());
    }

    if fix {
        fs::set_permissions(path, fs::Permissions::from_mode(target))?;
        report.fixes_applied.push(format!(
            "tightened {kind} {} from {mode:03o} to {target:03o}",
            path.display()
        ));
    } else {
        report.issues.push(format!(
            "{kind} {} has mode {mode:03o} (want at most {target:03o})",
            path.display()
        ));
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_dir_mode(_dir: &Path, _fix: bool, _report: &mut DoctorReport) -> VaultResult<()> {
    Ok(())
}

#[cfg(not(unix))]
fn check_file_mode(_file: &Path, _fix: bool, _report: &mut DoctorReport) -> VaultResult<()> {
    Ok(())
}
