//! Atomic, mode-restricted file writes.
//!
//! Every write goes through a sibling temp file: write, chmod, fsync,
//! rename over the target, reassert the mode. Readers therefore observe
//! either the old bytes or the new bytes, never a partial file. The temp
//! file is unlinked automatically on any failure.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Mode for sensitive files (payload, recipients, key material).
pub const MODE_SECRET_FILE: u32 = 0o600;

/// Mode for vault and identity directories.
pub const MODE_SECRET_DIR: u32 = 0o700;

/// Mode for the provisioned `.gitignore` (not sensitive).
pub const MODE_PUBLIC_FILE: u32 = 0o644;

/// Writes `bytes` to `path` atomically with the given mode.
pub fn write_atomic(path: &Path, bytes: &[u8], mode: u32) -> io::Result<()> {
    let dir = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "target path has no parent")
    })?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    set_mode(tmp.path(), mode)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    // The rename may carry umask-influenced modes on some platforms
    set_mode(path, mode)?;
    Ok(())
}

/// Creates `dir` and any missing ancestors, applying mode 0700 to every
/// component this call creates and to `dir` itself.
///
/// `create_dir_all` would leave intermediate components (such as `repos/`
/// under the identity root) at the umask default; pre-existing ancestors
/// like a project directory are left alone.
pub fn create_dir_secure(dir: &Path) -> io::Result<()> {
    let mut missing = Vec::new();
    let mut current = dir;
    while !current.exists() {
        missing.push(current.to_path_buf());
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }

    for path in missing.iter().rev() {
        match fs::create_dir(path) {
            Ok(()) => set_mode(path, MODE_SECRET_DIR)?,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }
    }

    set_mode(dir, MODE_SECRET_DIR)
}

#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// Reads `path`, mapping a missing or zero-length file to `None`.
///
/// A zero-length target can only be a foreign artifact (our writes are
/// atomic and never empty), so it reads as absent rather than corrupt.
pub fn read_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) if bytes.is_empty() => Ok(None),
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
