//! Vault name validation for the central backend.
//!
//! A name addresses a directory under `<identity root>/repos/`, so the
//! rules exist to keep every resolved path a strict descendant of that
//! root: no separators, no dot traversal, bounded length. Validation runs
//! before any filesystem operation.

use crate::error::{StoreError, StoreResult};

/// Maximum vault name length in bytes.
pub const MAX_NAME_LEN: usize = 100;

/// Returns whether `name` may address a central vault.
///
/// Valid names match `[A-Za-z0-9][A-Za-z0-9._-]{0,99}` and contain no
/// path separators and no `..` sequence.
pub fn is_valid_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return false;
    }
    if name == "." || name == ".." || name.contains("..") {
        return false;
    }
    if name.contains('/') || name.contains('\\') {
        return false;
    }

    let mut chars = name.chars();
    let first = chars.next().expect("non-empty");
    if !first.is_ascii_alphanumeric() {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
}

/// Validates `name`, failing with [`StoreError::InvalidName`].
pub fn validate_name(name: &str) -> StoreResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}
