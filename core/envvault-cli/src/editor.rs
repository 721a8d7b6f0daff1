//! Editor spawning for `edit`.
//!
//! Resolves `$VISUAL` then `$EDITOR`, refusing values containing shell
//! metacharacters: the value is split on whitespace and executed
//! directly, never handed to a shell.

use crate::error::CliError;
use std::io::Write;
use std::process::Command;

const FALLBACK_EDITOR: &str = "vi";
const SHELL_METACHARACTERS: [char; 5] = [';', '&', '|', '`', '$'];

/// The editor command to run, from the environment.
pub fn resolve_editor() -> Result<String, CliError> {
    for var in ["VISUAL", "EDITOR"] {
        if let Ok(value) = std::env::var(var) {
            if value.trim().is_empty() {
                continue;
            }
            if value.contains(SHELL_METACHARACTERS) {
                return Err(CliError::Input(format!(
                    "${var} contains shell metacharacters; refusing to run it"
                )));
            }
            return Ok(value);
        }
    }
    Ok(FALLBACK_EDITOR.to_string())
}

/// Writes `content` to a mode-0600 temp file, opens the editor on it,
/// and returns the saved bytes. The temp file is removed on drop.
pub fn edit_bytes(content: &[u8]) -> Result<Vec<u8>, CliError> {
    let editor = resolve_editor()?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".envvault-edit-")
        .suffix(".env")
        .tempfile()?;
    set_private(tmp.path())?;
    tmp.write_all(content)?;
    tmp.flush()?;

    let mut parts = editor.split_whitespace();
    let program = parts.next().expect("resolve_editor returns non-empty");
    let status = Command::new(program)
        .args(parts)
        .arg(tmp.path())
        .status()
        .map_err(|e| CliError::Input(format!("failed to launch editor {editor:?}: {e}")))?;

    if !status.success() {
        return Err(CliError::Input(format!(
            "editor {editor:?} exited with {status}"
        )));
    }

    Ok(std::fs::read(tmp.path())?)
}

#[cfg(unix)]
fn set_private(path: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_private(_path: &std::path::Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_editor<T>(value: &str, f: impl FnOnce() -> T) -> T {
        std::env::remove_var("VISUAL");
        std::env::set_var("EDITOR", value);
        let result = f();
        std::env::remove_var("EDITOR");
        result
    }

    #[test]
    fn metacharacters_are_rejected() {
        for bad in ["vim; rm -rf /", "ed | tee", "e`cmd`", "$(evil)", "a&b"] {
            let result = with_editor(bad, resolve_editor);
            assert!(result.is_err(), "{bad:?} must be rejected");
        }
    }

    #[test]
    fn plain_editor_with_flags_is_accepted() {
        let editor = with_editor("code --wait", resolve_editor).unwrap();
        assert_eq!(editor, "code --wait");
    }
}
