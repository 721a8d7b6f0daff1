//! Minimal `.env` parsing and merging.
//!
//! Enough of the dotenv dialect for validation and key-level merges:
//! `KEY=VALUE` lines, `#` comments, blank lines, optional single or
//! double quotes around the value. No interpolation.

use crate::error::CliError;

/// Parses env content into `(key, value)` pairs, preserving order.
pub fn parse(content: &str) -> Result<Vec<(String, String)>, CliError> {
    let mut entries = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = line.split_once('=').ok_or_else(|| {
            CliError::Input(format!("line {}: expected KEY=VALUE", idx + 1))
        })?;

        let key = key.trim();
        if !is_valid_key(key) {
            return Err(CliError::Input(format!(
                "line {}: invalid key {key:?}",
                idx + 1
            )));
        }

        entries.push((key.to_string(), unquote(value.trim()).to_string()));
    }

    Ok(entries)
}

/// Replaces values for keys present in `updates`, appends new keys at the
/// end, and leaves comments and unrelated lines where they are.
pub fn merge(base: &str, updates: &[(String, String)]) -> String {
    let mut remaining: Vec<&(String, String)> = updates.iter().collect();
    let mut out = String::new();

    for line in base.lines() {
        let trimmed = line.trim();
        let replaced = if !trimmed.is_empty() && !trimmed.starts_with('#') {
            trimmed.split_once('=').and_then(|(key, _)| {
                let key = key.trim();
                remaining
                    .iter()
                    .position(|(k, _)| k == key)
                    .map(|pos| remaining.remove(pos))
            })
        } else {
            None
        };

        match replaced {
            Some((key, value)) => out.push_str(&format!("{key}={value}\n")),
            None => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    for (key, value) in remaining {
        out.push_str(&format!("{key}={value}\n"));
    }
    out
}

/// Starter content for a fresh vault.
pub fn template(name: &str) -> String {
    format!("# Environment for {name}\n# KEY=value, one per line\n")
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}
