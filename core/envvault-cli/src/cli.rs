//! Command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// envvault - encrypted .env files, shared through your repository
#[derive(Parser)]
#[command(name = "envvault")]
#[command(version)]
#[command(about = "Store .env files encrypted at rest and share them per device")]
#[command(after_help = "\
HOW IT WORKS:
    Each device has one password-protected identity (~/.env-vault). A vault's
    content is encrypted under a per-vault data key, which is sealed
    separately for every recipient device. Sharing wraps the key for one
    more device; revoking rotates it. The encrypted artifacts are meant to
    be committed, so secrets travel the same channel as the code.

TARGETS:
    Commands taking <name|.> accept a named vault (stored under
    ~/.env-vault/repos/<name>) or '.' for the .env-vault/ directory of the
    current project.

EXAMPLES:
    envvault init --label work-laptop
    envvault init-repo .env              Create a project vault from .env
    envvault get .                       Print the decrypted content
    envvault share . <public-key> paul   Grant another device access
    envvault revoke . 89abcdef01234567   Revoke and rotate the data key
    envvault doctor --fix                Tighten file modes in place")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create this device's identity
    Init {
        /// Device label shown to other recipients (default: derived from $USER)
        #[arg(long)]
        label: Option<String>,
    },

    /// Print this device's public key and fingerprint
    Identity,

    /// Create a vault in the current project from an env file
    InitRepo {
        /// Plaintext env file to encrypt (default: an empty template)
        env_file: Option<PathBuf>,
    },

    /// Encrypt content into a vault (replaces existing content)
    Add {
        /// Vault name or '.'
        target: String,
        /// Plaintext env file (default: stdin)
        file: Option<PathBuf>,
        /// Merge entries into the existing content instead of replacing it
        #[arg(long)]
        merge: bool,
    },

    /// Decrypt a vault
    Get {
        /// Vault name or '.' (default: '.')
        target: Option<String>,
        /// Write to this file instead of stdout
        out_file: Option<PathBuf>,
    },

    /// Grant another device access to a vault
    Share {
        /// Vault name or '.'
        target: String,
        /// Recipient device public key (base64)
        public_key: String,
        /// Label for the recipient (default: derived from the fingerprint)
        label: Option<String>,
    },

    /// Remove a device's access and rotate the data key
    Revoke {
        /// Vault name or '.'
        target: String,
        /// Fingerprint of the device to revoke
        fingerprint: String,
    },

    /// List a vault's recipients
    Recipients {
        /// Vault name or '.' (default: '.')
        target: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List named vaults under the central root
    List,

    /// Delete a named vault
    Rm {
        /// Vault name
        name: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Open a vault's content in $EDITOR and re-encrypt on save
    Edit {
        /// Vault name or '.' (default: '.')
        target: Option<String>,
    },

    /// Check file modes, artifacts, and KDF parameters
    Doctor {
        /// Tighten modes and supply missing .gitignore patterns
        #[arg(long)]
        fix: bool,
    },

    /// Delete the identity and all central vaults
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}
