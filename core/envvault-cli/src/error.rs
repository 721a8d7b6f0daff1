//! CLI error wrapper and per-command exit codes.

use crate::cli::Commands;
use envvault_engine::VaultError;
use envvault_identity::IdentityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("{0}")]
    Input(String),

    #[error("aborted")]
    Aborted,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Maps an error to the documented exit code for the command that
/// produced it; anything unlisted exits 1.
pub fn exit_code(command: &Commands, err: &CliError) -> i32 {
    use CliError::*;
    use Commands::*;

    match (command, err) {
        (Init { .. }, CliError::Identity(IdentityError::AlreadyInitialized)) => 1,
        (Init { .. }, CliError::Identity(IdentityError::PasswordTooShort)) => 2,
        (Init { .. }, Input(_)) => 2,

        (InitRepo { .. }, Vault(VaultError::NoIdentity) | CliError::Identity(IdentityError::NoIdentity)) => 1,
        (InitRepo { .. }, Vault(VaultError::AlreadyExists(_)) | Aborted) => 2,

        (Add { .. }, Vault(VaultError::NoAccess(_) | VaultError::VaultNotFound(_))) => 1,
        (Add { .. }, Input(_)) => 2,

        (Get { .. }, Vault(VaultError::NoAccess(_) | VaultError::VaultNotFound(_))) => 1,
        (Get { .. }, Vault(VaultError::Integrity)) => 2,
        (Get { .. }, Vault(VaultError::BadCredentials)) => 3,

        (Share { .. }, Vault(VaultError::InvalidPublicKey)) => 1,
        (Share { .. }, Vault(VaultError::NoAccess(_))) => 2,

        (Revoke { .. }, Vault(VaultError::NotARecipient(_))) => 1,
        (Revoke { .. }, Vault(VaultError::SelfRevoke)) => 2,

        _ => 1,
    }
}
