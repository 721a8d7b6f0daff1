//! Storage error types.

use thiserror::Error;

/// Result type for artifact storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the artifact store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid vault name: {0:?}")]
    InvalidName(String),

    #[error("malformed document: {0}")]
    Document(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
