//! Error types raised by repository implementations.

use hunt_core::StateError;
use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("state repository lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot on disk could not be encoded or decoded.
    #[error("snapshot codec error: {0}")]
    Codec(#[from] StateError),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
