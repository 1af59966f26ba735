//! Unified error type surfaced by the replay driver.

use hunt_core::{StateError, StepError};
use thiserror::Error;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The engine rejected the block; the chain head did not move.
    #[error("block rejected: {0}")]
    Step(#[from] StepError),

    #[error(transparent)]
    Codec(#[from] StateError),

    /// A block file or block field that cannot be used.
    #[error("invalid block input: {0}")]
    Input(String),
}
