//! State persistence and integrity errors.

use crate::error::{ErrorSeverity, GameError};
use crate::state::CharacterId;

/// Errors raised while encoding, decoding or checking a persisted state.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateError {
    /// The snapshot predates the oldest layout this engine can read.
    #[error("state schema version {found} is older than the supported minimum {minimum}")]
    UnsupportedVersion {
        /// Version found in the header.
        found: u32,
        /// Oldest version accepted.
        minimum: u32,
    },

    /// The buffer is shorter than the version header.
    #[error("state buffer truncated ({len} bytes)")]
    Truncated { len: usize },

    #[error("failed to encode state: {0}")]
    Encode(String),

    #[error("failed to decode state: {0}")]
    Decode(String),

    /// A character's held loot is shaped like a refund record.
    #[error("character {character} holds a refund record")]
    RefundInState { character: CharacterId },
}

impl GameError for StateError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        use StateError::*;
        match self {
            UnsupportedVersion { .. } => "STATE_UNSUPPORTED_VERSION",
            Truncated { .. } => "STATE_TRUNCATED",
            Encode(_) => "STATE_ENCODE",
            Decode(_) => "STATE_DECODE",
            RefundInState { .. } => "STATE_REFUND_IN_STATE",
        }
    }
}
