//! Error types of the step pipeline.

use crate::error::{ErrorContext, ErrorSeverity, GameError};
use crate::moves::MoveError;
use crate::state::PlayerId;

/// Why a whole batch of moves was rejected. A rejected batch produces no
/// state at all; the caller keeps the previous one.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    /// A move does not fit the state it is applied to (unknown player
    /// instructing characters, a spawn for an existing name, a colour change).
    #[error("move of {player:?} is not valid against the state at height {height}")]
    InvalidMove { player: PlayerId, height: i32 },

    /// A move text that did not parse; raised when the caller builds a batch
    /// from raw texts and insists on all of them.
    #[error("move of {player:?} does not parse: {source}")]
    Malformed {
        player: PlayerId,
        #[source]
        source: MoveError,
    },

    /// A block carries at most one move per player.
    #[error("player {player:?} has more than one move at height {height}")]
    DuplicateMove { player: PlayerId, height: i32 },

    #[error("height {height} is past the limit {limit}")]
    HeightLimit { height: i32, limit: i32 },
}

impl GameError for StepError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidMove { .. } => "STEP_INVALID_MOVE",
            Self::Malformed { .. } => "STEP_MALFORMED_MOVE",
            Self::DuplicateMove { .. } => "STEP_DUPLICATE_MOVE",
            Self::HeightLimit { .. } => "STEP_HEIGHT_LIMIT",
        }
    }
}

/// A character whose geometry makes no sense for the AI.
///
/// Never propagated: the step logs it, leaves the character where it stands
/// and carries on with the next one.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("character off the map or with team colour {color}")]
    BadPosition { color: usize, context: ErrorContext },

    #[error("chosen step leaves the map")]
    StepOffMap { context: ErrorContext },
}

impl GameError for InvariantViolation {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::BadPosition { context, .. } | Self::StepOffMap { context } => Some(context),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadPosition { .. } => "AI_BAD_POSITION",
            Self::StepOffMap { .. } => "AI_STEP_OFF_MAP",
        }
    }
}
