//! Move parsing errors.

use crate::error::{ErrorSeverity, GameError};

/// Why a move text was rejected. A rejected move is dropped from the block.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("invalid player name {player:?}")]
    InvalidName { player: String },

    #[error("malformed JSON: {0}")]
    Json(String),

    #[error("move is not a JSON object")]
    NotAnObject,

    #[error("field {field} has the wrong type")]
    FieldType { field: &'static str },

    #[error("field {field} is not a valid address")]
    InvalidAddress { field: &'static str },

    #[error("invalid team colour {color}")]
    InvalidColor { color: i64 },

    /// `color` must be the only instruction of a spawn request.
    #[error("spawn request carries other instructions")]
    SpawnWithInstructions,

    #[error("unknown field {key:?}")]
    UnknownField { key: String },

    #[error("character {index} appears twice")]
    DuplicateIndex { index: i32 },

    #[error("instructions for character {index} are not an object")]
    CharacterNotObject { index: i32 },

    #[error("waypoints of character {index}: {reason}")]
    Waypoints { index: i32, reason: &'static str },

    #[error("character {index} cannot destruct and walk in one move")]
    DestructWithWaypoints { index: i32 },
}

impl GameError for MoveError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        use MoveError::*;
        match self {
            InvalidName { .. } => "MOVE_INVALID_NAME",
            Json(_) | NotAnObject => "MOVE_MALFORMED",
            FieldType { .. } => "MOVE_FIELD_TYPE",
            InvalidAddress { .. } => "MOVE_INVALID_ADDRESS",
            InvalidColor { .. } => "MOVE_INVALID_COLOR",
            SpawnWithInstructions => "MOVE_SPAWN_WITH_INSTRUCTIONS",
            UnknownField { .. } => "MOVE_UNKNOWN_FIELD",
            DuplicateIndex { .. } => "MOVE_DUPLICATE_INDEX",
            CharacterNotObject { .. } => "MOVE_CHARACTER_NOT_OBJECT",
            Waypoints { .. } => "MOVE_WAYPOINTS",
            DestructWithWaypoints { .. } => "MOVE_DESTRUCT_WITH_WAYPOINTS",
        }
    }
}
