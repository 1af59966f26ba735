//! Classification shared by the crate's error types.
//!
//! `MoveError`, `StepError`, `StateError` and `WorldError` live next to the
//! code that raises them and all implement [`GameError`]. Errors never feed
//! back into the game state.

use crate::state::{CharacterId, Coord};

/// Severity level of an error, used for categorization and recovery strategies.
///
/// Errors are classified by their recoverability and expected handling:
/// - **Recoverable**: Conditions the step absorbs locally (e.g. a single bad move is skipped)
/// - **Validation**: Invalid input that should be rejected without retry
/// - **Internal**: Unexpected state inconsistencies that require investigation
/// - **Fatal**: Unrecoverable errors indicating corrupted game state or world data
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - the offending input is dropped and processing continues.
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: malformed move JSON, spawning an existing player
    Validation,

    /// Internal error - unexpected state inconsistency.
    ///
    /// Examples: a scan stepping outside the navigation window.
    /// These indicate bugs and should be investigated.
    Internal,

    /// Fatal error - game state corrupted, cannot continue.
    ///
    /// Examples: unsupported state schema, static world tables of the wrong shape
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Where in the step an invariant broke.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorContext {
    /// Character that triggered the error (if applicable).
    pub character: Option<CharacterId>,

    /// Tile where the error occurred (if applicable).
    pub coord: Option<Coord>,

    /// Height of the state being produced.
    ///
    /// Together with the block hash this identifies the step, which is enough
    /// to replay the failure deterministically.
    pub height: i32,

    /// Optional static message providing additional context.
    pub message: Option<&'static str>,
}

impl ErrorContext {
    /// Creates a new error context for the given height.
    #[must_use]
    pub const fn new(height: i32) -> Self {
        Self {
            character: None,
            coord: None,
            height,
            message: None,
        }
    }

    /// Attaches a character to this context (builder pattern).
    #[must_use]
    pub fn with_character(mut self, character: CharacterId) -> Self {
        self.character = Some(character);
        self
    }

    /// Attaches a tile to this context (builder pattern).
    #[must_use]
    pub const fn with_coord(mut self, coord: Coord) -> Self {
        self.coord = Some(coord);
        self
    }

    /// Attaches a static message to this context (builder pattern).
    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new(-1)
    }
}

/// Uniform classification so callers can log any error the same way.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns the context information for this error, if available.
    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Falls back to the type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
