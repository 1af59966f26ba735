//! Deterministic rules of the hunter arena.
//!
//! `hunt-core` owns the canonical game: the static world contract, the state
//! types, the move wire format and the per-block step function. It performs
//! no I/O, so every node replaying the same blocks computes bit-identical
//! states. All state transitions flow through [`engine::GameEngine`].
#[cfg(feature = "serde")]
pub mod codec;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod moves;
pub mod report;
pub mod state;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod view;

#[cfg(feature = "serde")]
pub use codec::{MIN_STATE_VERSION, STATE_VERSION, decode_state, encode_state};
pub use config::{ForkSchedule, GameConfig, Network};
pub use engine::{
    GameEngine, InvariantViolation, StepContext, StepData, StepError, StepOutcome, StepResult,
};
pub use env::{MapOracle, World, WorldError};
pub use error::{ErrorContext, ErrorSeverity, GameError};
pub use moves::{Move, MoveError, format_money, parse_money};
pub use report::StatsReport;
pub use state::{
    BlockHash, CharacterId, CharacterState, Coord, GameState, PlayerId, PlayerState, Role,
    StateError,
};
pub use view::state_view;
