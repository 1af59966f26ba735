//! Replay driver for the hunter arena.
//!
//! This crate feeds blocks of player moves through [`hunt_core::GameEngine`],
//! keeps the chain head, persists every produced state and optionally writes
//! the stats pages. The engine itself never touches the filesystem.
//!
//! Modules are organized by responsibility:
//! - [`replay`] hosts the [`Replayer`]
//! - [`input`] defines the block file format
//! - [`repository`] persists the state chain
//! - [`stats`] renders stats pages to disk
pub mod digest;
pub mod error;
pub mod input;
pub mod replay;
pub mod repository;
pub mod stats;

pub use digest::state_digest;
pub use error::{Result, RuntimeError};
pub use input::{BlockInput, MoveInput};
pub use replay::Replayer;
pub use repository::{
    FileStateRepository, InMemoryStateRepository, RepositoryError, StateRepository,
};
pub use stats::write_stats;
