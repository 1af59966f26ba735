//! Persistence of the state chain.
//!
//! Static content (world, configuration) is loaded by `hunt-content`; the
//! repositories here only hold the states the replay produces.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileStateRepository;
pub use memory::InMemoryStateRepository;
pub use traits::StateRepository;
