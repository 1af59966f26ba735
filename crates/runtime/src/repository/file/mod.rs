//! File-backed repositories.

mod state;

pub use state::FileStateRepository;
