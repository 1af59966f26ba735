//! In-memory repositories for tests and dry runs.

mod state;

pub use state::InMemoryStateRepository;
