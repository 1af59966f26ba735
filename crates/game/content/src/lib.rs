//! Static content of the hunter arena and its loaders.
//!
//! The POI and merchant tables are compiled in; the obstacle grid, harvest
//! areas and crown spawns are read from a RON world file, and the engine
//! configuration from TOML. Content is consumed when a [`hunt_core::World`]
//! is built and never appears in game state.

pub mod tables;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use tables::{builtin_merchants, builtin_pois};

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentFactory, LoadResult, WorldFile, WorldLoader};
