//! Shared value types for the ingot engine: grid positions, vectors, directions,
//! identifiers, lock aliases and the deterministic random source.

pub mod direction;
pub mod locks;
pub mod math;
pub mod random;
pub mod types;

pub use direction::Direction;
pub use types::{BlockPos, ChunkPos, Identifier};
