//! Where unloaded chunks go.

mod ram_only;
mod storage;

use ingot_utils::ChunkPos;
use simdnbt::owned::NbtCompound;

pub use ram_only::RamOnlyStorage;
pub use storage::ChunkStorage;

/// A serialized chunk ready to be stored.
#[derive(Debug, Clone)]
pub struct PreparedChunkSave {
    /// The chunk position.
    pub pos: ChunkPos,
    /// The serialized chunk.
    pub data: NbtCompound,
}
