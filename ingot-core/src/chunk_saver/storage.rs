//! Chunk storage abstraction.

use std::io;

use ingot_utils::ChunkPos;
use simdnbt::owned::NbtCompound;

use super::PreparedChunkSave;
use super::ram_only::RamOnlyStorage;

/// Chunk storage backend.
pub enum ChunkStorage {
    /// In-memory storage for tests and simulations.
    RamOnly(RamOnlyStorage),
}

impl ChunkStorage {
    /// Loads a chunk from storage.
    ///
    /// Returns `Ok(None)` if the chunk doesn't exist in storage.
    pub fn load_chunk(&self, pos: ChunkPos) -> io::Result<Option<NbtCompound>> {
        match self {
            Self::RamOnly(ram) => ram.load_chunk(pos),
        }
    }

    /// Saves prepared chunk data to storage.
    ///
    /// Returns `Ok(true)` if the chunk was saved, `Ok(false)` if it was a no-op.
    pub fn save_chunk_data(&self, prepared: PreparedChunkSave) -> io::Result<bool> {
        match self {
            Self::RamOnly(ram) => ram.save_chunk_data(prepared),
        }
    }

    /// Checks if a chunk exists in storage.
    pub fn chunk_exists(&self, pos: ChunkPos) -> io::Result<bool> {
        match self {
            Self::RamOnly(ram) => Ok(ram.chunk_exists(pos)),
        }
    }
}
