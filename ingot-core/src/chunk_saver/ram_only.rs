//! RAM-only chunk storage.
//!
//! Keeps serialized chunks in a map instead of on disk. Unloading and reloading a
//! chunk goes through the full save and load path, so the in-memory copy behaves
//! like a region file would for the lifetime of the process.

use std::io;

use ingot_utils::ChunkPos;
use ingot_utils::locks::SyncRwLock;
use rustc_hash::FxHashMap;
use simdnbt::owned::NbtCompound;

use super::PreparedChunkSave;

/// In-memory chunk storage.
pub struct RamOnlyStorage {
    chunks: SyncRwLock<FxHashMap<ChunkPos, NbtCompound>>,
    /// If true, missing chunks load as empty instead of `None`.
    create_empty_on_miss: bool,
}

impl RamOnlyStorage {
    /// Storage that hands out empty chunks for positions never saved.
    #[must_use]
    pub fn empty_world() -> Self {
        Self {
            chunks: SyncRwLock::new(FxHashMap::default()),
            create_empty_on_miss: true,
        }
    }

    /// Storage that only returns previously saved chunks.
    #[must_use]
    pub fn preloaded() -> Self {
        Self {
            chunks: SyncRwLock::new(FxHashMap::default()),
            create_empty_on_miss: false,
        }
    }

    /// Loads a chunk from storage.
    pub fn load_chunk(&self, pos: ChunkPos) -> io::Result<Option<NbtCompound>> {
        match self.chunks.read().get(&pos) {
            Some(data) => Ok(Some(data.clone())),
            None if self.create_empty_on_miss => Ok(Some(NbtCompound::new())),
            None => Ok(None),
        }
    }

    /// Saves prepared chunk data to storage.
    pub fn save_chunk_data(&self, prepared: PreparedChunkSave) -> io::Result<bool> {
        self.chunks.write().insert(prepared.pos, prepared.data);
        Ok(true)
    }

    /// Checks if a chunk exists in storage.
    #[must_use]
    pub fn chunk_exists(&self, pos: ChunkPos) -> bool {
        self.create_empty_on_miss || self.chunks.read().contains_key(&pos)
    }
}

#[cfg(test)]
mod tests {
    use simdnbt::owned::NbtTag;

    use super::*;

    #[test]
    fn test_preloaded_only_returns_saved() {
        let storage = RamOnlyStorage::preloaded();
        let pos = ChunkPos::new(2, 3);
        assert!(storage.load_chunk(pos).expect("ram storage").is_none());
        assert!(!storage.chunk_exists(pos));

        let mut data = NbtCompound::new();
        data.insert("xPos", NbtTag::Int(2));
        storage
            .save_chunk_data(PreparedChunkSave { pos, data })
            .expect("ram storage");
        let loaded = storage.load_chunk(pos).expect("ram storage").expect("saved");
        assert!(loaded.get("xPos").is_some());
    }

    #[test]
    fn test_empty_world_creates_on_miss() {
        let storage = RamOnlyStorage::empty_world();
        assert!(storage.chunk_exists(ChunkPos::new(0, 0)));
        assert!(storage.load_chunk(ChunkPos::new(0, 0)).expect("ram storage").is_some());
    }
}
