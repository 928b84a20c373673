//! A loaded chunk: its non-air blocks and its block entities.

use ingot_registry::REGISTRY;
use ingot_registry::blocks::{BlockRef, BlockState, vanilla_blocks};
use ingot_registry::nbt::{compound_list, get_compound, get_compound_list, get_i32, get_string};
use ingot_utils::{BlockPos, ChunkPos, Identifier};
use rustc_hash::FxHashMap;
use simdnbt::owned::{NbtCompound, NbtTag};

use crate::block_entity::{SharedBlockEntity, load_static, save_with_id};
use crate::ticks::{SavedTick, TickPriority};

/// Blocks and block entities of one chunk column.
pub struct LevelChunk {
    pos: ChunkPos,
    blocks: FxHashMap<BlockPos, BlockState>,
    block_entities: FxHashMap<BlockPos, SharedBlockEntity>,
    unsaved: bool,
}

impl LevelChunk {
    /// An all-air chunk.
    #[must_use]
    pub fn new(pos: ChunkPos) -> Self {
        Self {
            pos,
            blocks: FxHashMap::default(),
            block_entities: FxHashMap::default(),
            unsaved: false,
        }
    }

    /// The chunk's position.
    #[must_use]
    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    /// The state at `pos`, air if nothing was placed.
    #[must_use]
    pub fn get_block_state(&self, pos: BlockPos) -> BlockState {
        self.blocks
            .get(&pos)
            .copied()
            .unwrap_or_else(|| vanilla_blocks::AIR.default_state())
    }

    /// Stores `state` at `pos` and returns the previous state.
    pub fn set_block_state(&mut self, pos: BlockPos, state: BlockState) -> BlockState {
        self.unsaved = true;
        let old = if state.is_air() {
            self.blocks.remove(&pos)
        } else {
            self.blocks.insert(pos, state)
        };
        old.unwrap_or_else(|| vanilla_blocks::AIR.default_state())
    }

    /// The block entity at `pos`.
    #[must_use]
    pub fn get_block_entity(&self, pos: BlockPos) -> Option<&SharedBlockEntity> {
        self.block_entities.get(&pos)
    }

    /// Attaches a block entity, returning the one it replaces.
    pub fn add_block_entity(
        &mut self,
        pos: BlockPos,
        block_entity: SharedBlockEntity,
    ) -> Option<SharedBlockEntity> {
        self.unsaved = true;
        self.block_entities.insert(pos, block_entity)
    }

    /// Detaches the block entity at `pos`.
    pub fn remove_block_entity(&mut self, pos: BlockPos) -> Option<SharedBlockEntity> {
        let removed = self.block_entities.remove(&pos);
        if removed.is_some() {
            self.unsaved = true;
        }
        removed
    }

    /// All block entities, ordered by position.
    #[must_use]
    pub fn block_entities(&self) -> Vec<(BlockPos, SharedBlockEntity)> {
        let mut entries: Vec<_> = self
            .block_entities
            .iter()
            .map(|(pos, block_entity)| (*pos, block_entity.clone()))
            .collect();
        entries.sort_unstable_by_key(|(pos, _)| *pos);
        entries
    }

    /// Whether the chunk changed since it was last saved.
    #[must_use]
    pub fn is_unsaved(&self) -> bool {
        self.unsaved
    }

    /// Flags the chunk as needing a save.
    pub fn mark_unsaved(&mut self) {
        self.unsaved = true;
    }

    /// Serializes blocks, block entities and the pending ticks given.
    #[must_use]
    pub fn save(&self, ticks: &[SavedTick<BlockRef>]) -> NbtCompound {
        let mut nbt = NbtCompound::new();
        nbt.insert("xPos", NbtTag::Int(self.pos.x()));
        nbt.insert("zPos", NbtTag::Int(self.pos.z()));

        let mut positions: Vec<&BlockPos> = self.blocks.keys().collect();
        positions.sort_unstable();
        let blocks = positions
            .into_iter()
            .map(|pos| save_block(*pos, &self.blocks[pos]))
            .collect();
        nbt.insert("blocks", compound_list(blocks));

        let block_entities = self
            .block_entities()
            .into_iter()
            .map(|(_, block_entity)| save_with_id(&*block_entity.lock()))
            .collect();
        nbt.insert("block_entities", compound_list(block_entities));

        let ticks = ticks.iter().map(save_tick).collect();
        nbt.insert("block_ticks", compound_list(ticks));
        nbt
    }

    /// Rebuilds a chunk from [`LevelChunk::save`] output. Returns the chunk and its
    /// pending ticks. Entries that can't be read are skipped.
    #[must_use]
    pub fn load(pos: ChunkPos, nbt: &NbtCompound) -> (Self, Vec<SavedTick<BlockRef>>) {
        let mut chunk = Self::new(pos);

        for entry in get_compound_list(nbt, "blocks").unwrap_or_default() {
            if let Some((block_pos, state)) = load_block(entry) {
                chunk.blocks.insert(block_pos, state);
            }
        }

        for entry in get_compound_list(nbt, "block_entities").unwrap_or_default() {
            let Some(block_pos) = read_pos(entry) else {
                log::error!("Skipping block entity without a position in chunk {pos:?}");
                continue;
            };
            if block_pos.chunk_pos() != pos {
                log::error!("Skipping block entity at {block_pos} outside chunk {pos:?}");
                continue;
            }
            let state = chunk.get_block_state(block_pos);
            if let Some(block_entity) = load_static(block_pos, state, entry) {
                chunk.block_entities.insert(block_pos, block_entity);
            }
        }

        let ticks = get_compound_list(nbt, "block_ticks")
            .unwrap_or_default()
            .iter()
            .filter_map(load_tick)
            .collect();
        (chunk, ticks)
    }
}

fn read_pos(nbt: &NbtCompound) -> Option<BlockPos> {
    Some(BlockPos::new(
        get_i32(nbt, "x")?,
        get_i32(nbt, "y")?,
        get_i32(nbt, "z")?,
    ))
}

fn write_pos(nbt: &mut NbtCompound, pos: BlockPos) {
    nbt.insert("x", NbtTag::Int(pos.x()));
    nbt.insert("y", NbtTag::Int(pos.y()));
    nbt.insert("z", NbtTag::Int(pos.z()));
}

fn resolve_block(id: &str) -> Option<BlockRef> {
    let block = id
        .parse::<Identifier>()
        .ok()
        .and_then(|key| REGISTRY.blocks.by_key(&key));
    if block.is_none() {
        log::warn!("Skipping unknown block {id}");
    }
    block
}

fn save_block(pos: BlockPos, state: &BlockState) -> NbtCompound {
    let mut nbt = NbtCompound::new();
    write_pos(&mut nbt, pos);
    nbt.insert("Name", NbtTag::String(state.get_block().key.to_string().into()));
    let properties = state.properties();
    if !properties.is_empty() {
        let mut props = NbtCompound::new();
        for (name, value) in properties {
            props.insert(name, NbtTag::String(value.into()));
        }
        nbt.insert("Properties", NbtTag::Compound(props));
    }
    nbt
}

fn load_block(nbt: &NbtCompound) -> Option<(BlockPos, BlockState)> {
    let pos = read_pos(nbt)?;
    let block = resolve_block(&get_string(nbt, "Name")?)?;
    let properties: Vec<(String, String)> = get_compound(nbt, "Properties")
        .map(|props| {
            props
                .iter()
                .filter_map(|(name, value)| match value {
                    NbtTag::String(value) => {
                        Some((name.to_str().to_string(), value.to_str().to_string()))
                    }
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    let properties: Vec<(&str, &str)> = properties
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    let state = REGISTRY
        .blocks
        .state_from_properties(&block.key, &properties)?;
    Some((pos, state))
}

fn save_tick(tick: &SavedTick<BlockRef>) -> NbtCompound {
    let mut nbt = NbtCompound::new();
    nbt.insert("i", NbtTag::String(tick.tick_type.key.to_string().into()));
    write_pos(&mut nbt, tick.pos);
    nbt.insert("t", NbtTag::Int(i32::try_from(tick.delay).unwrap_or(i32::MAX)));
    nbt.insert("p", NbtTag::Int(i32::from(tick.priority.value())));
    nbt
}

fn load_tick(nbt: &NbtCompound) -> Option<SavedTick<BlockRef>> {
    let tick_type = resolve_block(&get_string(nbt, "i")?)?;
    Some(SavedTick {
        tick_type,
        pos: read_pos(nbt)?,
        delay: u32::try_from(get_i32(nbt, "t").unwrap_or(0)).unwrap_or(0),
        priority: TickPriority::from_value(get_i32(nbt, "p").unwrap_or(0)),
    })
}
