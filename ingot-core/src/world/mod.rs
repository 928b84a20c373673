//! This module contains the `World` struct: loaded chunks, the block entities in
//! them, scheduled ticks, loose items and viewers, advanced one game tick at a time.
//!
//! Lock order: a block entity lock may be held while taking the chunk, tick,
//! entity, viewer or event locks, never the other way around. A ticking block
//! entity holds its own lock and at most one neighbour's.

use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ingot_registry::blocks::{BlockRef, BlockState, vanilla_blocks};
use ingot_registry::item_stack::ItemStack;
use ingot_utils::locks::{SyncMutex, SyncMutexGuard, SyncRwLock};
use ingot_utils::math::{AABB, Vector3};
use ingot_utils::random::Xoroshiro;
use ingot_utils::types::UpdateFlags;
use ingot_utils::{BlockPos, ChunkPos, Direction};
use rustc_hash::{FxHashMap, FxHashSet};
use uuid::Uuid;

use crate::behavior::get_behavior;
use crate::block_entity::SharedBlockEntity;
use crate::chunk_saver::{ChunkStorage, PreparedChunkSave, RamOnlyStorage};
use crate::config::EngineConfig;
use crate::entity::{ItemEntity, SharedItemEntity, Viewer};
use crate::inventory::Container;
use crate::recipe::{SmeltingRules, SmeltingTable};
use crate::ticks::LevelTicks;

mod chunk;
mod events;

pub use chunk::LevelChunk;
pub use events::{SoundEvent, WorldEvent};

/// A struct that represents a world.
pub struct World {
    config: EngineConfig,
    chunks: SyncRwLock<FxHashMap<ChunkPos, LevelChunk>>,
    block_ticks: SyncMutex<LevelTicks<BlockRef>>,
    tickers: SyncMutex<Vec<SharedBlockEntity>>,
    entities: SyncRwLock<Vec<SharedItemEntity>>,
    viewers: SyncRwLock<FxHashMap<Uuid, Viewer>>,
    powered: SyncRwLock<FxHashSet<BlockPos>>,
    events: SyncMutex<Vec<WorldEvent>>,
    analog_outputs: SyncMutex<FxHashMap<BlockPos, i32>>,
    game_time: AtomicU64,
    random: SyncMutex<Xoroshiro>,
    storage: ChunkStorage,
    recipes: Arc<dyn SmeltingRules>,
}

impl World {
    /// A world without chunks, recipes or fuels, saving to memory.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_recipes(config, Arc::new(SmeltingTable::new()))
    }

    /// A world whose furnaces use `recipes`.
    #[must_use]
    pub fn with_recipes(config: EngineConfig, recipes: Arc<dyn SmeltingRules>) -> Self {
        let seed = config.seed;
        Self {
            config,
            chunks: SyncRwLock::new(FxHashMap::default()),
            block_ticks: SyncMutex::new(LevelTicks::new()),
            tickers: SyncMutex::new(Vec::new()),
            entities: SyncRwLock::new(Vec::new()),
            viewers: SyncRwLock::new(FxHashMap::default()),
            powered: SyncRwLock::new(FxHashSet::default()),
            events: SyncMutex::new(Vec::new()),
            analog_outputs: SyncMutex::new(FxHashMap::default()),
            game_time: AtomicU64::new(0),
            random: SyncMutex::new(Xoroshiro::from_seed(seed)),
            storage: ChunkStorage::RamOnly(RamOnlyStorage::empty_world()),
            recipes,
        }
    }

    /// The configuration the world runs with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ticks elapsed since the world was created.
    #[must_use]
    pub fn game_time(&self) -> u64 {
        self.game_time.load(Ordering::Relaxed)
    }

    /// The world's random source.
    pub fn random(&self) -> SyncMutexGuard<'_, Xoroshiro> {
        self.random.lock()
    }

    /// Smelting recipes and fuels.
    #[must_use]
    pub fn recipes(&self) -> &dyn SmeltingRules {
        &*self.recipes
    }

    /// A handle to the smelting rules for block entities that keep one.
    #[must_use]
    pub fn shared_recipes(&self) -> Arc<dyn SmeltingRules> {
        Arc::clone(&self.recipes)
    }

    /// Queues an event for observers.
    pub fn emit(&self, event: WorldEvent) {
        self.events.lock().push(event);
    }

    /// Takes every event queued so far.
    pub fn drain_events(&self) -> Vec<WorldEvent> {
        mem::take(&mut *self.events.lock())
    }

    // Chunks

    /// Whether the chunk at `pos` is loaded.
    #[must_use]
    pub fn is_chunk_loaded(&self, pos: ChunkPos) -> bool {
        self.chunks.read().contains_key(&pos)
    }

    /// Loads the chunk at `pos` from storage, restoring its block entities and
    /// pending ticks. Returns false if it was already loaded or storage has
    /// nothing for it.
    pub fn load_chunk(&self, pos: ChunkPos) -> bool {
        if self.is_chunk_loaded(pos) {
            return false;
        }
        let data = match self.storage.load_chunk(pos) {
            Ok(Some(data)) => data,
            Ok(None) => return false,
            Err(err) => {
                log::error!("Failed to load chunk {pos:?}: {err}");
                return false;
            }
        };

        let (chunk, ticks) = LevelChunk::load(pos, &data);
        let block_entities = chunk.block_entities();
        self.chunks.write().insert(pos, chunk);
        self.block_ticks
            .lock()
            .add_saved_container(pos, ticks, self.game_time());

        let mut tickers = self.tickers.lock();
        for (_, block_entity) in block_entities {
            let ticking = {
                let mut guard = block_entity.lock();
                guard.set_level(self);
                guard.is_ticking()
            };
            if ticking {
                tickers.push(block_entity);
            }
        }
        log::debug!("Loaded chunk {pos:?}");
        true
    }

    /// Saves and unloads the chunk at `pos`. Its block entities are detached and
    /// stop ticking.
    pub fn unload_chunk(&self, pos: ChunkPos) -> bool {
        let Some(chunk) = self.chunks.write().remove(&pos) else {
            return false;
        };
        let ticks = self
            .block_ticks
            .lock()
            .remove_container(&pos)
            .map(|container| container.to_saved(self.game_time()))
            .unwrap_or_default();

        let data = chunk.save(&ticks);
        for (block_pos, block_entity) in chunk.block_entities() {
            block_entity.lock().set_removed();
            self.analog_outputs.lock().remove(&block_pos);
        }
        if let Err(err) = self.storage.save_chunk_data(PreparedChunkSave { pos, data }) {
            log::error!("Failed to save chunk {pos:?}: {err}");
        }
        log::debug!("Unloaded chunk {pos:?}");
        true
    }

    // Blocks

    /// The block state at `pos`; air in unloaded chunks.
    #[must_use]
    pub fn get_block_state(&self, pos: BlockPos) -> BlockState {
        self.chunks
            .read()
            .get(&pos.chunk_pos())
            .map_or_else(|| vanilla_blocks::AIR.default_state(), |chunk| chunk.get_block_state(pos))
    }

    /// Sets the block at `pos`, replacing, creating or removing its block entity
    /// as needed and running placement and neighbour updates per `flags`.
    ///
    /// Returns false if nothing changed or the chunk isn't loaded.
    pub fn set_block(&self, pos: BlockPos, state: BlockState, flags: UpdateFlags) -> bool {
        let (old, removed) = {
            let mut chunks = self.chunks.write();
            let Some(chunk) = chunks.get_mut(&pos.chunk_pos()) else {
                log::warn!("Ignoring block change at {pos} in an unloaded chunk");
                return false;
            };
            let old = chunk.get_block_state(pos);
            if old == state {
                return false;
            }
            let removed = if old.get_block() == state.get_block() {
                None
            } else {
                chunk.remove_block_entity(pos)
            };
            chunk.set_block_state(pos, state);
            (old, removed)
        };

        if let Some(block_entity) = removed {
            let mut block_entity = block_entity.lock();
            if !flags.contains(UpdateFlags::UPDATE_SUPPRESS_DROPS) {
                block_entity.pre_remove_side_effects(self);
            }
            block_entity.set_removed();
            self.analog_outputs.lock().remove(&pos);
        }

        if let Some(block_entity) = self.get_block_entity(pos) {
            block_entity.lock().set_block_state(state);
        } else {
            let behavior = get_behavior(state.get_block());
            if behavior.has_block_entity()
                && let Some(block_entity) = behavior.new_block_entity(pos, state)
            {
                self.add_block_entity(block_entity);
            }
        }

        self.emit(WorldEvent::BlockChanged { pos, old, new: state });

        if !flags.contains(UpdateFlags::UPDATE_SKIP_ON_PLACE) {
            get_behavior(state.get_block()).on_place(state, self, pos, old);
        }
        if flags.contains(UpdateFlags::UPDATE_NEIGHBORS) {
            self.update_neighbors_at(pos, state.get_block());
        }
        true
    }

    /// Rewrites the block state at `pos` without touching its block entity or
    /// notifying neighbours. Meant for a block entity changing its own block's
    /// visual properties while it holds its lock; the caller updates its cached
    /// state itself.
    pub fn update_block_state_in_place(&self, pos: BlockPos, state: BlockState) {
        let old = {
            let mut chunks = self.chunks.write();
            let Some(chunk) = chunks.get_mut(&pos.chunk_pos()) else {
                return;
            };
            let old = chunk.get_block_state(pos);
            if old == state || old.get_block() != state.get_block() {
                return;
            }
            chunk.set_block_state(pos, state);
            old
        };
        self.emit(WorldEvent::BlockChanged { pos, old, new: state });
    }

    /// Notifies the six neighbours of `pos` that `source` changed.
    pub fn update_neighbors_at(&self, pos: BlockPos, source: BlockRef) {
        for direction in Direction::ALL {
            let neighbor = pos.relative(direction);
            let state = self.get_block_state(neighbor);
            if !state.is_air() {
                get_behavior(state.get_block()).handle_neighbor_changed(state, self, neighbor, source);
            }
        }
    }

    /// Whether the block at `pos` fills its cell.
    #[must_use]
    pub fn is_solid(&self, pos: BlockPos) -> bool {
        self.get_block_state(pos).get_block().solid
    }

    // Redstone

    /// Turns a redstone source at `pos` on or off and notifies its neighbours.
    pub fn set_powered(&self, pos: BlockPos, powered: bool) {
        let changed = {
            let mut sources = self.powered.write();
            if powered {
                sources.insert(pos)
            } else {
                sources.remove(&pos)
            }
        };
        if changed {
            self.update_neighbors_at(pos, self.get_block_state(pos).get_block());
        }
    }

    /// Whether any neighbour of `pos` is a powered redstone source.
    #[must_use]
    pub fn has_neighbor_signal(&self, pos: BlockPos) -> bool {
        let sources = self.powered.read();
        Direction::ALL
            .into_iter()
            .any(|direction| sources.contains(&pos.relative(direction)))
    }

    // Block entities

    /// The block entity at `pos`. Removed block entities are never returned.
    #[must_use]
    pub fn get_block_entity(&self, pos: BlockPos) -> Option<SharedBlockEntity> {
        self.chunks
            .read()
            .get(&pos.chunk_pos())
            .and_then(|chunk| chunk.get_block_entity(pos))
            .cloned()
    }

    /// Attaches a block entity at its own position, replacing any other one there.
    pub fn add_block_entity(&self, block_entity: SharedBlockEntity) {
        let (pos, ticking) = {
            let mut guard = block_entity.lock();
            guard.clear_removed();
            guard.set_level(self);
            (guard.get_block_pos(), guard.is_ticking())
        };
        let replaced = {
            let mut chunks = self.chunks.write();
            let Some(chunk) = chunks.get_mut(&pos.chunk_pos()) else {
                log::warn!("Ignoring block entity at {pos} in an unloaded chunk");
                return;
            };
            chunk.add_block_entity(pos, block_entity.clone())
        };
        if let Some(replaced) = replaced {
            replaced.lock().set_removed();
        }
        if ticking {
            self.tickers.lock().push(block_entity);
        }
    }

    /// Runs `tick` on every ticking block entity once, in the order they were
    /// added. Block entities added meanwhile first tick on the next game tick.
    fn tick_block_entities(&self) {
        let current = mem::take(&mut *self.tickers.lock());
        let mut alive = Vec::with_capacity(current.len());
        for block_entity in current {
            {
                let mut guard = block_entity.lock();
                if guard.is_removed() {
                    continue;
                }
                guard.tick(self);
            }
            alive.push(block_entity);
        }
        let mut tickers = self.tickers.lock();
        let added = mem::take(&mut *tickers);
        alive.extend(added);
        *tickers = alive;
    }

    /// Drains the changed flags of all block entities. Each changed one marks its
    /// chunk unsaved and gets a client resync event; blocks with a comparator
    /// output report it when it moved.
    pub fn flush_changes(&self) {
        let block_entities: Vec<(BlockPos, SharedBlockEntity)> = {
            let chunks = self.chunks.read();
            let mut all: Vec<_> = chunks.values().flat_map(LevelChunk::block_entities).collect();
            all.sort_unstable_by_key(|(pos, _)| *pos);
            all
        };

        for (pos, block_entity) in block_entities {
            let (state, tag) = {
                let mut guard = block_entity.lock();
                if guard.is_removed() || !guard.take_changed() {
                    continue;
                }
                (guard.get_block_state(), guard.get_update_tag())
            };
            if let Some(chunk) = self.chunks.write().get_mut(&pos.chunk_pos()) {
                chunk.mark_unsaved();
            }
            self.emit(WorldEvent::BlockEntityChanged { pos, tag });

            let behavior = get_behavior(state.get_block());
            if behavior.has_analog_output_signal(state) {
                let signal = behavior.get_analog_output_signal(state, self, pos);
                let previous = self.analog_outputs.lock().insert(pos, signal).unwrap_or(0);
                if previous != signal {
                    self.emit(WorldEvent::AnalogOutputChanged { pos, signal });
                }
            }
        }
    }

    // Scheduled ticks

    /// Asks for `block`'s tick at `pos` after `delay` game ticks. A pending tick for
    /// the same block and position wins over this one.
    pub fn schedule_tick(&self, pos: BlockPos, block: BlockRef, delay: u32) -> bool {
        self.block_ticks
            .lock()
            .schedule_tick(pos, block, self.game_time(), delay)
    }

    /// Whether a tick is pending for `block` at `pos`.
    #[must_use]
    pub fn has_scheduled_tick(&self, pos: BlockPos, block: BlockRef) -> bool {
        self.block_ticks.lock().has_scheduled_tick(pos, block)
    }

    fn run_block_ticks(&self, game_time: u64) {
        let due = {
            let chunks = self.chunks.read();
            self.block_ticks.lock().tick(
                game_time,
                self.config.max_block_ticks_per_tick,
                |chunk| chunks.contains_key(chunk),
            )
        };
        for (pos, block) in due {
            let state = self.get_block_state(pos);
            if state.is(block) {
                get_behavior(block).tick(state, self, pos);
            }
        }
    }

    /// Advances the world by one game tick: scheduled block ticks, then block
    /// entities, then cleanup and change propagation.
    pub fn tick(&self) {
        let game_time = self.game_time.fetch_add(1, Ordering::Relaxed) + 1;
        self.run_block_ticks(game_time);
        self.tick_block_entities();
        self.entities.write().retain(|entity| entity.lock().is_alive());
        self.flush_changes();
    }

    // Item entities

    /// Spawns a loose item at `position`.
    pub fn spawn_item(&self, position: Vector3<f64>, item: ItemStack) -> Uuid {
        let entity = ItemEntity::new(position, item.clone());
        let id = entity.id();
        self.entities.write().push(Arc::new(SyncMutex::new(entity)));
        self.emit(WorldEvent::ItemDropped {
            id,
            pos: position,
            item,
        });
        id
    }

    /// Live item entities whose box overlaps `area`, oldest first.
    #[must_use]
    pub fn item_entities_in(&self, area: &AABB) -> Vec<SharedItemEntity> {
        self.entities
            .read()
            .iter()
            .filter(|entity| {
                let entity = entity.lock();
                entity.is_alive() && entity.bounding_box().intersects(area)
            })
            .cloned()
            .collect()
    }

    /// Number of live item entities.
    #[must_use]
    pub fn item_entity_count(&self) -> usize {
        self.entities
            .read()
            .iter()
            .filter(|entity| entity.lock().is_alive())
            .count()
    }

    /// Empties `container` into the world around `pos`, in randomly sized bunches.
    pub fn drop_contents(&self, pos: BlockPos, container: &mut dyn Container) {
        if !self.config.drop_contents_on_removal {
            return;
        }
        for slot in 0..container.get_container_size() {
            let mut stack = container.remove_item_no_update(slot);
            while !stack.is_empty() {
                let (bunch, position) = {
                    let mut random = self.random();
                    let size = random.next_i32_bounded(21) + 10;
                    let spread = 0.75;
                    let position = Vector3::new(
                        f64::from(pos.x()) + random.next_f64() * spread + 0.125,
                        f64::from(pos.y()) + random.next_f64() * spread,
                        f64::from(pos.z()) + random.next_f64() * spread + 0.125,
                    );
                    (stack.split(size), position)
                };
                self.spawn_item(position, bunch);
            }
        }
    }

    // Viewers

    /// Adds a viewer, replacing one with the same id.
    pub fn add_viewer(&self, viewer: Viewer) {
        self.viewers.write().insert(viewer.id, viewer);
    }

    /// Removes a viewer, closing what it had open.
    pub fn remove_viewer(&self, id: Uuid) -> Option<Viewer> {
        self.stop_open(id);
        self.viewers.write().remove(&id)
    }

    /// A copy of the viewer with `id`.
    #[must_use]
    pub fn viewer(&self, id: Uuid) -> Option<Viewer> {
        self.viewers.read().get(&id).cloned()
    }

    /// Changes a viewer in place.
    pub fn update_viewer(&self, id: Uuid, update: impl FnOnce(&mut Viewer)) -> bool {
        match self.viewers.write().get_mut(&id) {
            Some(viewer) => {
                update(viewer);
                true
            }
            None => false,
        }
    }

    /// Opens the container at `pos` for viewer `id`, closing whatever it had open
    /// before. Fails for unknown viewers, missing containers and locks the viewer
    /// can't open.
    pub fn start_open(&self, id: Uuid, pos: BlockPos) -> bool {
        let Some(viewer) = self.viewer(id) else {
            return false;
        };
        match viewer.open_container {
            Some(open) if open == pos => return true,
            Some(_) => {
                self.stop_open(id);
            }
            None => {}
        }
        let Some(block_entity) = self.get_block_entity(pos) else {
            return false;
        };

        let mut guard = block_entity.lock();
        if guard.as_container().is_none() {
            return false;
        }
        if let Some(lockable) = guard.as_lockable()
            && !lockable.can_unlock(&viewer)
        {
            self.emit(WorldEvent::Sound {
                pos,
                sound: SoundEvent::ChestLocked,
            });
            return false;
        }

        self.update_viewer(id, |viewer| viewer.open_container = Some(pos));
        if let Some(viewable) = guard.as_viewable_mut() {
            viewable.start_open(self, &viewer);
        }
        true
    }

    /// Closes whatever viewer `id` has open. Closing with nothing open is a no-op.
    pub fn stop_open(&self, id: Uuid) -> bool {
        let closed = {
            let mut viewers = self.viewers.write();
            viewers.get_mut(&id).and_then(|viewer| {
                let pos = viewer.open_container.take()?;
                Some((viewer.clone(), pos))
            })
        };
        let Some((viewer, pos)) = closed else {
            return false;
        };
        if let Some(block_entity) = self.get_block_entity(pos) {
            let mut guard = block_entity.lock();
            if let Some(viewable) = guard.as_viewable_mut() {
                viewable.stop_open(self, &viewer);
            }
        }
        true
    }

    /// Interaction ranges of the counted viewers that have the container at `pos`
    /// open and stand within `area`.
    #[must_use]
    pub fn container_viewer_ranges(&self, pos: BlockPos, area: &AABB) -> Vec<f64> {
        self.viewers
            .read()
            .values()
            .filter(|viewer| {
                !viewer.spectator
                    && viewer.has_open(pos)
                    && AABB::at_feet(viewer.position, 0.6, 1.8).intersects(area)
            })
            .map(|viewer| viewer.interaction_range)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use ingot_registry::blocks::BlockStateProperties;
    use ingot_registry::data_components::vanilla_components::CUSTOM_NAME;
    use ingot_registry::items::vanilla_items::{COAL, IRON_INGOT, RAW_IRON, STONE};
    use simdnbt::owned::{NbtCompound, NbtTag};

    use super::*;
    use crate::behavior::blocks::TRIGGER_DELAY;
    use crate::block_entity::entities::{
        FurnaceBlockEntity, HopperBlockEntity, LID_EVENT, SLOT_FUEL, SLOT_INPUT,
    };
    use crate::inventory::viewer_tracker::CHECK_TICK_DELAY;
    use crate::transfer::MOVE_ITEM_SPEED;

    fn loaded(world: World) -> World {
        assert!(world.load_chunk(ChunkPos::new(0, 0)));
        world
    }

    fn world() -> World {
        loaded(World::new(EngineConfig::default()))
    }

    fn place(world: &World, pos: BlockPos, state: BlockState) {
        assert!(world.set_block(pos, state, UpdateFlags::UPDATE_ALL));
    }

    fn hopper_facing(direction: Direction) -> BlockState {
        vanilla_blocks::HOPPER
            .default_state()
            .set_value(&BlockStateProperties::FACING_HOPPER, direction)
    }

    fn set_slot(world: &World, pos: BlockPos, slot: usize, stack: ItemStack) {
        let block_entity = world.get_block_entity(pos).expect("block entity");
        let mut guard = block_entity.lock();
        guard.as_container_mut().expect("container").set_item(slot, stack);
    }

    fn slot(world: &World, pos: BlockPos, slot: usize) -> ItemStack {
        let block_entity = world.get_block_entity(pos).expect("block entity");
        let guard = block_entity.lock();
        guard.as_container().expect("container").get_item(slot).clone()
    }

    fn total(world: &World, pos: BlockPos) -> i32 {
        let block_entity = world.get_block_entity(pos).expect("block entity");
        let guard = block_entity.lock();
        let container = guard.as_container().expect("container");
        (0..container.get_container_size())
            .map(|slot| container.get_item(slot).count())
            .sum()
    }

    fn with_hopper<R>(world: &World, pos: BlockPos, read: impl FnOnce(&HopperBlockEntity) -> R) -> R {
        let block_entity = world.get_block_entity(pos).expect("block entity");
        let guard = block_entity.lock();
        read(guard.as_any().downcast_ref::<HopperBlockEntity>().expect("hopper"))
    }

    fn hopper_cooldown(world: &World, pos: BlockPos) -> i32 {
        with_hopper(world, pos, HopperBlockEntity::cooldown)
    }

    fn opener_count(world: &World, pos: BlockPos) -> i32 {
        let block_entity = world.get_block_entity(pos).expect("block entity");
        let mut guard = block_entity.lock();
        guard.as_viewable_mut().expect("viewable").opener_count()
    }

    fn changed_at(events: &[WorldEvent], at: BlockPos) -> usize {
        events
            .iter()
            .filter(|event| matches!(event, WorldEvent::BlockEntityChanged { pos, .. } if *pos == at))
            .count()
    }

    fn has_sound(events: &[WorldEvent], expected: SoundEvent) -> bool {
        events
            .iter()
            .any(|event| matches!(event, WorldEvent::Sound { sound, .. } if *sound == expected))
    }

    /// Ticks `world` and returns the events of that tick.
    fn tick(world: &World) -> Vec<WorldEvent> {
        world.tick();
        world.drain_events()
    }

    #[test]
    fn test_hopper_between_two_containers() {
        let world = world();
        let (above, hopper, below) = (
            BlockPos::new(1, 66, 1),
            BlockPos::new(1, 65, 1),
            BlockPos::new(1, 64, 1),
        );
        place(&world, above, vanilla_blocks::CHEST.default_state());
        place(&world, hopper, vanilla_blocks::HOPPER.default_state());
        place(&world, below, vanilla_blocks::CHEST.default_state());
        set_slot(&world, above, 0, ItemStack::with_count(&STONE, 5));
        set_slot(&world, hopper, 0, ItemStack::new(&STONE));
        world.flush_changes();
        world.drain_events();

        let events = tick(&world);
        assert_eq!(slot(&world, above, 0).count(), 4);
        assert_eq!(slot(&world, below, 0).count(), 1);
        assert_eq!(total(&world, hopper), 1);
        assert_eq!(hopper_cooldown(&world, hopper), MOVE_ITEM_SPEED);
        assert_eq!(changed_at(&events, above), 1);
        assert_eq!(changed_at(&events, below), 1);

        // Cooling down: nothing moves for the next seven ticks
        for _ in 0..7 {
            tick(&world);
        }
        assert_eq!(slot(&world, above, 0).count(), 4);
        tick(&world);
        assert_eq!(slot(&world, above, 0).count(), 3);
        assert_eq!(slot(&world, below, 0).count(), 2);
    }

    #[test]
    fn test_items_move_one_hop_per_tick() {
        let world = world();
        let (top, middle, bottom) = (
            BlockPos::new(2, 66, 2),
            BlockPos::new(2, 65, 2),
            BlockPos::new(2, 64, 2),
        );
        for pos in [top, middle, bottom] {
            place(&world, pos, vanilla_blocks::HOPPER.default_state());
        }
        set_slot(&world, top, 0, ItemStack::new(&STONE));
        set_slot(&world, middle, 0, ItemStack::new(&COAL));

        tick(&world);
        assert_eq!(total(&world, top), 0);
        assert_eq!(total(&world, middle), 1);
        assert_eq!(slot(&world, middle, 1).item(), &STONE);
        assert_eq!(total(&world, bottom), 1);
        assert_eq!(slot(&world, bottom, 0).item(), &COAL);
        // Filled before its own tick, the bottom hopper already spent one tick waiting
        assert_eq!(hopper_cooldown(&world, bottom), MOVE_ITEM_SPEED - 1);
    }

    #[test]
    fn test_hopper_filled_after_its_tick_waits_one_less() {
        let world = world();
        let (west, east) = (BlockPos::new(3, 64, 3), BlockPos::new(4, 64, 3));
        // The east hopper ticks first, then receives from the west one
        place(&world, east, vanilla_blocks::HOPPER.default_state());
        place(&world, west, hopper_facing(Direction::East));
        set_slot(&world, west, 0, ItemStack::new(&STONE));

        tick(&world);
        assert_eq!(total(&world, east), 1);
        assert_eq!(hopper_cooldown(&world, east), MOVE_ITEM_SPEED - 1);
        assert_eq!(hopper_cooldown(&world, west), MOVE_ITEM_SPEED);

        // Ready one tick before the hopper that fed it
        for _ in 0..MOVE_ITEM_SPEED - 1 {
            tick(&world);
        }
        assert_eq!(hopper_cooldown(&world, east), 0);
    }

    #[test]
    fn test_powered_hopper_is_disabled() {
        let world = world();
        let (chest, hopper, lever) = (
            BlockPos::new(5, 65, 5),
            BlockPos::new(5, 64, 5),
            BlockPos::new(6, 64, 5),
        );
        place(&world, chest, vanilla_blocks::CHEST.default_state());
        place(&world, hopper, vanilla_blocks::HOPPER.default_state());
        set_slot(&world, chest, 0, ItemStack::with_count(&STONE, 10));

        world.set_powered(lever, true);
        assert!(!world.get_block_state(hopper).get_value(&BlockStateProperties::ENABLED));
        for _ in 0..3 {
            tick(&world);
        }
        assert_eq!(total(&world, chest), 10);

        world.set_powered(lever, false);
        assert!(world.get_block_state(hopper).get_value(&BlockStateProperties::ENABLED));
        tick(&world);
        assert_eq!(total(&world, chest), 9);
        assert_eq!(total(&world, hopper), 1);
    }

    #[test]
    fn test_hopper_picks_up_items() {
        let world = world();
        let hopper = BlockPos::new(7, 64, 7);
        place(&world, hopper, vanilla_blocks::HOPPER.default_state());
        world.spawn_item(Vector3::new(7.5, 65.0, 7.5), ItemStack::with_count(&STONE, 3));
        assert_eq!(world.item_entity_count(), 1);

        tick(&world);
        assert_eq!(total(&world, hopper), 3);
        assert_eq!(world.item_entity_count(), 0);
    }

    #[test]
    fn test_solid_block_stops_pickup() {
        let world = world();
        let hopper = BlockPos::new(7, 64, 9);
        place(&world, hopper, vanilla_blocks::HOPPER.default_state());
        place(&world, hopper.above(), vanilla_blocks::STONE.default_state());
        world.spawn_item(Vector3::new(7.5, 65.5, 9.5), ItemStack::new(&STONE));

        tick(&world);
        assert_eq!(total(&world, hopper), 0);
        assert_eq!(world.item_entity_count(), 1);
    }

    #[test]
    fn test_furnace_faces_through_hoppers() {
        let recipes = SmeltingTable::new()
            .with_recipe(&RAW_IRON, ItemStack::new(&IRON_INGOT), 200)
            .with_fuel(&COAL, 1600);
        let world = loaded(World::with_recipes(EngineConfig::default(), Arc::new(recipes)));
        let furnace = BlockPos::new(8, 64, 8);
        let side = BlockPos::new(9, 64, 8);
        place(&world, furnace, vanilla_blocks::FURNACE.default_state());
        place(&world, side, hopper_facing(Direction::West));
        set_slot(&world, side, 0, ItemStack::new(&RAW_IRON));
        set_slot(&world, side, 1, ItemStack::new(&COAL));

        tick(&world);
        // The side only reaches the fuel slot, which refuses ore
        assert!(slot(&world, furnace, SLOT_INPUT).is_empty());
        assert_eq!(slot(&world, furnace, SLOT_FUEL).item(), &COAL);
        assert_eq!(slot(&world, side, 0).item(), &RAW_IRON);

        let block_entity = world.get_block_entity(furnace).expect("furnace");
        let guard = block_entity.lock();
        let furnace = guard
            .as_any()
            .downcast_ref::<FurnaceBlockEntity>()
            .expect("furnace");
        assert!(!furnace.is_lit());
    }

    #[test]
    fn test_viewers_open_and_close_chest() {
        let world = world();
        let chest = BlockPos::new(4, 64, 4);
        place(&world, chest, vanilla_blocks::CHEST.default_state());
        world.drain_events();

        let id = Uuid::new_v4();
        world.add_viewer(Viewer::new(id, Vector3::new(4.5, 64.0, 6.0)));
        assert!(world.start_open(id, chest));
        assert!(world.start_open(id, chest));
        assert_eq!(opener_count(&world, chest), 1);

        let events = world.drain_events();
        assert!(has_sound(&events, SoundEvent::ChestOpen));
        assert!(events.iter().any(|event| matches!(
            event,
            WorldEvent::BlockEvent { id, param: 1, .. } if *id == LID_EVENT
        )));
        assert!(events.iter().any(|event| matches!(
            event,
            WorldEvent::ContainerOpened { viewer: Some(viewer), .. } if *viewer == id
        )));

        assert!(world.remove_viewer(id).is_some());
        assert_eq!(opener_count(&world, chest), 0);
        assert!(has_sound(&world.drain_events(), SoundEvent::ChestClose));
        assert!(!world.stop_open(id));
    }

    #[test]
    fn test_reconcile_fixes_lost_viewers() {
        let world = world();
        let chest = BlockPos::new(4, 64, 10);
        place(&world, chest, vanilla_blocks::CHEST.default_state());

        let id = Uuid::new_v4();
        world.add_viewer(Viewer::new(id, Vector3::new(4.5, 64.0, 11.5)));
        assert!(world.start_open(id, chest));
        // The viewer goes away without closing
        assert!(world.update_viewer(id, |viewer| viewer.open_container = None));
        assert!(!world.stop_open(id));
        assert_eq!(opener_count(&world, chest), 1);
        world.drain_events();

        let mut events = Vec::new();
        for _ in 0..CHECK_TICK_DELAY {
            events.extend(tick(&world));
        }
        assert_eq!(opener_count(&world, chest), 0);
        let closes = events
            .iter()
            .filter(|event| matches!(event, WorldEvent::ContainerClosed { viewer: None, .. }))
            .count();
        assert_eq!(closes, 1);

        // Already closed: nothing more happens and the count stays at zero
        for _ in 0..CHECK_TICK_DELAY {
            events.extend(tick(&world));
        }
        assert_eq!(opener_count(&world, chest), 0);
        assert!(!world.has_scheduled_tick(chest, &vanilla_blocks::CHEST));
    }

    #[test]
    fn test_spectators_are_not_counted() {
        let world = world();
        let chest = BlockPos::new(12, 64, 4);
        place(&world, chest, vanilla_blocks::CHEST.default_state());

        let id = Uuid::new_v4();
        let mut viewer = Viewer::new(id, Vector3::new(12.5, 64.0, 5.5));
        viewer.spectator = true;
        world.add_viewer(viewer);
        assert!(world.start_open(id, chest));
        assert_eq!(opener_count(&world, chest), 0);
        assert!(world.stop_open(id));
        assert_eq!(opener_count(&world, chest), 0);
    }

    #[test]
    fn test_barrel_opens_block_state() {
        let world = world();
        let barrel = BlockPos::new(6, 64, 12);
        place(&world, barrel, vanilla_blocks::BARREL.default_state());
        world.drain_events();

        let id = Uuid::new_v4();
        world.add_viewer(Viewer::new(id, Vector3::new(6.5, 64.0, 13.5)));
        assert!(world.start_open(id, barrel));
        assert!(world.get_block_state(barrel).get_value(&BlockStateProperties::OPEN));
        assert!(has_sound(&world.drain_events(), SoundEvent::BarrelOpen));

        assert!(world.stop_open(id));
        assert!(!world.get_block_state(barrel).get_value(&BlockStateProperties::OPEN));
        assert!(has_sound(&world.drain_events(), SoundEvent::BarrelClose));
    }

    #[test]
    fn test_locked_chest_needs_named_key() {
        let world = world();
        let chest = BlockPos::new(10, 64, 4);
        place(&world, chest, vanilla_blocks::CHEST.default_state());
        {
            let block_entity = world.get_block_entity(chest).expect("chest");
            let mut nbt = NbtCompound::new();
            nbt.insert("lock", NbtTag::String("secret".to_string().into()));
            block_entity.lock().load_additional(&nbt);
        }
        world.drain_events();

        let id = Uuid::new_v4();
        world.add_viewer(Viewer::new(id, Vector3::new(10.5, 64.0, 5.5)));
        assert!(!world.start_open(id, chest));
        assert!(has_sound(&world.drain_events(), SoundEvent::ChestLocked));
        assert_eq!(opener_count(&world, chest), 0);

        let mut key = ItemStack::new(&STONE);
        key.set(&CUSTOM_NAME, "secret".to_string());
        assert!(world.update_viewer(id, |viewer| viewer.held_item = key));
        assert!(world.start_open(id, chest));
        assert_eq!(opener_count(&world, chest), 1);
    }

    #[test]
    fn test_breaking_container_drops_contents() {
        let world = world();
        let chest = BlockPos::new(3, 64, 12);
        place(&world, chest, vanilla_blocks::CHEST.default_state());
        set_slot(&world, chest, 0, ItemStack::with_count(&STONE, 64));
        set_slot(&world, chest, 5, ItemStack::with_count(&STONE, 36));
        let handle = world.get_block_entity(chest).expect("chest");

        place(&world, chest, vanilla_blocks::AIR.default_state());
        assert!(handle.lock().is_removed());
        assert!(world.get_block_entity(chest).is_none());

        let area = chest.bounding_box().inflate(1.0);
        let dropped = world.item_entities_in(&area);
        assert!(dropped.len() >= 4);
        let count: i32 = dropped.iter().map(|entity| entity.lock().item().count()).sum();
        assert_eq!(count, 100);
        assert!(
            dropped
                .iter()
                .all(|entity| (1..=30).contains(&entity.lock().item().count()))
        );
    }

    #[test]
    fn test_drops_can_be_disabled() {
        let config = EngineConfig {
            drop_contents_on_removal: false,
            ..EngineConfig::default()
        };
        let world = loaded(World::new(config));
        let chest = BlockPos::new(3, 64, 14);
        place(&world, chest, vanilla_blocks::CHEST.default_state());
        set_slot(&world, chest, 0, ItemStack::with_count(&STONE, 64));
        place(&world, chest, vanilla_blocks::AIR.default_state());
        assert_eq!(world.item_entity_count(), 0);
    }

    #[test]
    fn test_analog_output_reported_on_change() {
        let world = world();
        let chest = BlockPos::new(14, 64, 14);
        place(&world, chest, vanilla_blocks::CHEST.default_state());
        set_slot(&world, chest, 0, ItemStack::with_count(&STONE, 64));

        world.flush_changes();
        let events = world.drain_events();
        assert!(events.iter().any(|event| matches!(
            event,
            WorldEvent::AnalogOutputChanged { pos, signal: 1 } if *pos == chest
        )));

        world.flush_changes();
        assert!(world.drain_events().is_empty());

        for slot in 0..27 {
            set_slot(&world, chest, slot, ItemStack::with_count(&STONE, 64));
        }
        world.flush_changes();
        assert!(world.drain_events().iter().any(|event| matches!(
            event,
            WorldEvent::AnalogOutputChanged { signal: 15, .. }
        )));
    }

    #[test]
    fn test_dropper_pushes_into_container_on_pulse() {
        let world = world();
        let (dropper, pot, lever) = (
            BlockPos::new(10, 64, 10),
            BlockPos::new(11, 64, 10),
            BlockPos::new(10, 64, 9),
        );
        let state = vanilla_blocks::DROPPER
            .default_state()
            .set_value(&BlockStateProperties::FACING, Direction::East);
        place(&world, dropper, state);
        place(&world, pot, vanilla_blocks::DECORATED_POT.default_state());
        set_slot(&world, dropper, 0, ItemStack::with_count(&STONE, 2));

        world.set_powered(lever, true);
        assert!(world.get_block_state(dropper).get_value(&BlockStateProperties::TRIGGERED));
        assert!(world.has_scheduled_tick(dropper, &vanilla_blocks::DROPPER));

        for _ in 1..TRIGGER_DELAY {
            tick(&world);
        }
        assert_eq!(total(&world, pot), 0);
        tick(&world);
        assert_eq!(total(&world, pot), 1);
        assert_eq!(total(&world, dropper), 1);

        // Staying powered doesn't fire again
        for _ in 0..TRIGGER_DELAY {
            tick(&world);
        }
        assert_eq!(total(&world, dropper), 1);

        world.set_powered(lever, false);
        assert!(!world.get_block_state(dropper).get_value(&BlockStateProperties::TRIGGERED));
    }

    #[test]
    fn test_dropper_spawns_item_without_container() {
        let world = world();
        let (dropper, lever) = (BlockPos::new(12, 64, 12), BlockPos::new(12, 65, 12));
        let state = vanilla_blocks::DROPPER
            .default_state()
            .set_value(&BlockStateProperties::FACING, Direction::West);
        place(&world, dropper, state);
        set_slot(&world, dropper, 4, ItemStack::new(&STONE));

        world.set_powered(lever, true);
        let mut events = Vec::new();
        for _ in 0..TRIGGER_DELAY {
            events.extend(tick(&world));
        }
        assert_eq!(total(&world, dropper), 0);
        assert_eq!(world.item_entity_count(), 1);
        assert!(has_sound(&events, SoundEvent::DispenserDispense));

        // Empty now: the next pulse fails
        world.set_powered(lever, false);
        world.set_powered(lever, true);
        let mut events = Vec::new();
        for _ in 0..TRIGGER_DELAY {
            events.extend(tick(&world));
        }
        assert!(has_sound(&events, SoundEvent::DispenserFail));
    }

    #[test]
    fn test_chunk_unload_round_trip() {
        let world = world();
        let hopper = BlockPos::new(1, 64, 14);
        let dropper = BlockPos::new(2, 64, 14);
        place(&world, hopper, hopper_facing(Direction::North));
        place(&world, dropper, vanilla_blocks::DROPPER.default_state());
        set_slot(&world, hopper, 2, ItemStack::with_count(&COAL, 7));
        assert!(world.schedule_tick(dropper, &vanilla_blocks::DROPPER, 20));
        let old = world.get_block_entity(hopper).expect("hopper");

        assert!(world.unload_chunk(ChunkPos::new(0, 0)));
        assert!(!world.unload_chunk(ChunkPos::new(0, 0)));
        assert!(old.lock().is_removed());
        assert!(world.get_block_entity(hopper).is_none());
        assert!(world.get_block_state(hopper).is_air());
        assert!(!world.has_scheduled_tick(dropper, &vanilla_blocks::DROPPER));

        assert!(world.load_chunk(ChunkPos::new(0, 0)));
        assert_eq!(world.get_block_state(hopper), hopper_facing(Direction::North));
        assert_eq!(slot(&world, hopper, 2).count(), 7);
        assert!(world.has_scheduled_tick(dropper, &vanilla_blocks::DROPPER));

        // The reloaded hopper ticks, the detached one doesn't
        tick(&world);
        assert_eq!(with_hopper(&world, hopper, HopperBlockEntity::last_ticked), 1);
        let guard = old.lock();
        let detached = guard.as_any().downcast_ref::<HopperBlockEntity>().expect("hopper");
        assert_eq!(detached.last_ticked(), 0);
    }

    #[test]
    fn test_unloaded_chunks_ignore_changes() {
        let world = World::new(EngineConfig::default());
        let pos = BlockPos::new(40, 64, 40);
        assert!(!world.set_block(pos, vanilla_blocks::CHEST.default_state(), UpdateFlags::UPDATE_ALL));
        assert!(world.get_block_state(pos).is_air());
        assert!(world.get_block_entity(pos).is_none());
    }
}
