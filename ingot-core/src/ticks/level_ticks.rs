//! World-level scheduled tick coordinator.

use std::collections::BinaryHeap;
use std::hash::Hash;

use ingot_utils::{BlockPos, ChunkPos};
use rustc_hash::FxHashMap;

use super::{LevelChunkTicks, SavedTick, ScheduledTick, TickPriority};

/// Scheduled ticks of every loaded chunk.
///
/// - Each loaded chunk has a `LevelChunkTicks` stored in `all_containers`
/// - `next_tick_for_container` tracks the earliest trigger tick per chunk
///   so chunks without due ticks are skipped
/// - `tick()` merges the due ticks of all chunks into one global order
pub struct LevelTicks<T: Copy + Eq + Hash> {
    all_containers: FxHashMap<ChunkPos, LevelChunkTicks<T>>,
    next_tick_for_container: FxHashMap<ChunkPos, u64>,
    sub_tick_counter: u64,
}

impl<T: Copy + Eq + Hash> LevelTicks<T> {
    /// Creates a new empty world tick coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            all_containers: FxHashMap::default(),
            next_tick_for_container: FxHashMap::default(),
            sub_tick_counter: 0,
        }
    }

    /// Adds a chunk's tick container when the chunk is loaded.
    pub fn add_container(&mut self, pos: ChunkPos, container: LevelChunkTicks<T>) {
        if let Some(next_tick) = container.peek() {
            self.next_tick_for_container
                .insert(pos, next_tick.trigger_tick);
        }
        self.all_containers.insert(pos, container);
    }

    /// Adds a chunk's container rebuilt from persisted ticks. Delays count from
    /// `current_tick`, and each tick gets a fresh sub-tick order in saved order.
    pub fn add_saved_container(&mut self, pos: ChunkPos, saved: Vec<SavedTick<T>>, current_tick: u64) {
        let mut container = LevelChunkTicks::new();
        for tick in saved {
            let sub_tick_order = self.next_sub_tick();
            container.schedule(ScheduledTick::with_priority(
                tick.tick_type,
                tick.pos,
                current_tick + u64::from(tick.delay),
                tick.priority,
                sub_tick_order,
            ));
        }
        self.add_container(pos, container);
    }

    /// Removes a chunk's tick container when the chunk is unloaded.
    ///
    /// Returns the container so it can be saved.
    pub fn remove_container(&mut self, pos: &ChunkPos) -> Option<LevelChunkTicks<T>> {
        self.next_tick_for_container.remove(pos);
        self.all_containers.remove(pos)
    }

    /// The container of a loaded chunk.
    #[must_use]
    pub fn container(&self, pos: &ChunkPos) -> Option<&LevelChunkTicks<T>> {
        self.all_containers.get(pos)
    }

    fn next_sub_tick(&mut self) -> u64 {
        let order = self.sub_tick_counter;
        self.sub_tick_counter += 1;
        order
    }

    /// Schedules a tick at `current_tick + delay`.
    ///
    /// Returns `false` if the chunk isn't loaded or the (pos, type) pair already
    /// has a pending tick.
    pub fn schedule(
        &mut self,
        pos: BlockPos,
        tick_type: T,
        current_tick: u64,
        delay: u32,
        priority: TickPriority,
    ) -> bool {
        let chunk_pos = pos.chunk_pos();
        let trigger_tick = current_tick + u64::from(delay);

        if !self.all_containers.contains_key(&chunk_pos) {
            log::warn!("Attempted to schedule tick in unloaded chunk {chunk_pos:?}");
            return false;
        }

        let sub_tick_order = self.next_sub_tick();
        let tick =
            ScheduledTick::with_priority(tick_type, pos, trigger_tick, priority, sub_tick_order);

        let Some(container) = self.all_containers.get_mut(&chunk_pos) else {
            return false;
        };
        if !container.schedule(tick) {
            return false;
        }

        self.next_tick_for_container
            .entry(chunk_pos)
            .and_modify(|earliest| {
                if trigger_tick < *earliest {
                    *earliest = trigger_tick;
                }
            })
            .or_insert(trigger_tick);
        true
    }

    /// Schedules a tick with normal priority.
    pub fn schedule_tick(
        &mut self,
        pos: BlockPos,
        tick_type: T,
        current_tick: u64,
        delay: u32,
    ) -> bool {
        self.schedule(pos, tick_type, current_tick, delay, TickPriority::Normal)
    }

    /// Checks if a tick is already scheduled for the given position and type.
    #[must_use]
    pub fn has_scheduled_tick(&self, pos: BlockPos, tick_type: T) -> bool {
        self.all_containers
            .get(&pos.chunk_pos())
            .is_some_and(|c| c.has_scheduled_tick(pos, tick_type))
    }

    /// Removes and returns every tick due at or before `current_tick`, in global
    /// (trigger tick, priority, sub-tick order) order, up to `max_ticks`.
    ///
    /// Chunks rejected by `can_tick_chunk` keep their ticks.
    #[must_use]
    pub fn tick<F>(
        &mut self,
        current_tick: u64,
        max_ticks: usize,
        can_tick_chunk: F,
    ) -> Vec<(BlockPos, T)>
    where
        F: Fn(&ChunkPos) -> bool,
    {
        let mut chunks_to_tick: Vec<ChunkPos> = self
            .next_tick_for_container
            .iter()
            .filter(|(pos, earliest)| **earliest <= current_tick && can_tick_chunk(pos))
            .map(|(pos, _)| *pos)
            .collect();
        chunks_to_tick.sort_unstable();

        let mut result = Vec::new();

        // Merge the chunk queues through one heap holding each chunk's head
        let mut merged_heap: BinaryHeap<(ScheduledTick<T>, ChunkPos)> = BinaryHeap::new();
        for chunk_pos in &chunks_to_tick {
            if let Some(container) = self.all_containers.get(chunk_pos)
                && let Some(tick) = container.peek()
                && tick.trigger_tick <= current_tick
            {
                merged_heap.push((tick.clone(), *chunk_pos));
            }
        }

        while result.len() < max_ticks {
            let Some((_, chunk_pos)) = merged_heap.pop() else {
                break;
            };
            let Some(container) = self.all_containers.get_mut(&chunk_pos) else {
                continue;
            };
            let Some(tick) = container.poll() else {
                continue;
            };
            result.push((tick.pos, tick.tick_type));

            if let Some(next) = container.peek()
                && next.trigger_tick <= current_tick
            {
                merged_heap.push((next.clone(), chunk_pos));
            }
        }

        for chunk_pos in chunks_to_tick {
            if let Some(container) = self.all_containers.get(&chunk_pos) {
                if let Some(next) = container.peek() {
                    self.next_tick_for_container
                        .insert(chunk_pos, next.trigger_tick);
                } else {
                    self.next_tick_for_container.remove(&chunk_pos);
                }
            }
        }

        result
    }

    /// Returns the total number of scheduled ticks across all chunks.
    #[must_use]
    pub fn count(&self) -> usize {
        self.all_containers
            .values()
            .map(LevelChunkTicks::count)
            .sum()
    }
}

impl<T: Copy + Eq + Hash> Default for LevelTicks<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_and_tick() {
        let mut level_ticks: LevelTicks<u32> = LevelTicks::new();
        level_ticks.add_container(ChunkPos::new(0, 0), LevelChunkTicks::new());

        let pos1 = BlockPos::new(5, 64, 5);
        let pos2 = BlockPos::new(10, 64, 10);

        level_ticks.schedule_tick(pos1, 1, 100, 10);
        level_ticks.schedule_tick(pos2, 2, 100, 5);
        assert_eq!(level_ticks.count(), 2);

        assert!(level_ticks.tick(104, 100, |_| true).is_empty());

        let fired = level_ticks.tick(105, 100, |_| true);
        assert_eq!(fired, vec![(pos2, 2)]);

        let fired = level_ticks.tick(110, 100, |_| true);
        assert_eq!(fired, vec![(pos1, 1)]);

        assert_eq!(level_ticks.count(), 0);
    }

    #[test]
    fn test_deduplication() {
        let mut level_ticks: LevelTicks<u32> = LevelTicks::new();
        level_ticks.add_container(ChunkPos::new(0, 0), LevelChunkTicks::new());

        let pos = BlockPos::new(5, 64, 5);
        assert!(level_ticks.schedule_tick(pos, 1, 100, 10));
        assert!(!level_ticks.schedule_tick(pos, 1, 100, 20));
        assert_eq!(level_ticks.count(), 1);

        // Fires at 110 (first scheduled), not 120
        assert_eq!(level_ticks.tick(110, 100, |_| true).len(), 1);
        assert!(level_ticks.tick(120, 100, |_| true).is_empty());
    }

    #[test]
    fn test_unloaded_chunk_rejects() {
        let mut level_ticks: LevelTicks<u32> = LevelTicks::new();
        assert!(!level_ticks.schedule_tick(BlockPos::new(100, 0, 100), 1, 0, 1));
    }

    #[test]
    fn test_merge_across_chunks_and_cap() {
        let mut level_ticks: LevelTicks<u32> = LevelTicks::new();
        level_ticks.add_container(ChunkPos::new(0, 0), LevelChunkTicks::new());
        level_ticks.add_container(ChunkPos::new(1, 0), LevelChunkTicks::new());

        let a = BlockPos::new(1, 0, 1);
        let b = BlockPos::new(17, 0, 1);
        let c = BlockPos::new(2, 0, 1);
        level_ticks.schedule_tick(a, 1, 0, 3);
        level_ticks.schedule_tick(b, 2, 0, 1);
        level_ticks.schedule_tick(c, 3, 0, 2);

        let fired = level_ticks.tick(5, 2, |_| true);
        assert_eq!(fired, vec![(b, 2), (c, 3)]);
        let fired = level_ticks.tick(5, 2, |_| true);
        assert_eq!(fired, vec![(a, 1)]);
    }

    #[test]
    fn test_saved_container_round_trip() {
        let mut level_ticks: LevelTicks<u32> = LevelTicks::new();
        let chunk = ChunkPos::new(0, 0);
        level_ticks.add_container(chunk, LevelChunkTicks::new());
        level_ticks.schedule_tick(BlockPos::new(1, 1, 1), 7, 50, 4);

        let saved = level_ticks
            .remove_container(&chunk)
            .expect("container was added")
            .to_saved(52);
        assert_eq!(saved[0].delay, 2);

        // Reloaded much later, the delay counts from the load time
        level_ticks.add_saved_container(chunk, saved, 1000);
        assert!(level_ticks.tick(1001, 10, |_| true).is_empty());
        assert_eq!(level_ticks.tick(1002, 10, |_| true).len(), 1);
    }
}
