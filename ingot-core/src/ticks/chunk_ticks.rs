//! Per-chunk scheduled tick storage.

use std::collections::BinaryHeap;
use std::hash::Hash;
use std::mem;

use ingot_utils::BlockPos;
use rustc_hash::FxHashSet;

use super::{SavedTick, ScheduledTick, TickKey};

/// Scheduled ticks of a single chunk.
///
/// When a tick is scheduled for a position that already has a pending tick of the
/// same type, the new tick is ignored and the existing one keeps its timing.
pub struct LevelChunkTicks<T: Copy + Eq + Hash> {
    /// Priority queue of scheduled ticks, ordered by trigger time.
    tick_queue: BinaryHeap<ScheduledTick<T>>,
    /// (pos, type) pairs that already have a pending tick.
    ticks_per_position: FxHashSet<TickKey<T>>,
}

impl<T: Copy + Eq + Hash> LevelChunkTicks<T> {
    /// Creates a new empty chunk tick container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick_queue: BinaryHeap::new(),
            ticks_per_position: FxHashSet::default(),
        }
    }

    /// Schedules a tick if one isn't already scheduled for this (pos, type).
    ///
    /// Returns `true` if the tick was scheduled, `false` if one already exists.
    pub fn schedule(&mut self, tick: ScheduledTick<T>) -> bool {
        let key = TickKey::from(&tick);
        if self.ticks_per_position.insert(key) {
            self.tick_queue.push(tick);
            true
        } else {
            false
        }
    }

    /// Returns a reference to the next tick to fire, without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&ScheduledTick<T>> {
        self.tick_queue.peek()
    }

    /// Removes and returns the next tick to fire.
    pub fn poll(&mut self) -> Option<ScheduledTick<T>> {
        let tick = self.tick_queue.pop()?;
        self.ticks_per_position.remove(&TickKey::from(&tick));
        Some(tick)
    }

    /// Checks if a tick is scheduled for the given position and type.
    pub fn has_scheduled_tick(&self, pos: BlockPos, tick_type: T) -> bool {
        self.ticks_per_position
            .contains(&TickKey { pos, tick_type })
    }

    /// Returns the number of scheduled ticks in this chunk.
    #[must_use]
    pub fn count(&self) -> usize {
        self.tick_queue.len()
    }

    /// Returns `true` if there are no scheduled ticks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tick_queue.is_empty()
    }

    /// Removes all ticks matching the predicate.
    pub fn remove_if<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&ScheduledTick<T>) -> bool,
    {
        let old_queue = mem::take(&mut self.tick_queue);
        for tick in old_queue {
            if predicate(&tick) {
                self.ticks_per_position.remove(&TickKey::from(&tick));
            } else {
                self.tick_queue.push(tick);
            }
        }
    }

    /// Returns an iterator over all scheduled ticks in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledTick<T>> {
        self.tick_queue.iter()
    }

    /// Detaches the pending ticks from game time, in firing order.
    #[must_use]
    pub fn to_saved(&self, game_time: u64) -> Vec<SavedTick<T>> {
        let mut ticks: Vec<&ScheduledTick<T>> = self.tick_queue.iter().collect();
        // Greater runs first.
        ticks.sort_by(|a, b| b.cmp(a));
        ticks
            .into_iter()
            .map(|tick| SavedTick {
                tick_type: tick.tick_type,
                pos: tick.pos,
                delay: u32::try_from(tick.trigger_tick.saturating_sub(game_time))
                    .unwrap_or(u32::MAX),
                priority: tick.priority,
            })
            .collect()
    }
}

impl<T: Copy + Eq + Hash> Default for LevelChunkTicks<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticks::TickPriority;

    #[test]
    fn test_schedule_and_poll() {
        let mut ticks: LevelChunkTicks<u32> = LevelChunkTicks::new();
        let pos = BlockPos::new(10, 64, 20);

        assert!(ticks.schedule(ScheduledTick::new(1, pos, 100, 0)));
        assert_eq!(ticks.count(), 1);

        // Same pos+type again is ignored
        assert!(!ticks.schedule(ScheduledTick::new(1, pos, 200, 1)));
        assert_eq!(ticks.count(), 1);

        let polled = ticks.poll().expect("should have a tick");
        assert_eq!(polled.trigger_tick, 100);
        assert_eq!(ticks.count(), 0);

        assert!(ticks.schedule(ScheduledTick::new(1, pos, 300, 2)));
        assert_eq!(ticks.count(), 1);
    }

    #[test]
    fn test_ordering() {
        let mut ticks: LevelChunkTicks<u32> = LevelChunkTicks::new();

        ticks.schedule(ScheduledTick::new(1, BlockPos::new(0, 0, 0), 200, 0));
        ticks.schedule(ScheduledTick::new(2, BlockPos::new(1, 0, 0), 100, 1));
        ticks.schedule(ScheduledTick::new(3, BlockPos::new(2, 0, 0), 150, 2));

        assert_eq!(ticks.poll().expect("first").trigger_tick, 100);
        assert_eq!(ticks.poll().expect("second").trigger_tick, 150);
        assert_eq!(ticks.poll().expect("third").trigger_tick, 200);
    }

    #[test]
    fn test_priority_ordering() {
        let mut ticks: LevelChunkTicks<u32> = LevelChunkTicks::new();

        ticks.schedule(ScheduledTick::with_priority(
            1,
            BlockPos::new(0, 0, 0),
            100,
            TickPriority::Low,
            0,
        ));
        ticks.schedule(ScheduledTick::with_priority(
            2,
            BlockPos::new(1, 0, 0),
            100,
            TickPriority::High,
            1,
        ));
        ticks.schedule(ScheduledTick::with_priority(
            3,
            BlockPos::new(2, 0, 0),
            100,
            TickPriority::Normal,
            2,
        ));

        assert_eq!(ticks.poll().expect("high").priority, TickPriority::High);
        assert_eq!(ticks.poll().expect("normal").priority, TickPriority::Normal);
        assert_eq!(ticks.poll().expect("low").priority, TickPriority::Low);
    }

    #[test]
    fn test_to_saved_is_relative() {
        let mut ticks: LevelChunkTicks<u32> = LevelChunkTicks::new();
        ticks.schedule(ScheduledTick::new(1, BlockPos::new(0, 0, 0), 105, 0));
        ticks.schedule(ScheduledTick::new(2, BlockPos::new(1, 0, 0), 98, 1));

        let saved = ticks.to_saved(100);
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].tick_type, 2);
        assert_eq!(saved[0].delay, 0, "overdue ticks save as due now");
        assert_eq!(saved[1].delay, 5);
    }

    #[test]
    fn test_remove_if() {
        let mut ticks: LevelChunkTicks<u32> = LevelChunkTicks::new();
        let pos = BlockPos::new(3, 3, 3);
        ticks.schedule(ScheduledTick::new(1, pos, 10, 0));
        ticks.schedule(ScheduledTick::new(2, BlockPos::new(4, 3, 3), 10, 1));

        ticks.remove_if(|tick| tick.pos == pos);
        assert_eq!(ticks.count(), 1);
        assert!(!ticks.has_scheduled_tick(pos, 1));
        assert!(ticks.schedule(ScheduledTick::new(1, pos, 20, 2)));
    }
}
