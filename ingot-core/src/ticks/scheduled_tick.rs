//! Scheduled tick types.

use std::cmp::Ordering;

use ingot_utils::BlockPos;

/// Priority level for scheduled ticks.
///
/// When multiple ticks fire on the same game tick, they are processed
/// in priority order (higher priority first), then by sub-tick order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i8)]
pub enum TickPriority {
    /// Extremely high priority (-3)
    ExtremelyHigh = -3,
    /// Very high priority (-2)
    VeryHigh = -2,
    /// High priority (-1)
    High = -1,
    /// Normal priority (0) - default
    #[default]
    Normal = 0,
    /// Low priority (1)
    Low = 1,
    /// Very low priority (2)
    VeryLow = 2,
    /// Extremely low priority (3)
    ExtremelyLow = 3,
}

impl TickPriority {
    /// Returns the numeric value of this priority.
    /// Lower values = higher priority.
    #[inline]
    #[must_use]
    pub const fn value(self) -> i8 {
        self as i8
    }

    /// Maps a persisted value back, clamping out of range values.
    #[must_use]
    pub const fn from_value(value: i32) -> Self {
        match value {
            i32::MIN..=-3 => Self::ExtremelyHigh,
            -2 => Self::VeryHigh,
            -1 => Self::High,
            0 => Self::Normal,
            1 => Self::Low,
            2 => Self::VeryLow,
            _ => Self::ExtremelyLow,
        }
    }
}

impl PartialOrd for TickPriority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TickPriority {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for BinaryHeap: High(-1) > Normal(0) > Low(1)
        other.value().cmp(&self.value())
    }
}

/// A pending block tick.
#[derive(Debug, Clone)]
pub struct ScheduledTick<T> {
    /// The block being ticked.
    pub tick_type: T,
    /// The position of the block.
    pub pos: BlockPos,
    /// The absolute game tick when this should fire.
    pub trigger_tick: u64,
    /// Priority for ordering within the same game tick.
    pub priority: TickPriority,
    /// Sub-tick ordering for ticks with same `trigger_tick` and priority.
    /// Lower values run first.
    pub sub_tick_order: u64,
}

impl<T> ScheduledTick<T> {
    /// Creates a new scheduled tick with normal priority.
    pub fn new(tick_type: T, pos: BlockPos, trigger_tick: u64, sub_tick_order: u64) -> Self {
        Self::with_priority(tick_type, pos, trigger_tick, TickPriority::Normal, sub_tick_order)
    }

    /// Creates a new scheduled tick with the specified priority.
    pub fn with_priority(
        tick_type: T,
        pos: BlockPos,
        trigger_tick: u64,
        priority: TickPriority,
        sub_tick_order: u64,
    ) -> Self {
        Self {
            tick_type,
            pos,
            trigger_tick,
            priority,
            sub_tick_order,
        }
    }
}

impl<T: PartialEq> PartialEq for ScheduledTick<T> {
    fn eq(&self, other: &Self) -> bool {
        self.trigger_tick == other.trigger_tick
            && self.priority == other.priority
            && self.sub_tick_order == other.sub_tick_order
    }
}

impl<T: Eq> Eq for ScheduledTick<T> {}

impl<T: Eq> PartialOrd for ScheduledTick<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Eq> Ord for ScheduledTick<T> {
    /// `BinaryHeap` is a max-heap, so earlier ticks compare greater.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .trigger_tick
            .cmp(&self.trigger_tick)
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| other.sub_tick_order.cmp(&self.sub_tick_order))
    }
}

/// A tick as persisted with its chunk: the delay is relative to the game time at
/// save, so it survives the chunk being unloaded for a while.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedTick<T> {
    /// The block being ticked.
    pub tick_type: T,
    /// The position of the block.
    pub pos: BlockPos,
    /// Ticks left until it fires. Overdue ticks save as 0.
    pub delay: u32,
    /// Priority for ordering within the same game tick.
    pub priority: TickPriority,
}

/// Key for deduplication in the tick set. Only considers position and type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickKey<T> {
    /// The position of the block.
    pub pos: BlockPos,
    /// The block being ticked.
    pub tick_type: T,
}

impl<T: Copy> From<&ScheduledTick<T>> for TickKey<T> {
    fn from(tick: &ScheduledTick<T>) -> Self {
        Self {
            pos: tick.pos,
            tick_type: tick.tick_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_ordering() {
        let pos = BlockPos::new(0, 0, 0);

        // In max-heap, "greater" means runs first
        let tick1 = ScheduledTick::new(1u32, pos, 100, 0);
        let tick2 = ScheduledTick::new(1u32, pos, 200, 0);
        assert!(tick1 > tick2);

        let tick3 = ScheduledTick::with_priority(1u32, pos, 100, TickPriority::High, 0);
        let tick4 = ScheduledTick::with_priority(1u32, pos, 100, TickPriority::Normal, 0);
        assert!(tick3 > tick4);

        let tick5 = ScheduledTick::new(1u32, pos, 100, 5);
        let tick6 = ScheduledTick::new(1u32, pos, 100, 10);
        assert!(tick5 > tick6);
    }

    #[test]
    fn test_priority_from_value() {
        assert_eq!(TickPriority::from_value(-1), TickPriority::High);
        assert_eq!(TickPriority::from_value(-40), TickPriority::ExtremelyHigh);
        assert_eq!(TickPriority::from_value(9), TickPriority::ExtremelyLow);
        for priority in [TickPriority::VeryHigh, TickPriority::Normal, TickPriority::Low] {
            assert_eq!(TickPriority::from_value(i32::from(priority.value())), priority);
        }
    }
}
