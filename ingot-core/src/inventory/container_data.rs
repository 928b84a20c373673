//! Integer views of block entity progress, indexed the way container menus sync it.

/// A fixed number of integer slots that a menu mirrors to the client.
pub trait ContainerData {
    /// Reads slot `index`. Out of range reads zero.
    fn get(&self, index: usize) -> i32;

    /// Writes slot `index`. Out of range writes are ignored.
    fn set(&mut self, index: usize, value: i32);

    /// The number of slots.
    fn count(&self) -> usize;
}

/// Burn and cook progress of a furnace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FurnaceData {
    /// Ticks of fuel left.
    pub lit_time_remaining: i32,
    /// Burn duration of the fuel item being consumed.
    pub lit_total_time: i32,
    /// Progress on the current input.
    pub cooking_timer: i32,
    /// Ticks needed for the current input.
    pub cooking_total_time: i32,
}

impl FurnaceData {
    /// Index of [`FurnaceData::lit_time_remaining`].
    pub const LIT_TIME_REMAINING: usize = 0;
    /// Index of [`FurnaceData::lit_total_time`].
    pub const LIT_TOTAL_TIME: usize = 1;
    /// Index of [`FurnaceData::cooking_timer`].
    pub const COOKING_TIMER: usize = 2;
    /// Index of [`FurnaceData::cooking_total_time`].
    pub const COOKING_TOTAL_TIME: usize = 3;
    /// Number of synced values.
    pub const NUM_DATA_VALUES: usize = 4;

    /// Whether fuel is burning.
    #[must_use]
    pub fn is_lit(&self) -> bool {
        self.lit_time_remaining > 0
    }
}

impl ContainerData for FurnaceData {
    fn get(&self, index: usize) -> i32 {
        match index {
            Self::LIT_TIME_REMAINING => self.lit_time_remaining,
            Self::LIT_TOTAL_TIME => self.lit_total_time,
            Self::COOKING_TIMER => self.cooking_timer,
            Self::COOKING_TOTAL_TIME => self.cooking_total_time,
            _ => 0,
        }
    }

    /// Timers never run below zero, so negative values are stored as zero.
    fn set(&mut self, index: usize, value: i32) {
        let value = value.max(0);
        match index {
            Self::LIT_TIME_REMAINING => self.lit_time_remaining = value,
            Self::LIT_TOTAL_TIME => self.lit_total_time = value,
            Self::COOKING_TIMER => self.cooking_timer = value,
            Self::COOKING_TOTAL_TIME => self.cooking_total_time = value,
            _ => {}
        }
    }

    fn count(&self) -> usize {
        Self::NUM_DATA_VALUES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_adapter() {
        let mut data = FurnaceData::default();
        data.set(FurnaceData::COOKING_TIMER, 40);
        data.set(9, 1);
        assert_eq!(data.cooking_timer, 40);
        assert_eq!(data.get(FurnaceData::COOKING_TIMER), 40);
        assert_eq!(data.get(9), 0);
        assert_eq!(data.count(), 4);
        assert!(!data.is_lit());

        data.set(FurnaceData::LIT_TIME_REMAINING, -30);
        assert_eq!(data.lit_time_remaining, 0);
    }
}
