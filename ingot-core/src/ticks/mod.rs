//! Scheduled block ticks.
//!
//! Blocks ask for a callback some number of game ticks in the future (a dropper
//! waiting out its delay, a container rechecking its viewers). Ticks are stored per
//! chunk so they are saved and restored along with it.
//!
//! - [`ScheduledTick`] - A single scheduled tick entry
//! - [`SavedTick`] - A tick detached from game time, as persisted
//! - [`TickPriority`] - Priority for ordering ticks within the same game tick
//! - [`LevelChunkTicks`] - Per-chunk tick storage with deduplication
//! - [`LevelTicks`] - World-level coordinator that manages all chunk ticks

mod chunk_ticks;
mod level_ticks;
mod scheduled_tick;

pub use chunk_ticks::LevelChunkTicks;
pub use level_ticks::LevelTicks;
pub use scheduled_tick::{SavedTick, ScheduledTick, TickKey, TickPriority};
