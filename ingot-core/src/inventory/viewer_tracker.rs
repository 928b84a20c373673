//! Counting the viewers that have a container open.
//!
//! The counter only does bookkeeping. Its methods return an [`OpenersChange`], and
//! the owning block entity passes that to [`notify_openers_change`], which fires the
//! listener hooks, the world events and the periodic recheck. Because the owner is
//! also the listener, the two steps can't be fused without borrowing the block
//! entity twice.

use ingot_registry::blocks::BlockState;
use ingot_utils::BlockPos;
use uuid::Uuid;

use crate::entity::Viewer;
use crate::world::{World, WorldEvent};

/// Ticks between rescans while a container is open.
pub const CHECK_TICK_DELAY: u32 = 5;

/// The outcome of one counter update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenersChange {
    /// Count before the update.
    pub old_count: i32,
    /// Count after the update.
    pub new_count: i32,
    reschedule: bool,
}

impl OpenersChange {
    /// The container went from no viewers to some.
    #[must_use]
    pub fn opened(&self) -> bool {
        self.old_count == 0 && self.new_count > 0
    }

    /// The container went from some viewers to none.
    #[must_use]
    pub fn closed(&self) -> bool {
        self.old_count > 0 && self.new_count == 0
    }
}

/// Side effects of a container opening and closing.
pub trait ContainerOpenerListener {
    /// The first viewer arrived.
    fn on_open(&mut self, world: &World, pos: BlockPos, state: BlockState);

    /// The last viewer left.
    fn on_close(&mut self, world: &World, pos: BlockPos, state: BlockState);

    /// Called after every counter update, including ones that didn't change it.
    fn opener_count_changed(
        &mut self,
        world: &World,
        pos: BlockPos,
        state: BlockState,
        old_count: i32,
        new_count: i32,
    );
}

/// Open count and interaction range of the viewers of one container.
#[derive(Debug, Clone, Default)]
pub struct ContainerOpenersCounter {
    open_count: i32,
    max_interaction_range: f64,
}

impl ContainerOpenersCounter {
    /// A closed counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current number of viewers.
    #[must_use]
    pub fn open_count(&self) -> i32 {
        self.open_count
    }

    /// The largest interaction range among the current viewers.
    #[must_use]
    pub fn max_interaction_range(&self) -> f64 {
        self.max_interaction_range
    }

    /// A viewer opened the container.
    pub fn increment(&mut self, viewer: &Viewer) -> OpenersChange {
        let old_count = self.open_count;
        self.open_count += 1;
        self.max_interaction_range = self.max_interaction_range.max(viewer.interaction_range);
        OpenersChange {
            old_count,
            new_count: self.open_count,
            reschedule: old_count == 0,
        }
    }

    /// A viewer closed the container. `None` while already closed.
    pub fn decrement(&mut self) -> Option<OpenersChange> {
        let old_count = self.open_count;
        if old_count == 0 {
            return None;
        }
        self.open_count -= 1;
        if self.open_count == 0 {
            self.max_interaction_range = 0.0;
        }
        Some(OpenersChange {
            old_count,
            new_count: self.open_count,
            reschedule: false,
        })
    }

    /// Counts the viewers that actually have the container at `pos` open and adopts
    /// that count.
    pub fn reconcile(&mut self, world: &World, pos: BlockPos) -> OpenersChange {
        let reach = self.max_interaction_range + 4.0;
        let area = pos.bounding_box().inflate(reach);
        let ranges = world.container_viewer_ranges(pos, &area);

        let old_count = self.open_count;
        let new_count = i32::try_from(ranges.len()).unwrap_or(i32::MAX);
        self.max_interaction_range = ranges.into_iter().fold(0.0, f64::max);
        self.open_count = new_count;

        if old_count != new_count {
            log::debug!("Reconciled viewers of {pos}: {old_count} -> {new_count}");
        }
        OpenersChange {
            old_count,
            new_count,
            reschedule: new_count > 0,
        }
    }
}

/// Fires the side effects of `change` on `listener`, the owner of the counter.
pub fn notify_openers_change(
    listener: &mut dyn ContainerOpenerListener,
    world: &World,
    pos: BlockPos,
    state: BlockState,
    viewer: Option<Uuid>,
    change: OpenersChange,
) {
    if change.opened() {
        listener.on_open(world, pos, state);
        world.emit(WorldEvent::ContainerOpened { pos, viewer });
    } else if change.closed() {
        listener.on_close(world, pos, state);
        world.emit(WorldEvent::ContainerClosed { pos, viewer });
    }
    listener.opener_count_changed(world, pos, state, change.old_count, change.new_count);
    if change.reschedule {
        world.schedule_tick(pos, state.get_block(), CHECK_TICK_DELAY);
    }
}

/// A container whose viewers are tracked.
pub trait ViewableContainer {
    /// `viewer` opened the container.
    fn start_open(&mut self, world: &World, viewer: &Viewer);

    /// `viewer` closed the container.
    fn stop_open(&mut self, world: &World, viewer: &Viewer);

    /// Rescans the actual viewers.
    fn recheck_open(&mut self, world: &World);

    /// Current number of viewers.
    fn opener_count(&self) -> i32;
}

#[cfg(test)]
mod tests {
    use ingot_registry::blocks::vanilla_blocks;
    use ingot_utils::math::Vector3;

    use super::*;
    use crate::config::EngineConfig;

    const POS: BlockPos = BlockPos::new(0, 64, 0);

    fn viewer(range: f64) -> Viewer {
        let mut viewer = Viewer::new(Uuid::new_v4(), Vector3::new(0.5, 0.0, 0.5));
        viewer.interaction_range = range;
        viewer
    }

    fn looking_at(world: &World, range: f64) {
        let mut viewer = viewer(range);
        viewer.position = Vector3::new(1.5, 64.0, 0.5);
        viewer.open_container = Some(POS);
        world.add_viewer(viewer);
    }

    #[derive(Default)]
    struct Recorder {
        opened: u32,
        closed: u32,
        changes: Vec<(i32, i32)>,
    }

    impl ContainerOpenerListener for Recorder {
        fn on_open(&mut self, _world: &World, _pos: BlockPos, _state: BlockState) {
            self.opened += 1;
        }

        fn on_close(&mut self, _world: &World, _pos: BlockPos, _state: BlockState) {
            self.closed += 1;
        }

        fn opener_count_changed(
            &mut self,
            _world: &World,
            _pos: BlockPos,
            _state: BlockState,
            old_count: i32,
            new_count: i32,
        ) {
            self.changes.push((old_count, new_count));
        }
    }

    fn opened_events(world: &World) -> usize {
        world
            .drain_events()
            .into_iter()
            .filter(|event| matches!(event, WorldEvent::ContainerOpened { pos, .. } if *pos == POS))
            .count()
    }

    #[test]
    fn test_increment_decrement() {
        let mut counter = ContainerOpenersCounter::new();
        let first = counter.increment(&viewer(4.5));
        assert!(first.opened());
        assert!(first.reschedule);

        let second = counter.increment(&viewer(6.0));
        assert!(!second.opened());
        assert_eq!(counter.max_interaction_range(), 6.0);

        assert!(!counter.decrement().expect("open").closed());
        assert!(counter.decrement().expect("open").closed());
        assert_eq!(counter.max_interaction_range(), 0.0);
        assert!(counter.decrement().is_none());
        assert_eq!(counter.open_count(), 0);
    }

    #[test]
    fn test_reconcile_picks_up_untracked_viewers() {
        let world = World::new(EngineConfig::default());
        let state = vanilla_blocks::CHEST.default_state();
        looking_at(&world, 4.5);
        looking_at(&world, 4.5);

        let mut counter = ContainerOpenersCounter::new();
        let mut listener = Recorder::default();
        let change = counter.reconcile(&world, POS);
        assert!(change.opened());
        assert_eq!(counter.open_count(), 2);
        notify_openers_change(&mut listener, &world, POS, state, None, change);
        assert_eq!(listener.opened, 1);
        assert_eq!(opened_events(&world), 1);

        let change = counter.reconcile(&world, POS);
        assert!(!change.opened());
        notify_openers_change(&mut listener, &world, POS, state, None, change);
        assert_eq!(listener.opened, 1);
        assert_eq!(listener.closed, 0);
        assert_eq!(opened_events(&world), 0);
        assert_eq!(listener.changes, vec![(0, 2), (2, 2)]);
    }

    #[test]
    fn test_reconcile_recomputes_interaction_range() {
        let world = World::new(EngineConfig::default());
        looking_at(&world, 4.5);
        looking_at(&world, 6.0);

        let mut counter = ContainerOpenersCounter::new();
        counter.increment(&viewer(10.0));
        assert_eq!(counter.max_interaction_range(), 10.0);

        let change = counter.reconcile(&world, POS);
        assert_eq!((change.old_count, change.new_count), (1, 2));
        assert_eq!(counter.max_interaction_range(), 6.0);
    }
}
