//! Behaviour shared by plain container blocks: chests, barrels, furnaces and
//! decorated pots.

use ingot_registry::block_entity_type::BlockEntityTypeRef;
use ingot_registry::blocks::BlockState;
use ingot_utils::BlockPos;

use crate::behavior::block::{BlockBehaviour, container_signal, create_block_entity};
use crate::block_entity::SharedBlockEntity;
use crate::world::World;

/// Behavior for blocks that only hold a container block entity.
pub struct ContainerBlock {
    block_entity_type: BlockEntityTypeRef,
}

impl ContainerBlock {
    /// Creates a container behaviour for blocks carrying `block_entity_type`.
    #[must_use]
    pub const fn new(block_entity_type: BlockEntityTypeRef) -> Self {
        Self { block_entity_type }
    }
}

impl BlockBehaviour for ContainerBlock {
    fn has_block_entity(&self) -> bool {
        true
    }

    fn new_block_entity(&self, pos: BlockPos, state: BlockState) -> Option<SharedBlockEntity> {
        create_block_entity(self.block_entity_type, pos, state)
    }

    /// Viewer rechecks are the only ticks these blocks schedule.
    fn tick(&self, _state: BlockState, world: &World, pos: BlockPos) {
        let Some(block_entity) = world.get_block_entity(pos) else {
            return;
        };
        let mut guard = block_entity.lock();
        if let Some(viewable) = guard.as_viewable_mut() {
            viewable.recheck_open(world);
        }
    }

    fn has_analog_output_signal(&self, _state: BlockState) -> bool {
        true
    }

    fn get_analog_output_signal(&self, _state: BlockState, world: &World, pos: BlockPos) -> i32 {
        container_signal(world, pos)
    }
}
