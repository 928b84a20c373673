//! Hopper block behavior implementation.

use ingot_registry::block_entity_type::vanilla_block_entity_types;
use ingot_registry::blocks::{BlockRef, BlockState, BlockStateProperties};
use ingot_utils::BlockPos;
use ingot_utils::types::UpdateFlags;

use crate::behavior::block::{BlockBehaviour, container_signal, create_block_entity};
use crate::block_entity::SharedBlockEntity;
use crate::world::World;

/// Behavior for hopper blocks.
pub struct HopperBlock {
    block: BlockRef,
}

impl HopperBlock {
    /// Creates a new hopper block behavior.
    #[must_use]
    pub const fn new(block: BlockRef) -> Self {
        Self { block }
    }

    /// A powered hopper is disabled.
    fn check_powered_state(state: BlockState, world: &World, pos: BlockPos) {
        let enabled = !world.has_neighbor_signal(pos);
        if enabled != state.get_value(&BlockStateProperties::ENABLED) {
            world.set_block(
                pos,
                state.set_value(&BlockStateProperties::ENABLED, enabled),
                UpdateFlags::UPDATE_CLIENTS,
            );
        }
    }
}

impl BlockBehaviour for HopperBlock {
    fn has_block_entity(&self) -> bool {
        true
    }

    fn new_block_entity(&self, pos: BlockPos, state: BlockState) -> Option<SharedBlockEntity> {
        create_block_entity(&vanilla_block_entity_types::HOPPER, pos, state)
    }

    fn on_place(&self, state: BlockState, world: &World, pos: BlockPos, old_state: BlockState) {
        if !old_state.is(self.block) {
            Self::check_powered_state(state, world, pos);
        }
    }

    fn handle_neighbor_changed(
        &self,
        state: BlockState,
        world: &World,
        pos: BlockPos,
        _source_block: BlockRef,
    ) {
        Self::check_powered_state(state, world, pos);
    }

    fn has_analog_output_signal(&self, _state: BlockState) -> bool {
        true
    }

    fn get_analog_output_signal(&self, _state: BlockState, world: &World, pos: BlockPos) -> i32 {
        container_signal(world, pos)
    }
}
