use ingot_registry::block_entity_type::BlockEntityTypeRef;
use ingot_registry::blocks::{BlockRef, BlockState};
use ingot_utils::BlockPos;

use crate::block_entity::{BLOCK_ENTITIES, SharedBlockEntity};
use crate::inventory::container::calculate_redstone_signal_from_container;
use crate::world::World;

/// Hooks the world calls for every state of a block.
pub trait BlockBehaviour: Send + Sync {
    /// Whether states of this block carry a block entity.
    fn has_block_entity(&self) -> bool {
        false
    }

    /// Creates the block entity for a freshly placed `state`.
    fn new_block_entity(&self, _pos: BlockPos, _state: BlockState) -> Option<SharedBlockEntity> {
        None
    }

    /// Called after the block was placed, replacing `old_state`.
    fn on_place(&self, _state: BlockState, _world: &World, _pos: BlockPos, _old_state: BlockState) {
    }

    /// Called when a neighbour of `pos` changed or its redstone power did.
    fn handle_neighbor_changed(
        &self,
        _state: BlockState,
        _world: &World,
        _pos: BlockPos,
        _source_block: BlockRef,
    ) {
    }

    /// Called when a tick scheduled for this block at `pos` fires.
    fn tick(&self, _state: BlockState, _world: &World, _pos: BlockPos) {}

    /// Whether comparators read this block.
    fn has_analog_output_signal(&self, _state: BlockState) -> bool {
        false
    }

    /// The comparator reading, 0 to 15.
    fn get_analog_output_signal(&self, _state: BlockState, _world: &World, _pos: BlockPos) -> i32 {
        0
    }
}

/// Blocks without any special behaviour.
pub struct DefaultBlock;

impl BlockBehaviour for DefaultBlock {}

/// Creates a block entity of type `ty`, logging instead of failing.
pub(crate) fn create_block_entity(
    ty: BlockEntityTypeRef,
    pos: BlockPos,
    state: BlockState,
) -> Option<SharedBlockEntity> {
    match BLOCK_ENTITIES.create(ty, pos, state) {
        Ok(block_entity) => Some(block_entity),
        Err(err) => {
            log::error!("Failed to create block entity at {pos}: {err}");
            None
        }
    }
}

/// Comparator output of the container at `pos`.
pub(crate) fn container_signal(world: &World, pos: BlockPos) -> i32 {
    let Some(block_entity) = world.get_block_entity(pos) else {
        return 0;
    };
    let guard = block_entity.lock();
    guard
        .as_container()
        .map_or(0, calculate_redstone_signal_from_container)
}
