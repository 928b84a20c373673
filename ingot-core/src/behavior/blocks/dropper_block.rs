//! Dropper block behavior implementation.
//!
//! A rising redstone edge at the dropper, or at the block above it, schedules a
//! dispense a few ticks later. Each dispense moves one item from a random slot
//! into the container in front, or drops it into the world when there is none.

use ingot_registry::block_entity_type::vanilla_block_entity_types;
use ingot_registry::blocks::{BlockRef, BlockState, BlockStateProperties};
use ingot_registry::item_stack::ItemStack;
use ingot_utils::math::Vector3;
use ingot_utils::types::UpdateFlags;
use ingot_utils::{BlockPos, Direction};

use crate::behavior::block::{BlockBehaviour, container_signal, create_block_entity};
use crate::block_entity::SharedBlockEntity;
use crate::block_entity::entities::DropperBlockEntity;
use crate::inventory::Container;
use crate::transfer::{add_item, get_container_at};
use crate::world::{SoundEvent, World, WorldEvent};

/// Ticks between the redstone edge and the dispense.
pub const TRIGGER_DELAY: u32 = 4;

/// Behavior for dropper blocks.
pub struct DropperBlock {
    block: BlockRef,
}

impl DropperBlock {
    /// Creates a new dropper block behavior.
    #[must_use]
    pub const fn new(block: BlockRef) -> Self {
        Self { block }
    }

    fn dispense_from(state: BlockState, world: &World, pos: BlockPos) {
        let Some(block_entity) = world.get_block_entity(pos) else {
            return;
        };
        let mut guard = block_entity.lock();
        let Some(dropper) = guard.as_any_mut().downcast_mut::<DropperBlockEntity>() else {
            return;
        };

        let Some(slot) = dropper.get_random_slot(&mut world.random()) else {
            world.emit(WorldEvent::Sound {
                pos,
                sound: SoundEvent::DispenserFail,
            });
            return;
        };

        let mut remaining = dropper.get_item(slot).clone();
        let facing = state.get_value(&BlockStateProperties::FACING);
        if let Some(target) = get_container_at(world, pos.relative(facing)) {
            let mut target = target.lock();
            let Some(target) = target.as_container_mut() else {
                return;
            };
            let leftover = add_item(
                None,
                target,
                remaining.copy_with_count(1),
                Some(facing.opposite()),
            );
            if leftover.is_empty() {
                remaining.shrink(1);
            }
        } else {
            let unit = remaining.split(1);
            spawn_dispensed(world, pos, facing, unit);
            world.emit(WorldEvent::Sound {
                pos,
                sound: SoundEvent::DispenserDispense,
            });
        }
        dropper.set_item(slot, remaining);
    }
}

/// Drops `stack` just outside the dropper's face.
fn spawn_dispensed(world: &World, pos: BlockPos, facing: Direction, stack: ItemStack) {
    let (dx, dy, dz) = facing.offset();
    let center = pos.center();
    let drop = if facing.is_horizontal() { 0.156_25 } else { 0.125 };
    let position = Vector3::new(
        center.x + 0.7 * f64::from(dx),
        center.y + 0.7 * f64::from(dy) - drop,
        center.z + 0.7 * f64::from(dz),
    );
    world.spawn_item(position, stack);
}

impl BlockBehaviour for DropperBlock {
    fn has_block_entity(&self) -> bool {
        true
    }

    fn new_block_entity(&self, pos: BlockPos, state: BlockState) -> Option<SharedBlockEntity> {
        create_block_entity(&vanilla_block_entity_types::DROPPER, pos, state)
    }

    fn handle_neighbor_changed(
        &self,
        state: BlockState,
        world: &World,
        pos: BlockPos,
        _source_block: BlockRef,
    ) {
        let powered = world.has_neighbor_signal(pos) || world.has_neighbor_signal(pos.above());
        let triggered = state.get_value(&BlockStateProperties::TRIGGERED);
        if powered && !triggered {
            world.schedule_tick(pos, self.block, TRIGGER_DELAY);
            world.set_block(
                pos,
                state.set_value(&BlockStateProperties::TRIGGERED, true),
                UpdateFlags::UPDATE_CLIENTS,
            );
        } else if !powered && triggered {
            world.set_block(
                pos,
                state.set_value(&BlockStateProperties::TRIGGERED, false),
                UpdateFlags::UPDATE_CLIENTS,
            );
        }
    }

    fn tick(&self, state: BlockState, world: &World, pos: BlockPos) {
        Self::dispense_from(state, world, pos);
    }

    fn has_analog_output_signal(&self, _state: BlockState) -> bool {
        true
    }

    fn get_analog_output_signal(&self, _state: BlockState, world: &World, pos: BlockPos) -> i32 {
        container_signal(world, pos)
    }
}
