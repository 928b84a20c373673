//! Hopper block entity implementation.

use std::any::Any;

use ingot_registry::block_entity_type::vanilla_block_entity_types;
use ingot_registry::blocks::{BlockState, BlockStateProperties};
use ingot_registry::data_components::DataComponentMap;
use ingot_registry::item_stack::ItemStack;
use ingot_registry::nbt::get_i32;
use ingot_utils::{BlockPos, Direction};
use simdnbt::owned::{NbtCompound, NbtTag};

use crate::block_entity::{
    BaseContainer, BlockEntity, BlockEntityBase, BlockEntityError, DataComponentInput,
};
use crate::inventory::{Container, SimpleContainer};
use crate::inventory::lock::{LockCode, Lockable};
use crate::transfer::{
    MOVE_ITEM_SPEED, TransferCooldown, add_item, add_item_entity, get_container_at,
    get_items_at_and_above, is_full_container, slots_for, try_take_in_item_from_slot,
};
use crate::world::World;

const CONTAINER_SIZE: usize = 5;
const TRANSFER_COOLDOWN_TAG: &str = "TransferCooldown";

/// Block entity for hoppers.
pub struct HopperBlockEntity {
    base: BlockEntityBase,
    container: BaseContainer,
    items: SimpleContainer,
    ticked_game_time: u64,
    cooldown_time: i32,
}

impl HopperBlockEntity {
    /// Creates a new hopper block entity.
    pub fn new(pos: BlockPos, state: BlockState) -> Result<Self, BlockEntityError> {
        Ok(Self {
            base: BlockEntityBase::new(&vanilla_block_entity_types::HOPPER, pos, state)?,
            container: BaseContainer::default(),
            items: SimpleContainer::new(CONTAINER_SIZE),
            ticked_game_time: 0,
            cooldown_time: -1,
        })
    }

    /// Ticks left before the hopper moves again.
    #[must_use]
    pub fn cooldown(&self) -> i32 {
        self.cooldown_time
    }

    /// The game time of the last tick.
    #[must_use]
    pub fn last_ticked(&self) -> u64 {
        self.ticked_game_time
    }

    fn is_on_cooldown(&self) -> bool {
        self.cooldown_time > 0
    }

    fn inventory_full(&self) -> bool {
        self.items.items().iter().all(|stack| !stack.is_empty())
    }

    /// Pushes then pulls, at most one unit each. Returns whether anything moved.
    fn try_move_items(&mut self, world: &World) -> bool {
        if self.is_on_cooldown() || !self.base.state.get_value(&BlockStateProperties::ENABLED) {
            return false;
        }

        let mut moved = false;
        if !Container::is_empty(self) {
            moved = self.eject_items(world);
        }
        if !self.inventory_full() {
            moved |= self.suck_in_items(world);
        }

        if moved {
            self.set_cooldown(MOVE_ITEM_SPEED);
            BlockEntity::set_changed(self);
        }
        moved
    }

    fn eject_items(&mut self, world: &World) -> bool {
        let facing = self.base.state.get_value(&BlockStateProperties::FACING_HOPPER);
        let Some(target) = get_container_at(world, self.base.pos.relative(facing)) else {
            return false;
        };
        let mut target = target.lock();
        let Some(target) = target.as_container_mut() else {
            return false;
        };

        let face = facing.opposite();
        if is_full_container(target, face) {
            return false;
        }

        for slot in 0..CONTAINER_SIZE {
            let stack = self.items.get_item_mut(slot);
            if stack.is_empty() {
                continue;
            }
            let unit = stack.split(1);
            let leftover = add_item(Some(self.ticked_game_time), target, unit, Some(face));
            if leftover.is_empty() {
                target.set_changed();
                return true;
            }
            self.items.get_item_mut(slot).grow(leftover.count());
        }
        false
    }

    fn suck_in_items(&mut self, world: &World) -> bool {
        let above = self.base.pos.above();
        if let Some(source) = get_container_at(world, above) {
            let mut source = source.lock();
            let Some(source) = source.as_container_mut() else {
                return false;
            };
            return slots_for(source, Direction::Down)
                .into_iter()
                .any(|slot| try_take_in_item_from_slot(self, source, slot, Direction::Down));
        }

        if world.is_solid(above) {
            return false;
        }
        for entity in get_items_at_and_above(world, self.base.pos) {
            if add_item_entity(self, &mut entity.lock()) {
                return true;
            }
        }
        false
    }
}

impl TransferCooldown for HopperBlockEntity {
    fn is_on_custom_cooldown(&self) -> bool {
        self.cooldown_time > MOVE_ITEM_SPEED
    }

    fn ticked_game_time(&self) -> u64 {
        self.ticked_game_time
    }

    fn set_cooldown(&mut self, cooldown: i32) {
        self.cooldown_time = cooldown.max(0);
    }
}

impl Container for HopperBlockEntity {
    fn get_container_size(&self) -> usize {
        self.items.get_container_size()
    }

    fn get_item(&self, slot: usize) -> &ItemStack {
        self.items.get_item(slot)
    }

    fn get_item_mut(&mut self, slot: usize) -> &mut ItemStack {
        self.items.get_item_mut(slot)
    }

    fn set_item(&mut self, slot: usize, stack: ItemStack) {
        self.items.set_item(slot, stack);
        if self.items.take_changed() {
            BlockEntity::set_changed(self);
        }
    }

    fn set_changed(&mut self) {
        BlockEntity::set_changed(self);
    }

    fn transfer_cooldown_mut(&mut self) -> Option<&mut dyn TransferCooldown> {
        Some(self)
    }
}

impl Lockable for HopperBlockEntity {
    fn lock_code(&self) -> &LockCode {
        &self.container.lock_key
    }
}

impl BlockEntity for HopperBlockEntity {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn base(&self) -> &BlockEntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BlockEntityBase {
        &mut self.base
    }

    fn load_additional(&mut self, nbt: &NbtCompound) {
        self.items.load(nbt);
        self.container.load(nbt);
        self.cooldown_time = match get_i32(nbt, TRANSFER_COOLDOWN_TAG) {
            Some(cooldown) if cooldown < -1 => {
                log::warn!("Hopper at {} had cooldown {cooldown}, resetting", self.base.pos);
                -1
            }
            Some(cooldown) => cooldown,
            None => -1,
        };
    }

    fn save_additional(&self, nbt: &mut NbtCompound) {
        self.items.save(nbt);
        self.container.save(nbt);
        nbt.insert(TRANSFER_COOLDOWN_TAG, NbtTag::Int(self.cooldown_time));
    }

    fn apply_implicit_components(&mut self, input: &mut DataComponentInput<'_>) {
        self.container.apply_implicit_components(input, self.items.items_mut());
    }

    fn collect_implicit_components(&self, components: &mut DataComponentMap) {
        self.container.collect_implicit_components(components, self.items.items());
    }

    fn remove_components_from_tag(&self, nbt: &mut NbtCompound) {
        BaseContainer::remove_components_from_tag(nbt);
    }

    fn is_ticking(&self) -> bool {
        true
    }

    fn tick(&mut self, world: &World) {
        self.cooldown_time = self.cooldown_time.saturating_sub(1);
        self.ticked_game_time = world.game_time();
        if !self.is_on_cooldown() {
            self.set_cooldown(0);
            self.try_move_items(world);
        }
    }

    fn as_container(&self) -> Option<&dyn Container> {
        Some(self)
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        Some(self)
    }

    fn as_lockable(&self) -> Option<&dyn Lockable> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use ingot_registry::blocks::vanilla_blocks;
    use ingot_registry::items::vanilla_items::{COAL, STONE};

    use super::*;
    use crate::block_entity::{load_with_components, save_without_metadata};
    use crate::config::EngineConfig;

    fn hopper() -> HopperBlockEntity {
        HopperBlockEntity::new(BlockPos::new(0, 64, 0), vanilla_blocks::HOPPER.default_state())
            .expect("hopper on a hopper block")
    }

    #[test]
    fn test_rejects_other_blocks() {
        assert!(
            HopperBlockEntity::new(BlockPos::new(0, 0, 0), vanilla_blocks::CHEST.default_state())
                .is_err()
        );
    }

    #[test]
    fn test_save_load() {
        let mut original = hopper();
        original.set_item(0, ItemStack::with_count(&COAL, 3));
        original.set_item(4, ItemStack::new(&STONE));
        original.set_cooldown(6);

        let nbt = save_without_metadata(&original);
        let mut loaded = hopper();
        load_with_components(&mut loaded, &nbt);

        assert_eq!(loaded.cooldown(), 6);
        assert_eq!(loaded.get_item(0).count(), 3);
        assert!(loaded.get_item(4).is(&STONE));
        assert!(loaded.get_item(2).is_empty());
    }

    #[test]
    fn test_missing_cooldown_defaults() {
        let mut loaded = hopper();
        loaded.load_additional(&NbtCompound::new());
        assert_eq!(loaded.cooldown(), -1);
        assert!(Container::is_empty(&loaded));
    }

    #[test]
    fn test_corrupt_cooldown_is_clamped() {
        let world = World::new(EngineConfig::default());
        let mut nbt = NbtCompound::new();
        nbt.insert(TRANSFER_COOLDOWN_TAG, NbtTag::Int(i32::MIN));

        let mut hopper = hopper();
        hopper.load_additional(&nbt);
        assert_eq!(hopper.cooldown(), -1);
        hopper.tick(&world);
        assert_eq!(hopper.cooldown(), 0);

        nbt.remove(TRANSFER_COOLDOWN_TAG);
        nbt.insert(TRANSFER_COOLDOWN_TAG, NbtTag::Int(i32::MAX));
        hopper.load_additional(&nbt);
        hopper.tick(&world);
        assert_eq!(hopper.cooldown(), i32::MAX - 1);
    }

    #[test]
    fn test_negative_cooldown_clamps_to_ready() {
        let mut hopper = hopper();
        hopper.set_cooldown(-5);
        assert_eq!(hopper.cooldown(), 0);
    }

    #[test]
    fn test_missing_slots_keep_items() {
        let mut hopper = hopper();
        hopper.set_item(4, ItemStack::with_count(&STONE, 3));
        assert_eq!(hopper.insert(7, ItemStack::with_count(&STONE, 3)).count(), 3);
        assert!(hopper.remove_item(9, 1).is_empty());
        assert_eq!(hopper.get_item(4).count(), 3);
    }

    #[test]
    fn test_custom_cooldown() {
        let mut hopper = hopper();
        hopper.set_cooldown(MOVE_ITEM_SPEED);
        assert!(!hopper.is_on_custom_cooldown());
        hopper.set_cooldown(MOVE_ITEM_SPEED + 1);
        assert!(hopper.is_on_custom_cooldown());
    }

    #[test]
    fn test_set_item_clamps() {
        let mut hopper = hopper();
        hopper.set_item(1, ItemStack::with_count(&STONE, 200));
        assert_eq!(hopper.get_item(1).count(), 64);
        assert!(hopper.take_changed());
        hopper.set_item(9, ItemStack::new(&STONE));
        assert!(!hopper.has_changed());
    }
}
