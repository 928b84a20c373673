//! Dropper block entity implementation. The dispensing itself is driven by the
//! block's scheduled tick.

use std::any::Any;

use ingot_registry::block_entity_type::vanilla_block_entity_types;
use ingot_registry::blocks::BlockState;
use ingot_registry::data_components::DataComponentMap;
use ingot_registry::item_stack::ItemStack;
use ingot_utils::BlockPos;
use ingot_utils::random::Xoroshiro;
use simdnbt::owned::NbtCompound;

use crate::block_entity::{
    BaseContainer, BlockEntity, BlockEntityBase, BlockEntityError, DataComponentInput,
};
use crate::inventory::{Container, SimpleContainer};
use crate::inventory::lock::{LockCode, Lockable};

const CONTAINER_SIZE: usize = 9;

/// Block entity for droppers.
pub struct DropperBlockEntity {
    base: BlockEntityBase,
    container: BaseContainer,
    items: SimpleContainer,
}

impl DropperBlockEntity {
    /// Creates a new dropper block entity.
    pub fn new(pos: BlockPos, state: BlockState) -> Result<Self, BlockEntityError> {
        Ok(Self {
            base: BlockEntityBase::new(&vanilla_block_entity_types::DROPPER, pos, state)?,
            container: BaseContainer::default(),
            items: SimpleContainer::new(CONTAINER_SIZE),
        })
    }

    /// Picks a non-empty slot uniformly at random, `None` when empty.
    pub fn get_random_slot(&self, random: &mut Xoroshiro) -> Option<usize> {
        let mut chosen = None;
        let mut seen = 1;
        for (slot, stack) in self.items.items().iter().enumerate() {
            if stack.is_empty() {
                continue;
            }
            if random.next_i32_bounded(seen) == 0 {
                chosen = Some(slot);
            }
            seen += 1;
        }
        chosen
    }
}

impl Container for DropperBlockEntity {
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
}

impl Lockable for DropperBlockEntity {
    fn lock_code(&self) -> &LockCode {
        &self.container.lock_key
    }
}

impl BlockEntity for DropperBlockEntity {
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
    }

    fn save_additional(&self, nbt: &mut NbtCompound) {
        self.items.save(nbt);
        self.container.save(nbt);
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

    fn dropper() -> DropperBlockEntity {
        DropperBlockEntity::new(BlockPos::new(0, 0, 0), vanilla_blocks::DROPPER.default_state())
            .expect("dropper on a dropper block")
    }

    #[test]
    fn test_random_slot_is_never_empty() {
        let mut random = Xoroshiro::from_seed(7);
        let mut dropper = dropper();
        assert_eq!(dropper.get_random_slot(&mut random), None);

        dropper.set_item(2, ItemStack::new(&STONE));
        dropper.set_item(6, ItemStack::new(&COAL));
        let mut hits = [0; CONTAINER_SIZE];
        for _ in 0..200 {
            let slot = dropper.get_random_slot(&mut random).expect("two slots are filled");
            hits[slot] += 1;
        }
        assert_eq!(hits[2] + hits[6], 200);
        assert!(hits[2] > 0 && hits[6] > 0);
    }

    #[test]
    fn test_missing_slots_keep_items() {
        let mut dropper = dropper();
        dropper.set_item(8, ItemStack::with_count(&COAL, 2));
        assert_eq!(dropper.insert(12, ItemStack::with_count(&STONE, 4)).count(), 4);
        assert!(dropper.remove_item(9, 1).is_empty());
        assert_eq!(dropper.get_item(8).count(), 2);
        assert_eq!(dropper.count_item(&ItemStack::new(&STONE)), 0);
    }
}
