//! Decorated pot block entity implementation.
//!
//! A pot holds a single stack. Hoppers and droppers fill it like any other
//! container, and clients render the stack, so it is part of the update tag.

use std::any::Any;

use ingot_registry::block_entity_type::vanilla_block_entity_types;
use ingot_registry::blocks::BlockState;
use ingot_registry::data_components::vanilla_components::CONTAINER;
use ingot_registry::data_components::{DataComponentMap, ItemContainerContents};
use ingot_registry::item_stack::ItemStack;
use ingot_registry::nbt::get_compound;
use ingot_utils::BlockPos;
use simdnbt::owned::{NbtCompound, NbtTag};

use crate::block_entity::{BlockEntity, BlockEntityBase, BlockEntityError, DataComponentInput};
use crate::inventory::{Container, SimpleContainer};

const ITEM_TAG: &str = "item";
const SLOT: usize = 0;

/// Block entity for decorated pots.
pub struct DecoratedPotBlockEntity {
    base: BlockEntityBase,
    items: SimpleContainer,
}

impl DecoratedPotBlockEntity {
    /// Creates a new decorated pot block entity.
    pub fn new(pos: BlockPos, state: BlockState) -> Result<Self, BlockEntityError> {
        Ok(Self {
            base: BlockEntityBase::new(&vanilla_block_entity_types::DECORATED_POT, pos, state)?,
            items: SimpleContainer::new(1),
        })
    }

    /// The stack in the pot.
    #[must_use]
    pub fn the_item(&self) -> &ItemStack {
        self.items.get_item(SLOT)
    }

    fn save_item(&self, nbt: &mut NbtCompound) {
        let item = self.the_item();
        if !item.is_empty() {
            nbt.insert(ITEM_TAG, NbtTag::Compound(item.to_nbt()));
        }
    }
}

impl Container for DecoratedPotBlockEntity {
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

impl BlockEntity for DecoratedPotBlockEntity {
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
        *self.items.get_item_mut(SLOT) = get_compound(nbt, ITEM_TAG)
            .and_then(ItemStack::from_nbt)
            .unwrap_or_default();
    }

    fn save_additional(&self, nbt: &mut NbtCompound) {
        self.save_item(nbt);
    }

    fn get_update_tag(&self) -> NbtCompound {
        let mut nbt = NbtCompound::new();
        self.save_item(&mut nbt);
        nbt
    }

    fn apply_implicit_components(&mut self, input: &mut DataComponentInput<'_>) {
        input
            .get_or_default(&CONTAINER)
            .copy_into(self.items.items_mut());
    }

    fn collect_implicit_components(&self, components: &mut DataComponentMap) {
        components.set(&CONTAINER, ItemContainerContents::from_items(self.items.items()));
    }

    fn remove_components_from_tag(&self, nbt: &mut NbtCompound) {
        nbt.remove(ITEM_TAG);
    }

    fn as_container(&self) -> Option<&dyn Container> {
        Some(self)
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        Some(self)
    }
}
