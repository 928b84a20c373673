//! Barrel block entity implementation.

use std::any::Any;

use ingot_registry::block_entity_type::vanilla_block_entity_types;
use ingot_registry::blocks::{BlockState, BlockStateProperties};
use ingot_registry::data_components::DataComponentMap;
use ingot_registry::item_stack::ItemStack;
use ingot_utils::BlockPos;
use simdnbt::owned::NbtCompound;

use crate::block_entity::{
    BaseContainer, BlockEntity, BlockEntityBase, BlockEntityError, DataComponentInput,
};
use crate::entity::Viewer;
use crate::inventory::{Container, SimpleContainer};
use crate::inventory::lock::{LockCode, Lockable};
use crate::inventory::viewer_tracker::{
    ContainerOpenerListener, ContainerOpenersCounter, ViewableContainer, notify_openers_change,
};
use crate::world::{SoundEvent, World, WorldEvent};

const CONTAINER_SIZE: usize = 27;

/// Block entity for barrels. The block's `open` property follows whether anyone
/// is looking inside.
pub struct BarrelBlockEntity {
    base: BlockEntityBase,
    container: BaseContainer,
    items: SimpleContainer,
    openers: ContainerOpenersCounter,
}

impl BarrelBlockEntity {
    /// Creates a new barrel block entity.
    pub fn new(pos: BlockPos, state: BlockState) -> Result<Self, BlockEntityError> {
        Ok(Self {
            base: BlockEntityBase::new(&vanilla_block_entity_types::BARREL, pos, state)?,
            container: BaseContainer::default(),
            items: SimpleContainer::new(CONTAINER_SIZE),
            openers: ContainerOpenersCounter::new(),
        })
    }

    fn update_block_state(&mut self, world: &World, state: BlockState, open: bool) {
        let state = state.set_value(&BlockStateProperties::OPEN, open);
        world.update_block_state_in_place(self.base.pos, state);
        self.base.state = state;
    }
}

impl ContainerOpenerListener for BarrelBlockEntity {
    fn on_open(&mut self, world: &World, pos: BlockPos, state: BlockState) {
        world.emit(WorldEvent::Sound {
            pos,
            sound: SoundEvent::BarrelOpen,
        });
        self.update_block_state(world, state, true);
    }

    fn on_close(&mut self, world: &World, pos: BlockPos, state: BlockState) {
        world.emit(WorldEvent::Sound {
            pos,
            sound: SoundEvent::BarrelClose,
        });
        self.update_block_state(world, state, false);
    }

    fn opener_count_changed(
        &mut self,
        _world: &World,
        _pos: BlockPos,
        _state: BlockState,
        _old_count: i32,
        _new_count: i32,
    ) {
    }
}

impl ViewableContainer for BarrelBlockEntity {
    fn start_open(&mut self, world: &World, viewer: &Viewer) {
        if self.is_removed() || viewer.spectator {
            return;
        }
        let change = self.openers.increment(viewer);
        let (pos, state) = (self.base.pos, self.base.state);
        notify_openers_change(self, world, pos, state, Some(viewer.id), change);
    }

    fn stop_open(&mut self, world: &World, viewer: &Viewer) {
        if self.is_removed() || viewer.spectator {
            return;
        }
        if let Some(change) = self.openers.decrement() {
            let (pos, state) = (self.base.pos, self.base.state);
            notify_openers_change(self, world, pos, state, Some(viewer.id), change);
        }
    }

    fn recheck_open(&mut self, world: &World) {
        if self.is_removed() {
            return;
        }
        let (pos, state) = (self.base.pos, self.base.state);
        let change = self.openers.reconcile(world, pos);
        notify_openers_change(self, world, pos, state, None, change);
    }

    fn opener_count(&self) -> i32 {
        self.openers.open_count()
    }
}

impl Container for BarrelBlockEntity {
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

impl Lockable for BarrelBlockEntity {
    fn lock_code(&self) -> &LockCode {
        &self.container.lock_key
    }
}

impl BlockEntity for BarrelBlockEntity {
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

    fn as_viewable_mut(&mut self) -> Option<&mut dyn ViewableContainer> {
        Some(self)
    }

    fn as_lockable(&self) -> Option<&dyn Lockable> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use ingot_registry::blocks::vanilla_blocks;
    use ingot_registry::items::vanilla_items::OAK_PLANKS;

    use super::*;
    use crate::block_entity::{load_with_components, save_without_metadata};

    fn barrel() -> BarrelBlockEntity {
        BarrelBlockEntity::new(BlockPos::new(0, 64, 0), vanilla_blocks::BARREL.default_state())
            .expect("barrel on a barrel block")
    }

    #[test]
    fn test_save_load() {
        let mut original = barrel();
        original.set_item(13, ItemStack::with_count(&OAK_PLANKS, 20));
        assert!(original.take_changed());

        let nbt = save_without_metadata(&original);
        let mut loaded = barrel();
        loaded.set_item(0, ItemStack::new(&OAK_PLANKS));
        load_with_components(&mut loaded, &nbt);

        assert_eq!(loaded.get_item(13).count(), 20);
        assert!(loaded.get_item(0).is_empty(), "loading replaces every slot");
        assert_eq!(loaded.get_container_size(), CONTAINER_SIZE);
    }
}
