//! Chest block entity implementation.

use std::any::Any;

use ingot_registry::block_entity_type::vanilla_block_entity_types;
use ingot_registry::blocks::BlockState;
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

/// Block event that moves the chest lid; the parameter is the viewer count.
pub const LID_EVENT: i32 = 1;

/// Block entity for chests.
pub struct ChestBlockEntity {
    base: BlockEntityBase,
    container: BaseContainer,
    items: SimpleContainer,
    openers: ContainerOpenersCounter,
}

impl ChestBlockEntity {
    /// Creates a new chest block entity.
    pub fn new(pos: BlockPos, state: BlockState) -> Result<Self, BlockEntityError> {
        Ok(Self {
            base: BlockEntityBase::new(&vanilla_block_entity_types::CHEST, pos, state)?,
            container: BaseContainer::default(),
            items: SimpleContainer::new(CONTAINER_SIZE),
            openers: ContainerOpenersCounter::new(),
        })
    }

    /// The name the chest was given, if any.
    #[must_use]
    pub fn custom_name(&self) -> Option<&str> {
        self.container.name.as_deref()
    }
}

impl ContainerOpenerListener for ChestBlockEntity {
    fn on_open(&mut self, world: &World, pos: BlockPos, _state: BlockState) {
        world.emit(WorldEvent::Sound {
            pos,
            sound: SoundEvent::ChestOpen,
        });
    }

    fn on_close(&mut self, world: &World, pos: BlockPos, _state: BlockState) {
        world.emit(WorldEvent::Sound {
            pos,
            sound: SoundEvent::ChestClose,
        });
    }

    fn opener_count_changed(
        &mut self,
        world: &World,
        pos: BlockPos,
        state: BlockState,
        _old_count: i32,
        new_count: i32,
    ) {
        world.emit(WorldEvent::BlockEvent {
            pos,
            block: state.get_block(),
            id: LID_EVENT,
            param: new_count,
        });
    }
}

impl ViewableContainer for ChestBlockEntity {
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

impl Container for ChestBlockEntity {
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

impl Lockable for ChestBlockEntity {
    fn lock_code(&self) -> &LockCode {
        &self.container.lock_key
    }
}

impl BlockEntity for ChestBlockEntity {
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
    use ingot_registry::items::vanilla_items::COBBLESTONE;

    use super::*;
    use crate::block_entity::{load_with_components, save_without_metadata};

    fn chest() -> ChestBlockEntity {
        ChestBlockEntity::new(BlockPos::new(3, 64, 3), vanilla_blocks::CHEST.default_state())
            .expect("chest on a chest block")
    }

    #[test]
    fn test_save_load_keeps_name_and_lock() {
        let mut original = chest();
        original.container.name = Some("Ores".to_string());
        original.container.lock_key = LockCode::new("secret");
        original.set_item(26, ItemStack::with_count(&COBBLESTONE, 40));

        let nbt = save_without_metadata(&original);
        let mut loaded = chest();
        load_with_components(&mut loaded, &nbt);

        assert_eq!(loaded.custom_name(), Some("Ores"));
        assert_eq!(loaded.lock_code(), &LockCode::new("secret"));
        assert_eq!(loaded.get_item(26).count(), 40);
        assert_eq!(loaded.get_container_size(), CONTAINER_SIZE);
    }

    #[test]
    fn test_out_of_range_slots() {
        let mut chest = chest();
        let stone = ItemStack::with_count(&COBBLESTONE, 5);
        assert_eq!(chest.insert(CONTAINER_SIZE, stone).count(), 5);
        assert!(chest.remove_item(CONTAINER_SIZE + 3, 1).is_empty());
        chest.set_item(CONTAINER_SIZE, ItemStack::new(&COBBLESTONE));
        assert!(!chest.has_changed());
        assert!(Container::is_empty(&chest));
    }

    #[test]
    fn test_update_tag_is_empty() {
        let mut chest = chest();
        chest.set_item(0, ItemStack::new(&COBBLESTONE));
        assert!(chest.get_update_tag().is_empty());
    }
}
