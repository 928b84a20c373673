//! Furnace block entity implementation.
//!
//! Slot 0 is the input, slot 1 the fuel and slot 2 the result. Hoppers above feed
//! the input, hoppers at the sides feed fuel, and hoppers below pull results and
//! empty buckets.

use std::any::Any;
use std::sync::Arc;

use ingot_registry::block_entity_type::vanilla_block_entity_types;
use ingot_registry::blocks::{BlockState, BlockStateProperties};
use ingot_registry::data_components::DataComponentMap;
use ingot_registry::item_stack::ItemStack;
use ingot_registry::items::vanilla_items;
use ingot_registry::nbt::get_i32;
use ingot_utils::{BlockPos, Direction};
use simdnbt::owned::{NbtCompound, NbtTag};
use smallvec::smallvec;

use crate::block_entity::{
    BaseContainer, BlockEntity, BlockEntityBase, BlockEntityError, DataComponentInput,
};
use crate::inventory::container::FaceSlots;
use crate::inventory::container_data::{ContainerData, FurnaceData};
use crate::inventory::lock::{LockCode, Lockable};
use crate::inventory::{Container, SimpleContainer, WorldlyContainer};
use crate::recipe::{DEFAULT_COOKING_TIME, SmeltingRecipe, SmeltingRules, SmeltingTable};
use crate::world::World;

/// The input slot.
pub const SLOT_INPUT: usize = 0;
/// The fuel slot.
pub const SLOT_FUEL: usize = 1;
/// The result slot.
pub const SLOT_RESULT: usize = 2;

const CONTAINER_SIZE: usize = 3;

/// Block entity for furnaces.
pub struct FurnaceBlockEntity {
    base: BlockEntityBase,
    container: BaseContainer,
    items: SimpleContainer,
    data: FurnaceData,
    rules: Arc<dyn SmeltingRules>,
}

impl FurnaceBlockEntity {
    /// Creates a new furnace block entity. It smelts nothing until it is attached
    /// to a world.
    pub fn new(pos: BlockPos, state: BlockState) -> Result<Self, BlockEntityError> {
        Ok(Self {
            base: BlockEntityBase::new(&vanilla_block_entity_types::FURNACE, pos, state)?,
            container: BaseContainer::default(),
            items: SimpleContainer::new(CONTAINER_SIZE),
            data: FurnaceData::default(),
            rules: Arc::new(SmeltingTable::new()),
        })
    }

    /// Burn and cook progress.
    #[must_use]
    pub fn data(&self) -> &FurnaceData {
        &self.data
    }

    /// Whether fuel is burning.
    #[must_use]
    pub fn is_lit(&self) -> bool {
        self.data.is_lit()
    }

    fn total_cook_time(&self) -> i32 {
        self.rules
            .recipe_for(self.items.get_item(SLOT_INPUT))
            .map_or(DEFAULT_COOKING_TIME, |recipe| recipe.cooking_time)
    }

    fn can_burn(&self, recipe: Option<&SmeltingRecipe>) -> bool {
        let Some(recipe) = recipe else {
            return false;
        };
        if self.items.get_item(SLOT_INPUT).is_empty() || recipe.result.is_empty() {
            return false;
        }
        let output = self.items.get_item(SLOT_RESULT);
        if output.is_empty() {
            return true;
        }
        if !ItemStack::is_same_item_same_components(output, &recipe.result) {
            return false;
        }
        let count = output.count() + recipe.result.count();
        count <= self.get_max_stack_size() && count <= output.max_stack_size()
    }

    fn burn(&mut self, recipe: Option<&SmeltingRecipe>) -> bool {
        if !self.can_burn(recipe) {
            return false;
        }
        let Some(recipe) = recipe else {
            return false;
        };
        let output = self.items.get_item_mut(SLOT_RESULT);
        if output.is_empty() {
            *output = recipe.result.clone();
        } else {
            output.grow(recipe.result.count());
        }
        self.items.get_item_mut(SLOT_INPUT).shrink(1);
        true
    }

    /// Takes one unit of fuel, leaving the item's remainder behind when the last
    /// one goes.
    fn consume_fuel(&mut self) {
        let fuel = self.items.get_item_mut(SLOT_FUEL);
        if fuel.is_empty() {
            return;
        }
        let item = fuel.item();
        fuel.shrink(1);
        if fuel.is_empty() {
            *fuel = item
                .crafting_remainder
                .map_or_else(ItemStack::empty, ItemStack::new);
        }
    }

    fn server_tick(&mut self, world: &World) {
        let was_lit = self.is_lit();
        let mut changed = false;
        if was_lit {
            self.data.lit_time_remaining -= 1;
        }

        let has_input = !self.items.get_item(SLOT_INPUT).is_empty();
        let has_fuel = !self.items.get_item(SLOT_FUEL).is_empty();
        if self.is_lit() || (has_fuel && has_input) {
            let recipe = if has_input {
                self.rules.recipe_for(self.items.get_item(SLOT_INPUT))
            } else {
                None
            };

            if !self.is_lit() && self.can_burn(recipe.as_ref()) {
                let duration = self.rules.burn_duration(self.items.get_item(SLOT_FUEL));
                self.data.lit_time_remaining = duration;
                self.data.lit_total_time = duration;
                if self.is_lit() {
                    changed = true;
                    self.consume_fuel();
                }
            }

            if self.is_lit() && self.can_burn(recipe.as_ref()) {
                self.data.cooking_timer = self.data.cooking_timer.saturating_add(1);
                if self.data.cooking_timer >= self.data.cooking_total_time {
                    self.data.cooking_timer = 0;
                    self.burn(recipe.as_ref());
                    self.data.cooking_total_time = self.total_cook_time();
                    changed = true;
                }
            } else {
                self.data.cooking_timer = 0;
            }
        } else if !self.is_lit() && self.data.cooking_timer > 0 {
            self.data.cooking_timer = self
                .data
                .cooking_timer
                .saturating_sub(2)
                .clamp(0, self.data.cooking_total_time.max(0));
        }

        if was_lit != self.is_lit() {
            changed = true;
            let state = self
                .base
                .state
                .set_value(&BlockStateProperties::LIT, self.is_lit());
            world.update_block_state_in_place(self.base.pos, state);
            self.base.state = state;
        }

        if changed {
            BlockEntity::set_changed(self);
        }
    }
}

impl ContainerData for FurnaceBlockEntity {
    fn get(&self, index: usize) -> i32 {
        self.data.get(index)
    }

    fn set(&mut self, index: usize, value: i32) {
        self.data.set(index, value);
    }

    fn count(&self) -> usize {
        FurnaceData::NUM_DATA_VALUES
    }
}

impl Container for FurnaceBlockEntity {
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
        let same = !stack.is_empty()
            && ItemStack::is_same_item_same_components(self.items.get_item(slot), &stack);
        self.items.set_item(slot, stack);
        if !self.items.take_changed() {
            return;
        }

        if slot == SLOT_INPUT && !same {
            self.data.cooking_total_time = self.total_cook_time();
            self.data.cooking_timer = 0;
        }
        BlockEntity::set_changed(self);
    }

    fn set_changed(&mut self) {
        BlockEntity::set_changed(self);
    }

    fn can_place_item(&self, slot: usize, stack: &ItemStack) -> bool {
        match slot {
            SLOT_INPUT => true,
            SLOT_FUEL => {
                self.rules.is_fuel(stack)
                    || (stack.is(&vanilla_items::BUCKET)
                        && !self.items.get_item(SLOT_FUEL).is(&vanilla_items::BUCKET))
            }
            _ => false,
        }
    }

    fn as_worldly(&self) -> Option<&dyn WorldlyContainer> {
        Some(self)
    }
}

impl WorldlyContainer for FurnaceBlockEntity {
    fn slots_for_face(&self, face: Direction) -> FaceSlots {
        match face {
            Direction::Up => smallvec![SLOT_INPUT],
            Direction::Down => smallvec![SLOT_RESULT, SLOT_FUEL],
            _ => smallvec![SLOT_FUEL],
        }
    }

    fn can_place_item_through_face(
        &self,
        slot: usize,
        stack: &ItemStack,
        _face: Option<Direction>,
    ) -> bool {
        self.can_place_item(slot, stack)
    }

    fn can_take_item_through_face(&self, slot: usize, stack: &ItemStack, face: Direction) -> bool {
        face != Direction::Down
            || slot != SLOT_FUEL
            || stack.is(&vanilla_items::WATER_BUCKET)
            || stack.is(&vanilla_items::BUCKET)
    }
}

impl Lockable for FurnaceBlockEntity {
    fn lock_code(&self) -> &LockCode {
        &self.container.lock_key
    }
}

const LIT_TIME_REMAINING_TAG: &str = "lit_time_remaining";
const LIT_TOTAL_TIME_TAG: &str = "lit_total_time";
const COOKING_TIME_SPENT_TAG: &str = "cooking_time_spent";
const COOKING_TOTAL_TIME_TAG: &str = "cooking_total_time";

fn read_timer(nbt: &NbtCompound, tag: &str, pos: BlockPos) -> i32 {
    let value = get_i32(nbt, tag).unwrap_or(0);
    if value < 0 {
        log::warn!("Furnace at {pos} had {tag} {value}, resetting");
        return 0;
    }
    value
}

impl BlockEntity for FurnaceBlockEntity {
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
        let pos = self.base.pos;
        self.data = FurnaceData {
            lit_time_remaining: read_timer(nbt, LIT_TIME_REMAINING_TAG, pos),
            lit_total_time: read_timer(nbt, LIT_TOTAL_TIME_TAG, pos),
            cooking_timer: read_timer(nbt, COOKING_TIME_SPENT_TAG, pos),
            cooking_total_time: read_timer(nbt, COOKING_TOTAL_TIME_TAG, pos),
        };
    }

    fn save_additional(&self, nbt: &mut NbtCompound) {
        nbt.insert(LIT_TIME_REMAINING_TAG, NbtTag::Int(self.data.lit_time_remaining));
        nbt.insert(LIT_TOTAL_TIME_TAG, NbtTag::Int(self.data.lit_total_time));
        nbt.insert(COOKING_TIME_SPENT_TAG, NbtTag::Int(self.data.cooking_timer));
        nbt.insert(COOKING_TOTAL_TIME_TAG, NbtTag::Int(self.data.cooking_total_time));
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

    fn is_ticking(&self) -> bool {
        true
    }

    fn tick(&mut self, world: &World) {
        self.server_tick(world);
    }

    fn set_level(&mut self, world: &World) {
        self.rules = world.shared_recipes();
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
