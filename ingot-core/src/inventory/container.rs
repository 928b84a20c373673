//! The slot container contract.

use ingot_registry::item_stack::ItemStack;
use ingot_registry::nbt::{compound_list, get_compound_list, get_i32};
use ingot_utils::Direction;
use simdnbt::owned::{NbtCompound, NbtTag};
use smallvec::SmallVec;

use crate::transfer::TransferCooldown;

/// Slot indices exposed on one face.
pub type FaceSlots = SmallVec<[usize; 27]>;

/// A trait for objects that store items in slots.
///
/// This is the base abstraction for anything that holds items: chests, furnaces,
/// hoppers, decorated pots. Every slot mutation goes through it so the dirty flag
/// and the stack limits stay consistent.
pub trait Container: Send + Sync {
    /// Returns the number of slots in this container.
    fn get_container_size(&self) -> usize;

    /// Returns true if all slots are empty.
    fn is_empty(&self) -> bool {
        (0..self.get_container_size()).all(|slot| self.get_item(slot).is_empty())
    }

    /// Gets the item in the given slot.
    fn get_item(&self, slot: usize) -> &ItemStack;

    /// Gets a mutable reference to the item in the given slot.
    ///
    /// Writes through this reference don't mark the container changed.
    ///
    /// # Panics
    /// If `slot` is not below [`Container::get_container_size`].
    fn get_item_mut(&mut self, slot: usize) -> &mut ItemStack;

    /// Whether `slot` exists in this container.
    fn is_valid_slot(&self, slot: usize) -> bool {
        slot < self.get_container_size()
    }

    /// Removes up to `count` items from the given slot and returns them. Missing
    /// slots hold nothing.
    fn remove_item(&mut self, slot: usize, count: i32) -> ItemStack {
        if count <= 0 || !self.is_valid_slot(slot) {
            return ItemStack::empty();
        }
        let result = self.get_item_mut(slot).split(count);
        if !result.is_empty() {
            self.set_changed();
        }
        result
    }

    /// Removes and returns the entire stack from the given slot without triggering updates.
    fn remove_item_no_update(&mut self, slot: usize) -> ItemStack {
        if !self.is_valid_slot(slot) {
            return ItemStack::empty();
        }
        self.get_item_mut(slot).take()
    }

    /// Replaces the stack in `slot`, clamping it to the slot limit, and marks the
    /// container changed.
    fn set_item(&mut self, slot: usize, stack: ItemStack);

    /// Returns the maximum stack size this container allows.
    fn get_max_stack_size(&self) -> i32 {
        99
    }

    /// Returns the maximum stack size for a specific item in this container.
    fn max_stack_size_for(&self, stack: &ItemStack) -> i32 {
        self.get_max_stack_size().min(stack.max_stack_size())
    }

    /// Called when the container contents change.
    fn set_changed(&mut self);

    /// Clears all items from this container.
    fn clear_content(&mut self) {
        for slot in 0..self.get_container_size() {
            *self.get_item_mut(slot) = ItemStack::empty();
        }
        self.set_changed();
    }

    /// Returns whether `stack` may be placed in `slot`.
    fn can_place_item(&self, _slot: usize, _stack: &ItemStack) -> bool {
        true
    }

    /// Returns whether `stack` may be taken out of `slot` into `target`.
    fn can_take_item(&self, _target: &dyn Container, _slot: usize, _stack: &ItemStack) -> bool {
        true
    }

    /// Merges `stack` into `slot` as far as the slot allows and returns what did
    /// not fit. Only changes the slot if `can_place_item` allows it; a missing slot
    /// hands the whole stack back.
    fn insert(&mut self, slot: usize, mut stack: ItemStack) -> ItemStack {
        if stack.is_empty() || !self.is_valid_slot(slot) || !self.can_place_item(slot, &stack) {
            return stack;
        }
        let limit = self.max_stack_size_for(&stack);
        let current = self.get_item(slot);

        if current.is_empty() {
            let moved = stack.split(limit);
            self.set_item(slot, moved);
            return stack;
        }

        if !ItemStack::is_same_item_same_components(current, &stack) {
            return stack;
        }
        let moved = (limit - current.count()).min(stack.count());
        if moved <= 0 {
            return stack;
        }
        stack.shrink(moved);
        self.get_item_mut(slot).grow(moved);
        self.set_changed();
        stack
    }

    /// The number of `stack`'s item held across all slots.
    fn count_item(&self, stack: &ItemStack) -> i32 {
        (0..self.get_container_size())
            .map(|slot| self.get_item(slot))
            .filter(|held| ItemStack::is_same_item(held, stack))
            .map(ItemStack::count)
            .sum()
    }

    /// The face-restricted view of this container, if it has one.
    fn as_worldly(&self) -> Option<&dyn WorldlyContainer> {
        None
    }

    /// The transfer cooldown of this container, if it keeps one.
    fn transfer_cooldown_mut(&mut self) -> Option<&mut dyn TransferCooldown> {
        None
    }
}

/// A container that exposes different slots on different faces.
pub trait WorldlyContainer: Container {
    /// The slots reachable through `face`, in the order transfers visit them.
    fn slots_for_face(&self, face: Direction) -> FaceSlots;

    /// Whether `stack` may enter `slot` through `face`. `None` means no face, such
    /// as an item dropped straight in.
    fn can_place_item_through_face(
        &self,
        slot: usize,
        stack: &ItemStack,
        face: Option<Direction>,
    ) -> bool;

    /// Whether `stack` may leave `slot` through `face`.
    fn can_take_item_through_face(&self, slot: usize, stack: &ItemStack, face: Direction) -> bool;
}

/// Comparator output for a container: 0 when empty, otherwise 1 to 15 by fullness.
#[must_use]
pub fn calculate_redstone_signal_from_container(container: &dyn Container) -> i32 {
    let size = container.get_container_size();
    if size == 0 {
        return 0;
    }
    let mut fullness = 0.0_f32;
    for slot in 0..size {
        let stack = container.get_item(slot);
        if !stack.is_empty() {
            fullness += stack.count() as f32 / container.max_stack_size_for(stack) as f32;
        }
    }
    fullness /= size as f32;
    lerp_discrete(fullness, 0, 15)
}

fn lerp_discrete(delta: f32, start: i32, end: i32) -> i32 {
    let range = end - start;
    start + (delta * (range - 1) as f32).floor() as i32 + i32::from(delta > 0.0)
}

/// Writes the non-empty slots as an `Items` list of stacks tagged with `Slot`.
/// With `always_put` unset, an all-empty container writes nothing.
pub fn save_all_items(nbt: &mut NbtCompound, items: &[ItemStack], always_put: bool) {
    let entries: Vec<NbtCompound> = items
        .iter()
        .enumerate()
        .filter(|(_, stack)| !stack.is_empty())
        .map(|(slot, stack)| {
            let mut entry = stack.to_nbt();
            entry.insert("Slot", NbtTag::Byte(slot as i8));
            entry
        })
        .collect();
    if !entries.is_empty() || always_put {
        nbt.insert("Items", compound_list(entries));
    }
}

/// Reads an `Items` list written by [`save_all_items`]. Slots not in the list are
/// left untouched; entries with an out of range slot or an unknown item are skipped.
pub fn load_all_items(nbt: &NbtCompound, items: &mut [ItemStack]) {
    let Some(entries) = get_compound_list(nbt, "Items") else {
        return;
    };
    for entry in entries {
        let Some(slot) = get_i32(entry, "Slot").map(|slot| slot & 0xFF) else {
            log::warn!("Skipping stored item without a slot");
            continue;
        };
        let slot = slot as usize;
        if slot >= items.len() {
            log::warn!("Skipping stored item for slot {slot} of {}", items.len());
            continue;
        }
        if let Some(stack) = ItemStack::from_nbt(entry) {
            items[slot] = stack;
        }
    }
}
