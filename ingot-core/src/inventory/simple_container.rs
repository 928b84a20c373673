//! A simple container implementation backed by a Vec.

use std::mem;

use ingot_registry::item_stack::ItemStack;
use simdnbt::owned::NbtCompound;

use super::Container;
use super::container::{load_all_items, save_all_items};

/// A simple container that stores items in a fixed-size vector.
///
/// Every container block entity keeps its slots in one of these and forwards
/// the [`Container`] contract to it, draining [`SimpleContainer::take_changed`]
/// into its own dirty flag.
#[derive(Debug, Clone)]
pub struct SimpleContainer {
    items: Vec<ItemStack>,
    changed: bool,
}

impl SimpleContainer {
    /// Creates a new container with the given number of slots.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            items: (0..size).map(|_| ItemStack::empty()).collect(),
            changed: false,
        }
    }

    /// Returns whether the container has been modified since the last check.
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// Clears the changed flag.
    pub fn clear_changed(&mut self) {
        self.changed = false;
    }

    /// Clears the changed flag and returns what it was.
    pub fn take_changed(&mut self) -> bool {
        mem::take(&mut self.changed)
    }

    /// The slots in order.
    #[must_use]
    pub fn items(&self) -> &[ItemStack] {
        &self.items
    }

    /// The slots in order, for bulk writes that bypass the changed flag.
    pub fn items_mut(&mut self) -> &mut [ItemStack] {
        &mut self.items
    }

    /// Writes the slots as an `Items` list.
    pub fn save(&self, nbt: &mut NbtCompound) {
        save_all_items(nbt, &self.items, true);
    }

    /// Reads an `Items` list, emptying every slot first.
    pub fn load(&mut self, nbt: &NbtCompound) {
        for slot in &mut self.items {
            *slot = ItemStack::empty();
        }
        load_all_items(nbt, &mut self.items);
    }
}

impl Container for SimpleContainer {
    fn get_container_size(&self) -> usize {
        self.items.len()
    }

    fn get_item(&self, slot: usize) -> &ItemStack {
        self.items.get(slot).unwrap_or(ItemStack::empty_ref())
    }

    fn get_item_mut(&mut self, slot: usize) -> &mut ItemStack {
        &mut self.items[slot]
    }

    fn set_item(&mut self, slot: usize, mut stack: ItemStack) {
        stack.limit_size(self.max_stack_size_for(&stack));
        let size = self.items.len();
        let Some(target) = self.items.get_mut(slot) else {
            log::warn!("Ignoring write to slot {slot} of a {size} slot container");
            return;
        };
        *target = stack;
        self.set_changed();
    }

    fn set_changed(&mut self) {
        self.changed = true;
    }
}

#[cfg(test)]
mod tests {
    use ingot_registry::items::vanilla_items::{COAL, STONE};

    use super::*;

    #[test]
    fn test_out_of_range_slot_reads_empty() {
        let mut container = SimpleContainer::new(2);
        assert!(container.get_item(5).is_empty());
        container.set_item(5, ItemStack::new(&STONE));
        assert!(container.is_empty());
        assert!(!container.has_changed());
    }

    #[test]
    fn test_save_load() {
        let mut container = SimpleContainer::new(3);
        container.set_item(1, ItemStack::with_count(&COAL, 12));

        let mut nbt = NbtCompound::new();
        container.save(&mut nbt);

        let mut loaded = SimpleContainer::new(3);
        loaded.set_item(0, ItemStack::new(&STONE));
        loaded.load(&nbt);
        assert_eq!(loaded.items(), container.items());
    }

    #[test]
    fn test_take_changed() {
        let mut container = SimpleContainer::new(1);
        container.set_item(0, ItemStack::new(&COAL));
        assert!(container.take_changed());
        assert!(!container.take_changed());
        container.items_mut()[0].shrink(1);
        assert!(!container.has_changed());
        assert!(container.is_empty());
    }

    #[test]
    fn test_clear_content() {
        let mut container = SimpleContainer::new(2);
        container.set_item(0, ItemStack::new(&STONE));
        container.clear_changed();
        container.clear_content();
        assert!(container.is_empty());
        assert!(container.has_changed());
    }
}
