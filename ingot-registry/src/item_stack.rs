//! Item stacks: an item kind, a count and per-stack component overrides.

use std::mem;

use ingot_utils::Identifier;
use simdnbt::owned::{NbtCompound, NbtTag};

use crate::REGISTRY;
use crate::data_components::{
    DataComponentKind, DataComponentPatch, DataComponentType, EMPTY_COMPONENTS,
    PatchedDataComponentMap,
    vanilla_components::{CUSTOM_NAME, MAX_STACK_SIZE},
};
use crate::items::{ItemRef, vanilla_items};
use crate::nbt::{get_compound, get_i32, get_string};

/// A quantity of one item kind.
///
/// A stack whose count drops to zero (or whose item is air) is empty, and all empty
/// stacks compare equal whatever item or components they were left with.
#[derive(Debug, Clone)]
pub struct ItemStack {
    item: ItemRef,
    count: i32,
    components: PatchedDataComponentMap,
}

static EMPTY: ItemStack = ItemStack {
    item: &vanilla_items::AIR,
    count: 0,
    components: PatchedDataComponentMap {
        prototype: &EMPTY_COMPONENTS,
        patch: DataComponentPatch::new(),
    },
};

impl PartialEq for ItemStack {
    fn eq(&self, other: &Self) -> bool {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => true,
            (false, false) => {
                self.count == other.count
                    && self.item == other.item
                    && self.components == other.components
            }
            _ => false,
        }
    }
}

impl Default for ItemStack {
    fn default() -> Self {
        Self::empty()
    }
}

impl ItemStack {
    /// The canonical empty stack.
    #[must_use]
    pub fn empty() -> Self {
        EMPTY.clone()
    }

    /// A shared empty stack for returning by reference.
    #[must_use]
    pub fn empty_ref() -> &'static Self {
        &EMPTY
    }

    /// One of `item`.
    #[must_use]
    pub fn new(item: ItemRef) -> Self {
        Self::with_count(item, 1)
    }

    /// `count` of `item`.
    #[must_use]
    pub fn with_count(item: ItemRef, count: i32) -> Self {
        Self {
            item,
            count,
            components: PatchedDataComponentMap::new(item.components()),
        }
    }

    /// `count` of `item` with `patch` applied to the item's prototype.
    #[must_use]
    pub fn with_count_and_patch(item: ItemRef, count: i32, patch: DataComponentPatch) -> Self {
        Self {
            item,
            count,
            components: PatchedDataComponentMap::from_patch(item.components(), patch),
        }
    }

    /// Whether the stack holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item.is_air() || self.count <= 0
    }

    /// The item kind. Air for empty stacks.
    #[must_use]
    pub fn item(&self) -> ItemRef {
        if self.is_empty() {
            &vanilla_items::AIR
        } else {
            self.item
        }
    }

    /// Whether this stack holds `item`.
    #[must_use]
    pub fn is(&self, item: ItemRef) -> bool {
        self.item() == item
    }

    /// The count, zero when empty.
    #[must_use]
    pub fn count(&self) -> i32 {
        if self.is_empty() { 0 } else { self.count }
    }

    /// Sets the count. Zero or less empties the stack.
    pub fn set_count(&mut self, count: i32) {
        self.count = count;
    }

    /// Clamps the count to `max`.
    pub fn limit_size(&mut self, max: i32) {
        if !self.is_empty() && self.count > max {
            self.count = max;
        }
    }

    /// Adds to the count.
    pub fn grow(&mut self, amount: i32) {
        self.count += amount;
    }

    /// Removes from the count.
    pub fn shrink(&mut self, amount: i32) {
        self.count -= amount;
    }

    /// Takes up to `amount` off this stack and returns them as a new stack.
    #[must_use]
    pub fn split(&mut self, amount: i32) -> Self {
        let taken = amount.min(self.count());
        if taken <= 0 {
            return Self::empty();
        }
        let result = self.copy_with_count(taken);
        self.shrink(taken);
        result
    }

    /// A copy with a different count.
    #[must_use]
    pub fn copy_with_count(&self, count: i32) -> Self {
        if self.is_empty() {
            return Self::empty();
        }
        let mut copy = self.clone();
        copy.count = count;
        copy
    }

    /// Moves the contents out, leaving this stack empty.
    #[must_use]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// The stack limit from components, falling back to 1.
    #[must_use]
    pub fn max_stack_size(&self) -> i32 {
        self.components.get_or_default(&MAX_STACK_SIZE)
    }

    /// Whether more than one fits in a stack.
    #[must_use]
    pub fn is_stackable(&self) -> bool {
        self.max_stack_size() > 1
    }

    /// Same item kind.
    #[must_use]
    pub fn is_same_item(a: &Self, b: &Self) -> bool {
        a.item() == b.item()
    }

    /// Same item kind and the same components, so the two can merge.
    #[must_use]
    pub fn is_same_item_same_components(a: &Self, b: &Self) -> bool {
        if !Self::is_same_item(a, b) {
            return false;
        }
        if a.is_empty() && b.is_empty() {
            return true;
        }
        a.components == b.components
    }

    /// Reads a component.
    pub fn get<T>(&self, ty: &DataComponentType<T>) -> Option<&T> {
        self.components.get(ty)
    }

    /// Writes a component.
    pub fn set<T>(&mut self, ty: &DataComponentType<T>, value: T) {
        self.components.set(ty, value);
    }

    /// Removes a component.
    pub fn remove(&mut self, kind: DataComponentKind) {
        self.components.remove(kind);
    }

    /// The full component view.
    #[must_use]
    pub fn components(&self) -> &PatchedDataComponentMap {
        &self.components
    }

    /// The overrides relative to the item's prototype.
    #[must_use]
    pub fn components_patch(&self) -> &DataComponentPatch {
        self.components.patch()
    }

    /// The custom name, if one is set.
    #[must_use]
    pub fn custom_name(&self) -> Option<&str> {
        self.get(&CUSTOM_NAME).map(String::as_str)
    }

    /// Encodes the stack as `{id, count, components}`. Empty stacks encode as an
    /// empty compound.
    #[must_use]
    pub fn to_nbt(&self) -> NbtCompound {
        let mut nbt = NbtCompound::new();
        if self.is_empty() {
            return nbt;
        }
        nbt.insert("id", NbtTag::String(self.item.key.to_string().into()));
        nbt.insert("count", NbtTag::Int(self.count));
        let patch = self.components.patch();
        if !patch.is_empty() {
            nbt.insert("components", NbtTag::Compound(patch.to_nbt()));
        }
        nbt
    }

    /// Decodes a stack. Returns `None` for a missing or unknown item id.
    #[must_use]
    pub fn from_nbt(nbt: &NbtCompound) -> Option<Self> {
        let id = get_string(nbt, "id")?;
        let Some(item) = id
            .parse::<Identifier>()
            .ok()
            .and_then(|key| REGISTRY.items.by_key(&key))
        else {
            log::warn!("Skipping item stack with unknown id {id}");
            return None;
        };

        let count = get_i32(nbt, "count").unwrap_or(1);
        let patch = get_compound(nbt, "components")
            .map(DataComponentPatch::from_nbt)
            .unwrap_or_default();

        Some(Self::with_count_and_patch(item, count, patch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_components::vanilla_components::DAMAGE;
    use crate::items::vanilla_items::{COAL, DIAMOND_SWORD, ENDER_PEARL, STONE};

    #[test]
    fn test_empty_normalization() {
        let mut stack = ItemStack::with_count(&STONE, 2);
        stack.shrink(2);
        assert!(stack.is_empty());
        assert_eq!(stack.count(), 0);
        assert!(stack.item().is_air());
        assert!(ItemStack::is_same_item_same_components(
            &stack,
            &ItemStack::empty()
        ));
    }

    #[test]
    fn test_drained_stacks_equal_empty() {
        let mut shrunk = ItemStack::with_count(&STONE, 2);
        shrunk.set(&DAMAGE, 4);
        shrunk.shrink(2);
        assert_eq!(shrunk, ItemStack::empty());

        let mut split = ItemStack::with_count(&COAL, 3);
        let taken = split.split(3);
        assert_eq!(split, ItemStack::empty());
        assert_eq!(split, shrunk);
        assert_ne!(taken, ItemStack::empty());
        assert_eq!(taken, ItemStack::with_count(&COAL, 3));
        assert_ne!(taken, ItemStack::with_count(&COAL, 2));
    }

    #[test]
    fn test_split() {
        let mut stack = ItemStack::with_count(&COAL, 5);
        let taken = stack.split(2);
        assert_eq!(taken.count(), 2);
        assert_eq!(stack.count(), 3);

        let rest = stack.split(10);
        assert_eq!(rest.count(), 3);
        assert!(stack.is_empty());
        assert!(stack.split(1).is_empty());
    }

    #[test]
    fn test_max_stack_size() {
        assert_eq!(ItemStack::new(&STONE).max_stack_size(), 64);
        assert_eq!(ItemStack::new(&ENDER_PEARL).max_stack_size(), 16);
        assert!(!ItemStack::new(&DIAMOND_SWORD).is_stackable());

        let mut custom = ItemStack::new(&STONE);
        custom.set(&MAX_STACK_SIZE, 8);
        assert_eq!(custom.max_stack_size(), 8);
    }

    #[test]
    fn test_component_equality() {
        let plain = ItemStack::new(&STONE);
        let mut named = ItemStack::new(&STONE);
        named.set(&CUSTOM_NAME, "Rock".to_string());
        assert!(ItemStack::is_same_item(&plain, &named));
        assert!(!ItemStack::is_same_item_same_components(&plain, &named));

        named.remove(DataComponentKind::CustomName);
        assert!(ItemStack::is_same_item_same_components(&plain, &named));
    }

    #[test]
    fn test_nbt_round_trip_keeps_components() {
        let mut sword = ItemStack::new(&DIAMOND_SWORD);
        sword.set(&DAMAGE, 12);
        sword.set(&CUSTOM_NAME, "Edge".to_string());

        let decoded = ItemStack::from_nbt(&sword.to_nbt()).expect("sword decodes");
        assert_eq!(decoded, sword);
        assert_eq!(decoded.get(&DAMAGE), Some(&12));
    }

    #[test]
    fn test_unknown_item_is_skipped() {
        let mut nbt = NbtCompound::new();
        nbt.insert("id", NbtTag::String("minecraft:not_an_item".to_string().into()));
        assert!(ItemStack::from_nbt(&nbt).is_none());
        assert!(ItemStack::from_nbt(&NbtCompound::new()).is_none());
    }
}
