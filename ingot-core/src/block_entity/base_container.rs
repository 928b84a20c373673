use ingot_registry::data_components::vanilla_components::{CONTAINER, CUSTOM_NAME, LOCK};
use ingot_registry::data_components::{DataComponentMap, ItemContainerContents};
use ingot_registry::item_stack::ItemStack;
use ingot_registry::nbt::get_string;
use simdnbt::owned::{NbtCompound, NbtTag};

use super::DataComponentInput;
use crate::inventory::lock::LockCode;

const CUSTOM_NAME_TAG: &str = "CustomName";
const ITEMS_TAG: &str = "Items";
const LOCK_TAG: &str = "lock";

/// The name and lock every named container block entity carries, along with the
/// component mapping for them and the slot contents.
#[derive(Debug, Clone, Default)]
pub struct BaseContainer {
    /// The name given to the container.
    pub name: Option<String>,
    /// The lock guarding it.
    pub lock_key: LockCode,
}

impl BaseContainer {
    /// Reads `CustomName` and `lock`.
    pub fn load(&mut self, nbt: &NbtCompound) {
        self.name = get_string(nbt, CUSTOM_NAME_TAG);
        self.lock_key = LockCode::from_tag(nbt);
    }

    /// Writes `CustomName` and `lock` when set.
    pub fn save(&self, nbt: &mut NbtCompound) {
        if let Some(name) = &self.name {
            nbt.insert(CUSTOM_NAME_TAG, NbtTag::String(name.clone().into()));
        }
        self.lock_key.add_to_tag(nbt);
    }

    /// Takes the name, the lock and the slot contents from item components.
    pub fn apply_implicit_components(
        &mut self,
        input: &mut DataComponentInput<'_>,
        items: &mut [ItemStack],
    ) {
        self.name = input.get(&CUSTOM_NAME).cloned();
        self.lock_key = input.get(&LOCK).map_or(LockCode::NO_LOCK, |key| LockCode::new(key.clone()));
        input.get_or_default(&CONTAINER).copy_into(items);
    }

    /// Writes the name, the lock and the slot contents as item components.
    pub fn collect_implicit_components(&self, components: &mut DataComponentMap, items: &[ItemStack]) {
        if let Some(name) = &self.name {
            components.set(&CUSTOM_NAME, name.clone());
        }
        if let Some(key) = self.lock_key.key() {
            components.set(&LOCK, key.to_string());
        }
        components.set(&CONTAINER, ItemContainerContents::from_items(items));
    }

    /// Drops the fields the components cover.
    pub fn remove_components_from_tag(nbt: &mut NbtCompound) {
        nbt.remove(CUSTOM_NAME_TAG);
        nbt.remove(ITEMS_TAG);
        nbt.remove(LOCK_TAG);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load() {
        let base = BaseContainer {
            name: Some("Stash".to_string()),
            lock_key: LockCode::new("key"),
        };
        let mut nbt = NbtCompound::new();
        base.save(&mut nbt);

        let mut loaded = BaseContainer::default();
        loaded.load(&nbt);
        assert_eq!(loaded.name.as_deref(), Some("Stash"));
        assert_eq!(loaded.lock_key, LockCode::new("key"));

        BaseContainer::remove_components_from_tag(&mut nbt);
        assert!(nbt.get(CUSTOM_NAME_TAG).is_none());
        assert!(nbt.get(LOCK_TAG).is_none());
    }
}
