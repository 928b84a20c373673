use std::hash::{Hash, Hasher};
use std::ptr;
use std::sync::LazyLock;

use ingot_utils::Identifier;
use rustc_hash::FxHashMap;

use crate::data_components::DataComponentMap;
use crate::{RegistryError, RegistryExt};

/// An item kind.
#[derive(Debug)]
pub struct Item {
    /// Registry key.
    pub key: Identifier,
    /// Components every stack of this item starts with.
    pub components: LazyLock<DataComponentMap>,
    /// What is left behind when the item is consumed as an ingredient or fuel.
    pub crafting_remainder: Option<ItemRef>,
}

/// A reference to a registered item.
pub type ItemRef = &'static Item;

impl Item {
    /// The prototype components.
    #[must_use]
    pub fn components(&'static self) -> &'static DataComponentMap {
        &self.components
    }

    /// Whether this is the air item, which empty stacks carry.
    #[must_use]
    pub fn is_air(&self) -> bool {
        ptr::eq(self, &vanilla_items::AIR)
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other) || self.key == other.key
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Items by key.
pub struct ItemRegistry {
    by_key: FxHashMap<Identifier, ItemRef>,
    allows_registering: bool,
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemRegistry {
    /// An empty registry accepting entries.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_key: FxHashMap::default(),
            allows_registering: true,
        }
    }

    /// Adds an item.
    pub fn register(&mut self, item: ItemRef) -> Result<(), RegistryError> {
        if !self.allows_registering {
            return Err(RegistryError::Frozen(item.key.clone()));
        }
        if self.by_key.contains_key(&item.key) {
            return Err(RegistryError::DuplicateKey(item.key.clone()));
        }
        self.by_key.insert(item.key.clone(), item);
        Ok(())
    }

    /// Looks an item up by key.
    #[must_use]
    pub fn by_key(&self, key: &Identifier) -> Option<ItemRef> {
        self.by_key.get(key).copied()
    }

    /// Number of registered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl RegistryExt for ItemRegistry {
    fn freeze(&mut self) {
        self.allows_registering = false;
    }
}

/// The vanilla items the engine ships with.
#[allow(missing_docs)]
pub mod vanilla_items {
    use std::sync::LazyLock;

    use ingot_utils::Identifier;

    use super::{Item, ItemRegistry};
    use crate::data_components::vanilla_components::{
        CONTAINER, DAMAGE, MAX_STACK_SIZE, REPAIR_COST,
    };
    use crate::data_components::{DataComponentMap, ItemContainerContents};

    fn stackable(size: i32) -> DataComponentMap {
        DataComponentMap::new().with(&MAX_STACK_SIZE, size)
    }

    fn tool() -> DataComponentMap {
        stackable(1).with(&DAMAGE, 0).with(&REPAIR_COST, 0)
    }

    /// Items that place a container carry empty contents, so a broken empty
    /// container stacks with a fresh one.
    fn holds_items(size: i32) -> DataComponentMap {
        stackable(size).with(&CONTAINER, ItemContainerContents::default())
    }

    macro_rules! items {
        ($($name:ident = $path:literal, $components:expr $(, remainder = $remainder:ident)?;)*) => {
            $(
                pub static $name: Item = Item {
                    key: Identifier::vanilla_static($path),
                    components: LazyLock::new(|| $components),
                    crafting_remainder: items!(@remainder $($remainder)?),
                };
            )*

            pub(crate) fn register_items(registry: &mut ItemRegistry) {
                $(
                    if let Err(err) = registry.register(&$name) {
                        log::error!("Failed to register item: {err}");
                    }
                )*
            }
        };
        (@remainder $remainder:ident) => { Some(&$remainder) };
        (@remainder) => { None };
    }

    items! {
        AIR = "air", stackable(64);
        STONE = "stone", stackable(64);
        COBBLESTONE = "cobblestone", stackable(64);
        DIRT = "dirt", stackable(64);
        OAK_PLANKS = "oak_planks", stackable(64);
        RAW_IRON = "raw_iron", stackable(64);
        IRON_ORE = "iron_ore", stackable(64);
        IRON_INGOT = "iron_ingot", stackable(64);
        COAL = "coal", stackable(64);
        CHARCOAL = "charcoal", stackable(64);
        BUCKET = "bucket", stackable(16);
        WATER_BUCKET = "water_bucket", stackable(1), remainder = BUCKET;
        LAVA_BUCKET = "lava_bucket", stackable(1), remainder = BUCKET;
        ENDER_PEARL = "ender_pearl", stackable(16);
        DIAMOND_SWORD = "diamond_sword", tool();
        HOPPER = "hopper", holds_items(64);
        CHEST = "chest", holds_items(64);
        BARREL = "barrel", holds_items(64);
        FURNACE = "furnace", holds_items(64);
        DROPPER = "dropper", holds_items(64);
        DECORATED_POT = "decorated_pot", holds_items(1);
    }
}
