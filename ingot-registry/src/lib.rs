//! Static game content: items, blocks, block entity types and data components.
//!
//! Everything here is immutable after startup and addressed through `&'static`
//! references, so comparisons between entries are cheap.

use std::sync::LazyLock;

use ingot_utils::Identifier;
use thiserror::Error;

pub mod block_entity_type;
pub mod blocks;
pub mod data_components;
pub mod item_stack;
pub mod items;
pub mod nbt;

use block_entity_type::BlockEntityTypeRegistry;
use blocks::BlockRegistry;
use items::ItemRegistry;

/// Errors raised while building a registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The same key was registered twice.
    #[error("duplicate registry key {0}")]
    DuplicateKey(Identifier),
    /// The registry no longer accepts entries.
    #[error("cannot register {0} after the registry is frozen")]
    Frozen(Identifier),
}

/// Common behaviour of the individual registries.
pub trait RegistryExt {
    /// Stops the registry from accepting new entries.
    fn freeze(&mut self);
}

/// All registries the engine reads from.
pub struct Registry {
    /// Items by key.
    pub items: ItemRegistry,
    /// Blocks by key.
    pub blocks: BlockRegistry,
    /// Block entity types by key.
    pub block_entity_types: BlockEntityTypeRegistry,
}

impl Registry {
    /// Builds and freezes the registries holding the vanilla content.
    #[must_use]
    pub fn new_vanilla() -> Self {
        let mut registry = Self {
            items: ItemRegistry::new(),
            blocks: BlockRegistry::new(),
            block_entity_types: BlockEntityTypeRegistry::new(),
        };

        items::vanilla_items::register_items(&mut registry.items);
        blocks::vanilla_blocks::register_blocks(&mut registry.blocks);
        block_entity_type::vanilla_block_entity_types::register_block_entity_types(
            &mut registry.block_entity_types,
        );

        registry.items.freeze();
        registry.blocks.freeze();
        registry.block_entity_types.freeze();
        registry
    }
}

/// The global vanilla registry.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new_vanilla);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vanilla_lookup() {
        let hopper = REGISTRY
            .blocks
            .by_key(&Identifier::vanilla_static("hopper"))
            .expect("hopper is registered");
        assert_eq!(hopper, &blocks::vanilla_blocks::HOPPER);

        let bucket = REGISTRY
            .items
            .by_key(&"minecraft:bucket".parse().expect("valid identifier"))
            .expect("bucket is registered");
        assert_eq!(bucket, &items::vanilla_items::BUCKET);

        assert!(
            REGISTRY
                .block_entity_types
                .by_key(&Identifier::vanilla_static("furnace"))
                .is_some()
        );
    }
}
