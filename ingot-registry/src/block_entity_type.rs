use std::hash::{Hash, Hasher};
use std::ptr;

use ingot_utils::Identifier;
use rustc_hash::FxHashMap;

use crate::blocks::{BlockRef, BlockState};
use crate::{RegistryError, RegistryExt};

/// A kind of block entity and the blocks it may be attached to.
#[derive(Debug)]
pub struct BlockEntityType {
    /// Registry key, written as `id` in persisted block entities.
    pub key: Identifier,
    /// Blocks this type is valid for.
    pub valid_blocks: &'static [BlockRef],
}

/// A reference to a registered block entity type.
pub type BlockEntityTypeRef = &'static BlockEntityType;

impl BlockEntityType {
    /// Whether a block entity of this type may live in a cell holding `state`.
    #[must_use]
    pub fn is_valid(&self, state: &BlockState) -> bool {
        self.valid_blocks.iter().any(|block| state.is(block))
    }
}

impl PartialEq for BlockEntityType {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other) || self.key == other.key
    }
}

impl Eq for BlockEntityType {}

impl Hash for BlockEntityType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Block entity types by key.
pub struct BlockEntityTypeRegistry {
    by_key: FxHashMap<Identifier, BlockEntityTypeRef>,
    allows_registering: bool,
}

impl Default for BlockEntityTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockEntityTypeRegistry {
    /// An empty registry accepting entries.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_key: FxHashMap::default(),
            allows_registering: true,
        }
    }

    /// Adds a type.
    pub fn register(&mut self, ty: BlockEntityTypeRef) -> Result<(), RegistryError> {
        if !self.allows_registering {
            return Err(RegistryError::Frozen(ty.key.clone()));
        }
        if self.by_key.contains_key(&ty.key) {
            return Err(RegistryError::DuplicateKey(ty.key.clone()));
        }
        self.by_key.insert(ty.key.clone(), ty);
        Ok(())
    }

    /// Looks a type up by key.
    #[must_use]
    pub fn by_key(&self, key: &Identifier) -> Option<BlockEntityTypeRef> {
        self.by_key.get(key).copied()
    }
}

impl RegistryExt for BlockEntityTypeRegistry {
    fn freeze(&mut self) {
        self.allows_registering = false;
    }
}

/// The vanilla block entity types.
#[allow(missing_docs)]
pub mod vanilla_block_entity_types {
    use ingot_utils::Identifier;

    use super::{BlockEntityType, BlockEntityTypeRegistry};
    use crate::blocks::vanilla_blocks;

    macro_rules! block_entity_types {
        ($($name:ident = $path:literal, [$($block:ident),+];)*) => {
            $(
                pub static $name: BlockEntityType = BlockEntityType {
                    key: Identifier::vanilla_static($path),
                    valid_blocks: &[$(&vanilla_blocks::$block),+],
                };
            )*

            pub(crate) fn register_block_entity_types(registry: &mut BlockEntityTypeRegistry) {
                $(
                    if let Err(err) = registry.register(&$name) {
                        log::error!("Failed to register block entity type: {err}");
                    }
                )*
            }
        };
    }

    block_entity_types! {
        HOPPER = "hopper", [HOPPER];
        CHEST = "chest", [CHEST];
        BARREL = "barrel", [BARREL];
        FURNACE = "furnace", [FURNACE];
        DROPPER = "dropper", [DROPPER];
        DECORATED_POT = "decorated_pot", [DECORATED_POT];
    }
}

#[cfg(test)]
mod tests {
    use super::vanilla_block_entity_types::{CHEST, HOPPER};
    use crate::blocks::vanilla_blocks;

    #[test]
    fn test_is_valid() {
        assert!(HOPPER.is_valid(&vanilla_blocks::HOPPER.default_state()));
        assert!(!HOPPER.is_valid(&vanilla_blocks::CHEST.default_state()));
        assert!(CHEST.is_valid(&vanilla_blocks::CHEST.default_state()));
    }
}
