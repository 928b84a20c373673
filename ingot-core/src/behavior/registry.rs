//! Block behaviour registry for looking up behaviours by block.

use std::sync::OnceLock;

use ingot_registry::block_entity_type::vanilla_block_entity_types;
use ingot_registry::blocks::{Block, BlockRef, vanilla_blocks};
use ingot_utils::Identifier;
use rustc_hash::FxHashMap;

use super::block::{BlockBehaviour, DefaultBlock};
use super::blocks::{ContainerBlock, DropperBlock, HopperBlock};

static DEFAULT_BEHAVIOUR: DefaultBlock = DefaultBlock;
static HOPPER_BEHAVIOUR: HopperBlock = HopperBlock::new(&vanilla_blocks::HOPPER);
static DROPPER_BEHAVIOUR: DropperBlock = DropperBlock::new(&vanilla_blocks::DROPPER);
static CHEST_BEHAVIOUR: ContainerBlock = ContainerBlock::new(&vanilla_block_entity_types::CHEST);
static BARREL_BEHAVIOUR: ContainerBlock = ContainerBlock::new(&vanilla_block_entity_types::BARREL);
static FURNACE_BEHAVIOUR: ContainerBlock =
    ContainerBlock::new(&vanilla_block_entity_types::FURNACE);
static DECORATED_POT_BEHAVIOUR: ContainerBlock =
    ContainerBlock::new(&vanilla_block_entity_types::DECORATED_POT);

/// Registry for block behaviours, keyed by block.
pub struct BlockBehaviourRegistry {
    behaviors: FxHashMap<Identifier, &'static dyn BlockBehaviour>,
}

impl BlockBehaviourRegistry {
    /// Creates a new registry with all vanilla block behaviours assigned.
    fn new() -> Self {
        let mut registry = Self {
            behaviors: FxHashMap::default(),
        };
        registry.assign_behaviour(&vanilla_blocks::HOPPER, &HOPPER_BEHAVIOUR);
        registry.assign_behaviour(&vanilla_blocks::DROPPER, &DROPPER_BEHAVIOUR);
        registry.assign_behaviour(&vanilla_blocks::CHEST, &CHEST_BEHAVIOUR);
        registry.assign_behaviour(&vanilla_blocks::BARREL, &BARREL_BEHAVIOUR);
        registry.assign_behaviour(&vanilla_blocks::FURNACE, &FURNACE_BEHAVIOUR);
        registry.assign_behaviour(&vanilla_blocks::DECORATED_POT, &DECORATED_POT_BEHAVIOUR);
        registry
    }

    fn assign_behaviour(&mut self, block: &Block, behaviour: &'static dyn BlockBehaviour) {
        self.behaviors.insert(block.key.clone(), behaviour);
    }

    /// Gets the behaviour for a block.
    ///
    /// Returns the default behaviour for blocks without one.
    #[must_use]
    pub fn get_behavior(&self, block: BlockRef) -> &'static dyn BlockBehaviour {
        self.behaviors
            .get(&block.key)
            .copied()
            .unwrap_or(&DEFAULT_BEHAVIOUR)
    }
}

/// Global registry instance, lazily initialized.
static REGISTRY: OnceLock<BlockBehaviourRegistry> = OnceLock::new();

/// Gets the global block behaviour registry.
#[must_use]
pub fn get_behaviour_registry() -> &'static BlockBehaviourRegistry {
    REGISTRY.get_or_init(BlockBehaviourRegistry::new)
}

/// Gets the behaviour of `block`.
#[must_use]
pub fn get_behavior(block: BlockRef) -> &'static dyn BlockBehaviour {
    get_behaviour_registry().get_behavior(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_entity_blocks() {
        for block in [
            &vanilla_blocks::HOPPER,
            &vanilla_blocks::CHEST,
            &vanilla_blocks::BARREL,
            &vanilla_blocks::FURNACE,
            &vanilla_blocks::DROPPER,
            &vanilla_blocks::DECORATED_POT,
        ] {
            assert!(get_behavior(block).has_block_entity(), "{}", block.key);
            assert!(get_behavior(block).has_analog_output_signal(block.default_state()));
        }
        assert!(!get_behavior(&vanilla_blocks::STONE).has_block_entity());
        assert!(!get_behavior(&vanilla_blocks::AIR).has_block_entity());
    }
}
