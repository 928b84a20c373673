//! Block entities: the mutable, persistent objects attached to single blocks.
//!
//! A block entity is shared as a [`SharedBlockEntity`] and only ever mutated under
//! its lock. Capabilities such as holding items or tracking viewers are discovered
//! through the `as_*` accessors rather than by concrete type.

use std::any::Any;
use std::mem;
use std::sync::{Arc, LazyLock};

use ingot_registry::REGISTRY;
use ingot_registry::block_entity_type::{BlockEntityTypeRef, vanilla_block_entity_types};
use ingot_registry::blocks::BlockState;
use ingot_registry::data_components::DataComponentMap;
use ingot_registry::nbt::{get_compound, get_string};
use ingot_utils::locks::SyncMutex;
use ingot_utils::{BlockPos, Identifier};
use rustc_hash::FxHashMap;
use simdnbt::owned::{NbtCompound, NbtTag};
use thiserror::Error;

use crate::inventory::Container;
use crate::inventory::lock::Lockable;
use crate::inventory::viewer_tracker::ViewableContainer;
use crate::world::World;

mod base_container;
pub mod components;
pub mod entities;

pub use base_container::BaseContainer;
pub use components::DataComponentInput;

/// A block entity behind its lock.
pub type SharedBlockEntity = Arc<SyncMutex<dyn BlockEntity>>;

/// Errors raised while creating block entities.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockEntityError {
    /// The block at the position can't carry a block entity of this type.
    #[error("block entity {ty} is not valid for {state} at {pos}")]
    InvalidBlockState {
        /// The requested type.
        ty: Identifier,
        /// The offending state.
        state: String,
        /// Where the block entity was to be created.
        pos: BlockPos,
    },
    /// No constructor is registered for the type.
    #[error("no block entity constructor for {0}")]
    UnknownType(Identifier),
}

/// State every block entity carries.
#[derive(Debug, Clone)]
pub struct BlockEntityBase {
    ty: BlockEntityTypeRef,
    pos: BlockPos,
    state: BlockState,
    removed: bool,
    changed: bool,
    components: DataComponentMap,
}

impl BlockEntityBase {
    /// Validates that `state` can carry a block entity of type `ty`.
    pub fn new(
        ty: BlockEntityTypeRef,
        pos: BlockPos,
        state: BlockState,
    ) -> Result<Self, BlockEntityError> {
        if !ty.is_valid(&state) {
            return Err(BlockEntityError::InvalidBlockState {
                ty: ty.key.clone(),
                state: state.to_string(),
                pos,
            });
        }
        Ok(Self {
            ty,
            pos,
            state,
            removed: false,
            changed: false,
            components: DataComponentMap::new(),
        })
    }
}

/// A block entity.
///
/// Implementors hold a [`BlockEntityBase`] and expose it through [`BlockEntity::base`]
/// and [`BlockEntity::base_mut`]; the bookkeeping methods are provided on top of it.
pub trait BlockEntity: Send + Sync {
    /// Returns self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns self as mutable `Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The shared block entity state.
    fn base(&self) -> &BlockEntityBase;

    /// The shared block entity state, mutably.
    fn base_mut(&mut self) -> &mut BlockEntityBase;

    /// The block entity type.
    fn get_type(&self) -> BlockEntityTypeRef {
        self.base().ty
    }

    /// Where the block entity lives.
    fn get_block_pos(&self) -> BlockPos {
        self.base().pos
    }

    /// The block state of the owning cell as last seen.
    fn get_block_state(&self) -> BlockState {
        self.base().state
    }

    /// Updates the cached block state after the world changed it.
    fn set_block_state(&mut self, state: BlockState) {
        self.base_mut().state = state;
    }

    /// Whether the block entity has been detached from the world.
    fn is_removed(&self) -> bool {
        self.base().removed
    }

    /// Detaches the block entity from the world.
    fn set_removed(&mut self) {
        self.base_mut().removed = true;
    }

    /// Reattaches the block entity, when its chunk is loaded again.
    fn clear_removed(&mut self) {
        self.base_mut().removed = false;
    }

    /// Flags the block entity as needing a save and a client resync.
    fn set_changed(&mut self) {
        self.base_mut().changed = true;
    }

    /// Whether [`BlockEntity::set_changed`] was called since the last drain.
    fn has_changed(&self) -> bool {
        self.base().changed
    }

    /// Clears the changed flag and returns what it was.
    fn take_changed(&mut self) -> bool {
        mem::take(&mut self.base_mut().changed)
    }

    /// Components carried over from the item the block was placed with.
    fn components(&self) -> &DataComponentMap {
        &self.base().components
    }

    /// Replaces the carried components.
    fn set_components(&mut self, components: DataComponentMap) {
        self.base_mut().components = components;
    }

    /// Reads type specific fields. Missing fields keep their defaults.
    fn load_additional(&mut self, _nbt: &NbtCompound) {}

    /// Writes type specific fields.
    fn save_additional(&self, _nbt: &mut NbtCompound) {}

    /// The data clients need to render the block entity.
    fn get_update_tag(&self) -> NbtCompound {
        NbtCompound::new()
    }

    /// Reads component values this block entity keeps as its own fields.
    fn apply_implicit_components(&mut self, _input: &mut DataComponentInput<'_>) {}

    /// Writes the fields read by [`BlockEntity::apply_implicit_components`] back as
    /// components.
    fn collect_implicit_components(&self, _components: &mut DataComponentMap) {}

    /// Strips the fields that [`BlockEntity::collect_implicit_components`] covers from
    /// a saved tree, so item data doesn't duplicate them.
    fn remove_components_from_tag(&self, _nbt: &mut NbtCompound) {}

    /// Whether the world should call [`BlockEntity::tick`].
    fn is_ticking(&self) -> bool {
        false
    }

    /// Advances the block entity by one game tick.
    fn tick(&mut self, _world: &World) {}

    /// Called when the block entity is attached to `world`, before its first tick.
    fn set_level(&mut self, _world: &World) {}

    /// Runs before the block entity is detached because its block went away.
    fn pre_remove_side_effects(&mut self, world: &World) {
        let pos = self.get_block_pos();
        if let Some(container) = self.as_container_mut() {
            world.drop_contents(pos, container);
        }
    }

    /// The item slots, if this block entity has any.
    fn as_container(&self) -> Option<&dyn Container> {
        None
    }

    /// The item slots, mutably.
    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        None
    }

    /// Viewer tracking, for containers that animate when opened.
    fn as_viewable_mut(&mut self) -> Option<&mut dyn ViewableContainer> {
        None
    }

    /// The lock, for containers that can be locked.
    fn as_lockable(&self) -> Option<&dyn Lockable> {
        None
    }
}

/// Constructs a block entity of one type.
pub type BlockEntityConstructor = fn(BlockPos, BlockState) -> Result<SharedBlockEntity, BlockEntityError>;

/// Block entity constructors by type.
pub struct BlockEntityRegistry {
    constructors: FxHashMap<Identifier, BlockEntityConstructor>,
}

impl BlockEntityRegistry {
    fn new() -> Self {
        Self {
            constructors: FxHashMap::default(),
        }
    }

    fn register(&mut self, ty: BlockEntityTypeRef, constructor: BlockEntityConstructor) {
        self.constructors.insert(ty.key.clone(), constructor);
    }

    /// Creates a block entity of type `ty`.
    pub fn create(
        &self,
        ty: BlockEntityTypeRef,
        pos: BlockPos,
        state: BlockState,
    ) -> Result<SharedBlockEntity, BlockEntityError> {
        let constructor = self
            .constructors
            .get(&ty.key)
            .ok_or_else(|| BlockEntityError::UnknownType(ty.key.clone()))?;
        constructor(pos, state)
    }
}

fn shared<T: BlockEntity + 'static>(
    result: Result<T, BlockEntityError>,
) -> Result<SharedBlockEntity, BlockEntityError> {
    Ok(Arc::new(SyncMutex::new(result?)))
}

/// The constructors of every vanilla block entity type.
pub static BLOCK_ENTITIES: LazyLock<BlockEntityRegistry> = LazyLock::new(|| {
    use entities::{
        BarrelBlockEntity, ChestBlockEntity, DecoratedPotBlockEntity, DropperBlockEntity,
        FurnaceBlockEntity, HopperBlockEntity,
    };

    let mut registry = BlockEntityRegistry::new();
    registry.register(&vanilla_block_entity_types::HOPPER, |pos, state| {
        shared(HopperBlockEntity::new(pos, state))
    });
    registry.register(&vanilla_block_entity_types::CHEST, |pos, state| {
        shared(ChestBlockEntity::new(pos, state))
    });
    registry.register(&vanilla_block_entity_types::BARREL, |pos, state| {
        shared(BarrelBlockEntity::new(pos, state))
    });
    registry.register(&vanilla_block_entity_types::FURNACE, |pos, state| {
        shared(FurnaceBlockEntity::new(pos, state))
    });
    registry.register(&vanilla_block_entity_types::DROPPER, |pos, state| {
        shared(DropperBlockEntity::new(pos, state))
    });
    registry.register(&vanilla_block_entity_types::DECORATED_POT, |pos, state| {
        shared(DecoratedPotBlockEntity::new(pos, state))
    });
    registry
});

const COMPONENTS_TAG: &str = "components";

/// Saves the type specific fields and the carried components.
#[must_use]
pub fn save_without_metadata(block_entity: &dyn BlockEntity) -> NbtCompound {
    let mut nbt = NbtCompound::new();
    block_entity.save_additional(&mut nbt);
    let components = block_entity.components();
    if !components.is_empty() {
        nbt.insert(COMPONENTS_TAG, NbtTag::Compound(components.to_nbt()));
    }
    nbt
}

/// Saves everything needed to recreate the block entity: its `id`, its
/// position as `x`, `y`, `z`, and [`save_without_metadata`].
#[must_use]
pub fn save_with_id(block_entity: &dyn BlockEntity) -> NbtCompound {
    let mut nbt = save_without_metadata(block_entity);
    let pos = block_entity.get_block_pos();
    nbt.insert("id", NbtTag::String(block_entity.get_type().key.to_string().into()));
    nbt.insert("x", NbtTag::Int(pos.x()));
    nbt.insert("y", NbtTag::Int(pos.y()));
    nbt.insert("z", NbtTag::Int(pos.z()));
    nbt
}

/// Reads type specific fields and carried components into an existing block entity.
pub fn load_with_components(block_entity: &mut dyn BlockEntity, nbt: &NbtCompound) {
    block_entity.load_additional(nbt);
    let components = get_compound(nbt, COMPONENTS_TAG)
        .map(DataComponentMap::from_nbt)
        .unwrap_or_default();
    block_entity.set_components(components);
}

/// Recreates a block entity from a tree written by [`save_with_id`].
///
/// A missing or unknown `id`, or an `id` that doesn't fit `state`, is logged and
/// yields `None`; the caller continues without the block entity.
#[must_use]
pub fn load_static(pos: BlockPos, state: BlockState, nbt: &NbtCompound) -> Option<SharedBlockEntity> {
    let Some(id) = get_string(nbt, "id") else {
        log::error!("Skipping block entity at {pos} without an id");
        return None;
    };
    let Some(ty) = id
        .parse::<Identifier>()
        .ok()
        .and_then(|key| REGISTRY.block_entity_types.by_key(&key))
    else {
        log::error!("Skipping block entity at {pos} with unknown type {id}");
        return None;
    };

    match BLOCK_ENTITIES.create(ty, pos, state) {
        Ok(block_entity) => {
            load_with_components(&mut *block_entity.lock(), nbt);
            Some(block_entity)
        }
        Err(err) => {
            log::error!("Failed to load block entity {id}: {err}");
            None
        }
    }
}
