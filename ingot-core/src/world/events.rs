//! What the world reports to the outside after it changes.

use ingot_registry::blocks::{BlockRef, BlockState};
use ingot_registry::item_stack::ItemStack;
use ingot_utils::BlockPos;
use ingot_utils::math::Vector3;
use simdnbt::owned::NbtCompound;
use uuid::Uuid;

/// Sounds the engine asks to be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEvent {
    /// `block.chest.open`
    ChestOpen,
    /// `block.chest.close`
    ChestClose,
    /// `block.chest.locked`
    ChestLocked,
    /// `block.barrel.open`
    BarrelOpen,
    /// `block.barrel.close`
    BarrelClose,
    /// `block.dispenser.dispense`
    DispenserDispense,
    /// `block.dispenser.fail`
    DispenserFail,
}

impl SoundEvent {
    /// The sound's registry path.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ChestOpen => "block.chest.open",
            Self::ChestClose => "block.chest.close",
            Self::ChestLocked => "block.chest.locked",
            Self::BarrelOpen => "block.barrel.open",
            Self::BarrelClose => "block.barrel.close",
            Self::DispenserDispense => "block.dispenser.dispense",
            Self::DispenserFail => "block.dispenser.fail",
        }
    }
}

/// A change observers may need to react to.
#[derive(Debug, Clone)]
pub enum WorldEvent {
    /// A block entity changed; clients should redraw it from `tag`.
    BlockEntityChanged {
        /// Position of the block entity.
        pos: BlockPos,
        /// The block entity's update tag.
        tag: NbtCompound,
    },
    /// The first viewer opened a container.
    ContainerOpened {
        /// Position of the container.
        pos: BlockPos,
        /// Who opened it, if known.
        viewer: Option<Uuid>,
    },
    /// The last viewer closed a container.
    ContainerClosed {
        /// Position of the container.
        pos: BlockPos,
        /// Who closed it, if known.
        viewer: Option<Uuid>,
    },
    /// A sound played at a block.
    Sound {
        /// Where.
        pos: BlockPos,
        /// What.
        sound: SoundEvent,
    },
    /// A block specific animation trigger, such as a chest lid moving.
    BlockEvent {
        /// Where.
        pos: BlockPos,
        /// The block receiving it.
        block: BlockRef,
        /// Event id.
        id: i32,
        /// Event parameter.
        param: i32,
    },
    /// A block state changed.
    BlockChanged {
        /// Where.
        pos: BlockPos,
        /// State before.
        old: BlockState,
        /// State after.
        new: BlockState,
    },
    /// The comparator reading of a block changed.
    AnalogOutputChanged {
        /// Where.
        pos: BlockPos,
        /// The new signal, 0 to 15.
        signal: i32,
    },
    /// An item entity appeared.
    ItemDropped {
        /// The entity.
        id: Uuid,
        /// Where it spawned.
        pos: Vector3<f64>,
        /// What it carries.
        item: ItemStack,
    },
}
