//! The vanilla block entities the engine simulates.

mod barrel;
mod chest;
mod decorated_pot;
mod dropper;
mod furnace;
mod hopper;

pub use barrel::BarrelBlockEntity;
pub use chest::{ChestBlockEntity, LID_EVENT};
pub use decorated_pot::DecoratedPotBlockEntity;
pub use dropper::DropperBlockEntity;
pub use furnace::{FurnaceBlockEntity, SLOT_FUEL, SLOT_INPUT, SLOT_RESULT};
pub use hopper::HopperBlockEntity;
