//! Block behavior implementations for vanilla blocks.

mod container_block;
mod dropper_block;
mod hopper_block;

pub use container_block::ContainerBlock;
pub use dropper_block::{DropperBlock, TRIGGER_DELAY};
pub use hopper_block::HopperBlock;
