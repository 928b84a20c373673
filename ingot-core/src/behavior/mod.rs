//! Per-block behaviour: what happens when a block is placed, when its neighbours
//! change, when its scheduled tick fires, and which block entity it carries.

mod block;
pub mod blocks;
mod registry;

pub use block::{BlockBehaviour, DefaultBlock};
pub use registry::{BlockBehaviourRegistry, get_behavior, get_behaviour_registry};
