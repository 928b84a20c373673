//! The entities the engine interacts with: viewers and loose items.

mod item_entity;
mod viewer;

pub use item_entity::{ItemEntity, SharedItemEntity};
pub use viewer::Viewer;
