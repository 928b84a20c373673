//! Slot containers and the pieces built around them.

pub mod container;
pub mod container_data;
pub mod lock;
pub mod simple_container;
pub mod viewer_tracker;

pub use container::{Container, WorldlyContainer};
pub use simple_container::SimpleContainer;
