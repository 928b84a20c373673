//! # Ingot core
//!
//! The block entity tick engine: containers and their transfer rules, hoppers,
//! viewer tracking, persistence of block entities with their data components, and
//! scheduled block ticks, all driven one game tick at a time by [`world::World`].

pub mod behavior;
pub mod block_entity;
pub mod chunk_saver;
pub mod config;
pub mod entity;
pub mod inventory;
pub mod recipe;
pub mod ticks;
pub mod transfer;
pub mod world;
