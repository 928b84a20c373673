//! # Ingot
//!
//! Runs a small smelting line for a configured number of game ticks and prints a
//! summary of where every item ended up.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use ingot_core::config::EngineConfig;
use ingot_core::entity::Viewer;
use ingot_core::recipe::SmeltingTable;
use ingot_core::world::{World, WorldEvent};
use ingot_registry::blocks::{BlockState, BlockStateProperties, vanilla_blocks};
use ingot_registry::item_stack::ItemStack;
use ingot_registry::items::vanilla_items;
use ingot_utils::math::Vector3;
use ingot_utils::types::UpdateFlags;
use ingot_utils::{BlockPos, ChunkPos, Direction};
use serde::Serialize;
use tracing::subscriber::set_global_default;
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const CONFIG_PATH: &str = "config/ingot_config.json5";

const ORE_CHEST: BlockPos = BlockPos::new(2, 66, 2);
const FUEL_CHEST: BlockPos = BlockPos::new(4, 65, 2);
const OUTPUT_CHEST: BlockPos = BlockPos::new(3, 62, 2);
const FURNACE: BlockPos = BlockPos::new(3, 64, 2);
const DROPPER: BlockPos = BlockPos::new(6, 64, 2);
const DROPPER_TARGET: BlockPos = BlockPos::new(7, 64, 2);
const LEVER: BlockPos = BlockPos::new(6, 64, 1);

#[derive(Serialize)]
struct Summary {
    game_time: u64,
    containers: BTreeMap<String, Vec<String>>,
    item_entities: usize,
    events: BTreeMap<&'static str, usize>,
}

fn init_logging() -> Result<()> {
    LogTracer::init().context("failed to bridge log records")?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    set_global_default(subscriber).context("failed to install subscriber")?;
    Ok(())
}

fn facing(state: BlockState, direction: Direction) -> BlockState {
    if state.is(&vanilla_blocks::HOPPER) {
        state.set_value(&BlockStateProperties::FACING_HOPPER, direction)
    } else {
        state.set_value(&BlockStateProperties::FACING, direction)
    }
}

fn place(world: &World, pos: BlockPos, state: BlockState) -> Result<()> {
    if !world.set_block(pos, state, UpdateFlags::UPDATE_ALL) {
        bail!("couldn't place {} at {pos}", state.get_block().key);
    }
    Ok(())
}

fn fill(world: &World, pos: BlockPos, stacks: &[ItemStack]) -> Result<()> {
    let block_entity = world
        .get_block_entity(pos)
        .with_context(|| format!("no block entity at {pos}"))?;
    let mut guard = block_entity.lock();
    let container = guard
        .as_container_mut()
        .with_context(|| format!("block entity at {pos} isn't a container"))?;
    for (slot, stack) in stacks.iter().enumerate() {
        container.set_item(slot, stack.clone());
    }
    container.set_changed();
    Ok(())
}

/// Ore and fuel chests feed a furnace through hoppers, a hopper under the furnace
/// empties it into an output chest, and a dropper pushes into a pot on a pulse.
fn build_line(world: &World) -> Result<()> {
    let hopper = vanilla_blocks::HOPPER.default_state();
    let chest = vanilla_blocks::CHEST.default_state();

    place(world, ORE_CHEST, chest)?;
    place(world, ORE_CHEST.below(), facing(hopper, Direction::East))?;
    place(world, BlockPos::new(3, 65, 2), hopper)?;
    place(world, FURNACE, vanilla_blocks::FURNACE.default_state())?;
    place(world, FUEL_CHEST, chest)?;
    place(world, FUEL_CHEST.below(), facing(hopper, Direction::West))?;
    place(world, FURNACE.below(), hopper)?;
    place(world, OUTPUT_CHEST, chest)?;

    place(
        world,
        DROPPER,
        facing(vanilla_blocks::DROPPER.default_state(), Direction::East),
    )?;
    place(world, DROPPER_TARGET, vanilla_blocks::DECORATED_POT.default_state())?;

    fill(
        world,
        ORE_CHEST,
        &[ItemStack::with_count(&vanilla_items::RAW_IRON, 16)],
    )?;
    fill(world, FUEL_CHEST, &[ItemStack::with_count(&vanilla_items::COAL, 4)])?;
    fill(
        world,
        DROPPER,
        &[
            ItemStack::with_count(&vanilla_items::STONE, 3),
            ItemStack::with_count(&vanilla_items::DIRT, 2),
        ],
    )
}

fn event_name(event: &WorldEvent) -> &'static str {
    match event {
        WorldEvent::BlockEntityChanged { .. } => "block_entity_changed",
        WorldEvent::ContainerOpened { .. } => "container_opened",
        WorldEvent::ContainerClosed { .. } => "container_closed",
        WorldEvent::Sound { .. } => "sound",
        WorldEvent::BlockEvent { .. } => "block_event",
        WorldEvent::BlockChanged { .. } => "block_changed",
        WorldEvent::AnalogOutputChanged { .. } => "analog_output_changed",
        WorldEvent::ItemDropped { .. } => "item_dropped",
    }
}

fn describe(world: &World, pos: BlockPos) -> Vec<String> {
    let Some(block_entity) = world.get_block_entity(pos) else {
        return Vec::new();
    };
    let guard = block_entity.lock();
    let Some(container) = guard.as_container() else {
        return Vec::new();
    };
    (0..container.get_container_size())
        .map(|slot| container.get_item(slot))
        .filter(|stack| !stack.is_empty())
        .map(|stack| format!("{} x{}", stack.item().key, stack.count()))
        .collect()
}

fn main() -> Result<()> {
    init_logging()?;

    let config = EngineConfig::load_or_create(Path::new(CONFIG_PATH))
        .with_context(|| format!("failed to load {CONFIG_PATH}"))?;
    let ticks = config.simulation_ticks;
    let recipes = SmeltingTable::new()
        .with_recipe(
            &vanilla_items::RAW_IRON,
            ItemStack::new(&vanilla_items::IRON_INGOT),
            200,
        )
        .with_fuel(&vanilla_items::COAL, 1600);
    let world = World::with_recipes(config, Arc::new(recipes));

    if !world.load_chunk(ChunkPos::new(0, 0)) {
        bail!("couldn't load the spawn chunk");
    }
    build_line(&world)?;

    let viewer = Uuid::new_v4();
    world.add_viewer(Viewer::new(viewer, Vector3::new(3.5, 62.0, 4.5)));

    let mut events = BTreeMap::new();
    log::info!("Running {ticks} ticks");
    for _ in 0..ticks {
        match world.game_time() {
            10 => {
                world.start_open(viewer, OUTPUT_CHEST);
            }
            20 => world.set_powered(LEVER, true),
            40 => {
                world.stop_open(viewer);
                world.set_powered(LEVER, false);
            }
            _ => {}
        }
        world.tick();
        for event in world.drain_events() {
            *events.entry(event_name(&event)).or_insert(0) += 1;
        }
    }

    let containers = [
        ("ore_chest", ORE_CHEST),
        ("fuel_chest", FUEL_CHEST),
        ("furnace", FURNACE),
        ("output_chest", OUTPUT_CHEST),
        ("dropper", DROPPER),
        ("decorated_pot", DROPPER_TARGET),
    ]
    .into_iter()
    .map(|(name, pos)| (name.to_string(), describe(&world, pos)))
    .collect();

    let summary = Summary {
        game_time: world.game_time(),
        containers,
        item_entities: world.item_entity_count(),
        events,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
