//! Blocks and their states.
//!
//! A [`BlockState`] is a small value: the block plus the handful of properties the
//! engine's blocks use. Which properties are meaningful for a block is listed in
//! [`Block::properties`]; the others keep their defaults and are never persisted.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;

use ingot_utils::{Direction, Identifier};
use rustc_hash::FxHashMap;

use crate::{RegistryError, RegistryExt};

/// The properties a block state can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// Any of the six directions.
    Facing,
    /// Any direction but up.
    FacingHopper,
    /// One of the four horizontal directions.
    HorizontalFacing,
    /// Hopper is not locked by redstone.
    Enabled,
    /// Container lid is open.
    Open,
    /// Dispenser style blocks waiting for a scheduled tick.
    Triggered,
    /// Furnace is burning.
    Lit,
}

/// A block kind.
#[derive(Debug)]
pub struct Block {
    /// Registry key.
    pub key: Identifier,
    /// The properties this block's states use.
    pub properties: &'static [PropertyKind],
    /// Whether the block fills its whole cell. Full blocks stop hoppers below from
    /// picking up item entities.
    pub solid: bool,
    /// The facing of the default state.
    pub default_facing: Direction,
}

/// A reference to a registered block.
pub type BlockRef = &'static Block;

impl Block {
    /// The state a freshly placed block starts with.
    #[must_use]
    pub const fn default_state(&'static self) -> BlockState {
        BlockState {
            block: self,
            facing: self.default_facing,
            enabled: true,
            open: false,
            triggered: false,
            lit: false,
        }
    }

    /// Whether states of this block carry `property`.
    #[must_use]
    pub fn has_property(&self, property: PropertyKind) -> bool {
        self.properties.contains(&property)
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other) || self.key == other.key
    }
}

impl Eq for Block {}

impl Hash for Block {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// A block together with its property values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockState {
    block: BlockRef,
    facing: Direction,
    enabled: bool,
    open: bool,
    triggered: bool,
    lit: bool,
}

impl BlockState {
    /// The block.
    #[must_use]
    pub fn get_block(&self) -> BlockRef {
        self.block
    }

    /// Whether this is a state of `block`.
    #[must_use]
    pub fn is(&self, block: BlockRef) -> bool {
        self.block == block
    }

    /// Whether this is air.
    #[must_use]
    pub fn is_air(&self) -> bool {
        self.is(&vanilla_blocks::AIR)
    }

    /// Reads a property.
    #[must_use]
    pub fn get_value<P: Property>(&self, property: &P) -> P::Value {
        property.value(self)
    }

    /// Returns a copy with a property changed.
    #[must_use]
    pub fn set_value<P: Property>(self, property: &P, value: P::Value) -> Self {
        property.with(self, value)
    }

    /// The persisted `(name, value)` pairs of this state.
    #[must_use]
    pub fn properties(&self) -> Vec<(&'static str, String)> {
        self.block
            .properties
            .iter()
            .map(|kind| {
                let value = match kind {
                    PropertyKind::Facing
                    | PropertyKind::FacingHopper
                    | PropertyKind::HorizontalFacing => self.facing.name().to_string(),
                    PropertyKind::Enabled => self.enabled.to_string(),
                    PropertyKind::Open => self.open.to_string(),
                    PropertyKind::Triggered => self.triggered.to_string(),
                    PropertyKind::Lit => self.lit.to_string(),
                };
                (property_name(*kind), value)
            })
            .collect()
    }

    /// Returns a copy with the named property parsed from `value`. Unknown names and
    /// values the block does not allow yield `None`.
    #[must_use]
    pub fn with_property_str(self, name: &str, value: &str) -> Option<Self> {
        let kind = *self
            .block
            .properties
            .iter()
            .find(|kind| property_name(**kind) == name)?;
        match kind {
            PropertyKind::Facing => Some(self.set_value(
                &BlockStateProperties::FACING,
                BlockStateProperties::FACING.parse(value)?,
            )),
            PropertyKind::FacingHopper => Some(self.set_value(
                &BlockStateProperties::FACING_HOPPER,
                BlockStateProperties::FACING_HOPPER.parse(value)?,
            )),
            PropertyKind::HorizontalFacing => Some(self.set_value(
                &BlockStateProperties::HORIZONTAL_FACING,
                BlockStateProperties::HORIZONTAL_FACING.parse(value)?,
            )),
            PropertyKind::Enabled
            | PropertyKind::Open
            | PropertyKind::Triggered
            | PropertyKind::Lit => {
                let property = BooleanProperty { kind };
                Some(self.set_value(&property, property.parse(value)?))
            }
        }
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.block.key)?;
        let properties = self.properties();
        if !properties.is_empty() {
            let joined: Vec<String> = properties
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            write!(f, "[{}]", joined.join(","))?;
        }
        Ok(())
    }
}

const fn property_name(kind: PropertyKind) -> &'static str {
    match kind {
        PropertyKind::Facing | PropertyKind::FacingHopper | PropertyKind::HorizontalFacing => {
            "facing"
        }
        PropertyKind::Enabled => "enabled",
        PropertyKind::Open => "open",
        PropertyKind::Triggered => "triggered",
        PropertyKind::Lit => "lit",
    }
}

/// Typed access to one block state property.
pub trait Property {
    /// The value type.
    type Value: Copy;

    /// Reads the value from a state.
    fn value(&self, state: &BlockState) -> Self::Value;

    /// Returns a copy of `state` with the value replaced.
    fn with(&self, state: BlockState, value: Self::Value) -> BlockState;

    /// Parses a persisted value.
    fn parse(&self, value: &str) -> Option<Self::Value>;
}

/// A direction valued property.
pub struct DirectionProperty {
    allowed: &'static [Direction],
}

impl Property for DirectionProperty {
    type Value = Direction;

    fn value(&self, state: &BlockState) -> Direction {
        state.facing
    }

    fn with(&self, mut state: BlockState, value: Direction) -> BlockState {
        if self.allowed.contains(&value) {
            state.facing = value;
        } else {
            log::warn!("Ignoring facing {value} not allowed for {}", state.block.key);
        }
        state
    }

    fn parse(&self, value: &str) -> Option<Direction> {
        Direction::by_name(value).filter(|direction| self.allowed.contains(direction))
    }
}

/// A boolean property.
pub struct BooleanProperty {
    kind: PropertyKind,
}

impl Property for BooleanProperty {
    type Value = bool;

    fn value(&self, state: &BlockState) -> bool {
        match self.kind {
            PropertyKind::Enabled => state.enabled,
            PropertyKind::Open => state.open,
            PropertyKind::Triggered => state.triggered,
            PropertyKind::Lit => state.lit,
            _ => false,
        }
    }

    fn with(&self, mut state: BlockState, value: bool) -> BlockState {
        match self.kind {
            PropertyKind::Enabled => state.enabled = value,
            PropertyKind::Open => state.open = value,
            PropertyKind::Triggered => state.triggered = value,
            PropertyKind::Lit => state.lit = value,
            _ => {}
        }
        state
    }

    fn parse(&self, value: &str) -> Option<bool> {
        value.parse().ok()
    }
}

/// The properties used by the engine's blocks.
pub struct BlockStateProperties;

impl BlockStateProperties {
    /// `facing` with all six directions.
    pub const FACING: DirectionProperty = DirectionProperty {
        allowed: &Direction::ALL,
    };
    /// `facing` for hoppers, which can't point up.
    pub const FACING_HOPPER: DirectionProperty = DirectionProperty {
        allowed: &[
            Direction::Down,
            Direction::North,
            Direction::South,
            Direction::West,
            Direction::East,
        ],
    };
    /// `facing` restricted to the horizontal plane.
    pub const HORIZONTAL_FACING: DirectionProperty = DirectionProperty {
        allowed: &Direction::HORIZONTAL,
    };
    /// `enabled`
    pub const ENABLED: BooleanProperty = BooleanProperty {
        kind: PropertyKind::Enabled,
    };
    /// `open`
    pub const OPEN: BooleanProperty = BooleanProperty {
        kind: PropertyKind::Open,
    };
    /// `triggered`
    pub const TRIGGERED: BooleanProperty = BooleanProperty {
        kind: PropertyKind::Triggered,
    };
    /// `lit`
    pub const LIT: BooleanProperty = BooleanProperty {
        kind: PropertyKind::Lit,
    };
}

/// Blocks by key.
pub struct BlockRegistry {
    by_key: FxHashMap<Identifier, BlockRef>,
    allows_registering: bool,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    /// An empty registry accepting entries.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_key: FxHashMap::default(),
            allows_registering: true,
        }
    }

    /// Adds a block.
    pub fn register(&mut self, block: BlockRef) -> Result<(), RegistryError> {
        if !self.allows_registering {
            return Err(RegistryError::Frozen(block.key.clone()));
        }
        if self.by_key.contains_key(&block.key) {
            return Err(RegistryError::DuplicateKey(block.key.clone()));
        }
        self.by_key.insert(block.key.clone(), block);
        Ok(())
    }

    /// Looks a block up by key.
    #[must_use]
    pub fn by_key(&self, key: &Identifier) -> Option<BlockRef> {
        self.by_key.get(key).copied()
    }

    /// Resolves a block and applies persisted properties. Unknown properties are
    /// ignored with a warning; an unknown block yields `None`.
    #[must_use]
    pub fn state_from_properties(
        &self,
        key: &Identifier,
        properties: &[(&str, &str)],
    ) -> Option<BlockState> {
        let block = self.by_key(key)?;
        let mut state = block.default_state();
        for (name, value) in properties {
            match state.with_property_str(name, value) {
                Some(next) => state = next,
                None => log::warn!("Ignoring property {name}={value} for {key}"),
            }
        }
        Some(state)
    }
}

impl RegistryExt for BlockRegistry {
    fn freeze(&mut self) {
        self.allows_registering = false;
    }
}

/// The vanilla blocks the engine ships with.
#[allow(missing_docs)]
pub mod vanilla_blocks {
    use ingot_utils::{Direction, Identifier};

    use super::{Block, BlockRegistry, PropertyKind};

    macro_rules! blocks {
        ($($name:ident = $path:literal, solid: $solid:literal, facing: $facing:ident, [$($property:ident),*];)*) => {
            $(
                pub static $name: Block = Block {
                    key: Identifier::vanilla_static($path),
                    properties: &[$(PropertyKind::$property),*],
                    solid: $solid,
                    default_facing: Direction::$facing,
                };
            )*

            pub(crate) fn register_blocks(registry: &mut BlockRegistry) {
                $(
                    if let Err(err) = registry.register(&$name) {
                        log::error!("Failed to register block: {err}");
                    }
                )*
            }
        };
    }

    blocks! {
        AIR = "air", solid: false, facing: North, [];
        STONE = "stone", solid: true, facing: North, [];
        GLASS = "glass", solid: false, facing: North, [];
        HOPPER = "hopper", solid: false, facing: Down, [FacingHopper, Enabled];
        CHEST = "chest", solid: false, facing: North, [HorizontalFacing];
        BARREL = "barrel", solid: true, facing: North, [Facing, Open];
        FURNACE = "furnace", solid: true, facing: North, [HorizontalFacing, Lit];
        DROPPER = "dropper", solid: true, facing: North, [Facing, Triggered];
        DECORATED_POT = "decorated_pot", solid: false, facing: North, [HorizontalFacing];
    }
}
