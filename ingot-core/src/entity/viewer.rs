use ingot_registry::item_stack::ItemStack;
use ingot_utils::BlockPos;
use ingot_utils::math::Vector3;
use uuid::Uuid;

/// Default reach of a survival viewer.
pub const DEFAULT_INTERACTION_RANGE: f64 = 4.5;

/// Someone able to open containers. Menus and networking live elsewhere; the engine
/// only needs to know where viewers are and what they're looking into.
#[derive(Debug, Clone)]
pub struct Viewer {
    /// Stable identity.
    pub id: Uuid,
    /// Feet position.
    pub position: Vector3<f64>,
    /// Spectators can look into containers without being counted.
    pub spectator: bool,
    /// How far the viewer can reach.
    pub interaction_range: f64,
    /// The container this viewer has open.
    pub open_container: Option<BlockPos>,
    /// The item in hand, checked against container locks.
    pub held_item: ItemStack,
}

impl Viewer {
    /// A viewer at `position` with nothing open.
    #[must_use]
    pub fn new(id: Uuid, position: Vector3<f64>) -> Self {
        Self {
            id,
            position,
            spectator: false,
            interaction_range: DEFAULT_INTERACTION_RANGE,
            open_container: None,
            held_item: ItemStack::empty(),
        }
    }

    /// Whether this viewer has the container at `pos` open.
    #[must_use]
    pub fn has_open(&self, pos: BlockPos) -> bool {
        self.open_container == Some(pos)
    }
}
