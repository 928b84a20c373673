use std::sync::Arc;

use ingot_registry::item_stack::ItemStack;
use ingot_utils::locks::SyncMutex;
use ingot_utils::math::{AABB, Vector3};
use uuid::Uuid;

/// A loose item stack lying in the world.
#[derive(Debug, Clone)]
pub struct ItemEntity {
    id: Uuid,
    position: Vector3<f64>,
    item: ItemStack,
    removed: bool,
}

/// An item entity shared between the world and whoever is absorbing it.
pub type SharedItemEntity = Arc<SyncMutex<ItemEntity>>;

impl ItemEntity {
    const WIDTH: f64 = 0.25;
    const HEIGHT: f64 = 0.25;

    /// A new entity holding `item` at `position`.
    #[must_use]
    pub fn new(position: Vector3<f64>, item: ItemStack) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            item,
            removed: false,
        }
    }

    /// The entity's identity.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Feet position.
    #[must_use]
    pub fn position(&self) -> Vector3<f64> {
        self.position
    }

    /// The collision box.
    #[must_use]
    pub fn bounding_box(&self) -> AABB {
        AABB::at_feet(self.position, Self::WIDTH, Self::HEIGHT)
    }

    /// The carried stack.
    #[must_use]
    pub fn item(&self) -> &ItemStack {
        &self.item
    }

    /// Replaces the carried stack. An empty stack removes the entity.
    pub fn set_item(&mut self, item: ItemStack) {
        if item.is_empty() {
            self.discard();
        }
        self.item = item;
    }

    /// Marks the entity for removal.
    pub fn discard(&mut self) {
        self.removed = true;
    }

    /// Whether the entity still exists and carries something.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.removed && !self.item.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use ingot_registry::items::vanilla_items::STONE;

    use super::*;

    #[test]
    fn test_empty_item_discards() {
        let mut entity = ItemEntity::new(Vector3::new(0.5, 1.0, 0.5), ItemStack::new(&STONE));
        assert!(entity.is_alive());
        entity.set_item(ItemStack::empty());
        assert!(!entity.is_alive());
    }

    #[test]
    fn test_bounding_box() {
        let entity = ItemEntity::new(Vector3::new(0.5, 1.0, 0.5), ItemStack::new(&STONE));
        let bb = entity.bounding_box();
        assert!(bb.contains(Vector3::new(0.5, 1.1, 0.5)));
        assert!(!bb.contains(Vector3::new(0.5, 1.3, 0.5)));
    }
}
