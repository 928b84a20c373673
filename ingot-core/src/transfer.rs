//! Moving items between containers one unit at a time.
//!
//! Every move here splits the unit off the source, offers it to the destination
//! and puts back whatever was refused, so the total item count across both
//! containers never changes.

use ingot_registry::item_stack::ItemStack;
use ingot_utils::math::{AABB, Vector3};
use ingot_utils::{BlockPos, Direction};

use crate::block_entity::SharedBlockEntity;
use crate::entity::{ItemEntity, SharedItemEntity};
use crate::inventory::container::FaceSlots;
use crate::inventory::Container;
use crate::world::World;

/// Ticks a hopper waits after moving an item.
pub const MOVE_ITEM_SPEED: i32 = 8;

/// Cooldown state shared by containers that pace their transfers.
pub trait TransferCooldown {
    /// Whether the cooldown was set above the normal transfer delay.
    fn is_on_custom_cooldown(&self) -> bool;

    /// The game time of the container's last tick.
    fn ticked_game_time(&self) -> u64;

    /// Sets the cooldown.
    fn set_cooldown(&mut self, cooldown: i32);
}

/// The slots of `container` reachable through `face`.
#[must_use]
pub fn slots_for(container: &dyn Container, face: Direction) -> FaceSlots {
    match container.as_worldly() {
        Some(worldly) => worldly.slots_for_face(face),
        None => (0..container.get_container_size()).collect(),
    }
}

/// Whether every slot reachable through `face` is at its stack limit.
#[must_use]
pub fn is_full_container(container: &dyn Container, face: Direction) -> bool {
    slots_for(container, face).into_iter().all(|slot| {
        let stack = container.get_item(slot);
        stack.count() >= container.max_stack_size_for(stack)
    })
}

fn can_place_item_in_container(
    container: &dyn Container,
    stack: &ItemStack,
    slot: usize,
    face: Option<Direction>,
) -> bool {
    if !container.can_place_item(slot, stack) {
        return false;
    }
    container
        .as_worldly()
        .is_none_or(|worldly| worldly.can_place_item_through_face(slot, stack, face))
}

/// Whether `target` may pull `stack` out of `slot` of `container` through `face`.
#[must_use]
pub fn can_take_item_from_container(
    target: &dyn Container,
    container: &dyn Container,
    stack: &ItemStack,
    slot: usize,
    face: Direction,
) -> bool {
    if !container.can_take_item(target, slot, stack) {
        return false;
    }
    container
        .as_worldly()
        .is_none_or(|worldly| worldly.can_take_item_through_face(slot, stack, face))
}

/// Offers `stack` to `destination` through `face` and returns what didn't fit.
///
/// `source_ticked` is the last tick time of the sending container when it paces
/// its transfers; it decides how a hopper that was empty until now is delayed.
pub fn add_item(
    source_ticked: Option<u64>,
    destination: &mut dyn Container,
    mut stack: ItemStack,
    face: Option<Direction>,
) -> ItemStack {
    let slots: FaceSlots = match (destination.as_worldly(), face) {
        (Some(worldly), Some(face)) => worldly.slots_for_face(face),
        _ => (0..destination.get_container_size()).collect(),
    };
    for slot in slots {
        if stack.is_empty() {
            break;
        }
        stack = try_move_in_item(source_ticked, destination, stack, slot, face);
    }
    stack
}

/// Offers `stack` to one slot of `destination` and returns what didn't fit.
pub fn try_move_in_item(
    source_ticked: Option<u64>,
    destination: &mut dyn Container,
    stack: ItemStack,
    slot: usize,
    face: Option<Direction>,
) -> ItemStack {
    if !can_place_item_in_container(destination, &stack, slot, face) {
        return stack;
    }
    let was_empty = destination.is_empty();
    let offered = stack.count();
    let leftover = destination.insert(slot, stack);
    if leftover.count() == offered {
        return leftover;
    }

    if was_empty
        && let Some(cooldown) = destination.transfer_cooldown_mut()
        && !cooldown.is_on_custom_cooldown()
    {
        let already_ticked =
            source_ticked.is_some_and(|source| cooldown.ticked_game_time() >= source);
        cooldown.set_cooldown(MOVE_ITEM_SPEED - i32::from(already_ticked));
    }
    destination.set_changed();
    leftover
}

/// Moves one unit out of `slot` of `source` into `target`, pulling through `face`.
/// Nothing changes unless the whole unit arrives.
pub fn try_take_in_item_from_slot(
    target: &mut dyn Container,
    source: &mut dyn Container,
    slot: usize,
    face: Direction,
) -> bool {
    let stack = source.get_item(slot);
    if stack.is_empty() || !can_take_item_from_container(&*target, &*source, stack, slot, face) {
        return false;
    }

    let source_ticked = source.transfer_cooldown_mut().map(|c| c.ticked_game_time());
    let unit = source.get_item_mut(slot).split(1);
    let leftover = add_item(source_ticked, target, unit, None);
    if leftover.is_empty() {
        source.set_changed();
        return true;
    }
    source.get_item_mut(slot).grow(leftover.count());
    false
}

/// Moves as much of `entity`'s stack into `destination` as fits. Returns true only
/// when the entity was absorbed completely.
pub fn add_item_entity(destination: &mut dyn Container, entity: &mut ItemEntity) -> bool {
    let offered = entity.item().clone();
    let count = offered.count();
    let leftover = add_item(None, destination, offered, None);
    if leftover.is_empty() {
        entity.set_item(ItemStack::empty());
        return true;
    }
    if leftover.count() != count {
        entity.set_item(leftover);
    }
    false
}

/// The block entity at `pos`, if it holds items.
#[must_use]
pub fn get_container_at(world: &World, pos: BlockPos) -> Option<SharedBlockEntity> {
    world
        .get_block_entity(pos)
        .filter(|block_entity| block_entity.lock().as_container().is_some())
}

/// The volume above a hopper at `pos` it picks loose items up from.
#[must_use]
pub fn suck_area(pos: BlockPos) -> AABB {
    let (x, y, z) = (f64::from(pos.x()), f64::from(pos.y()), f64::from(pos.z()));
    AABB::new(
        Vector3::new(x, y + 11.0 / 16.0, z),
        Vector3::new(x + 1.0, y + 2.0, z + 1.0),
    )
}

/// The live item entities in the pickup volume of a hopper at `pos`.
#[must_use]
pub fn get_items_at_and_above(world: &World, pos: BlockPos) -> Vec<SharedItemEntity> {
    world.item_entities_in(&suck_area(pos))
}

#[cfg(test)]
mod tests {
    use ingot_registry::items::vanilla_items::{COAL, STONE};

    use super::*;
    use crate::inventory::SimpleContainer;

    struct Paced {
        inner: SimpleContainer,
        cooldown: i32,
        ticked: u64,
    }

    impl Paced {
        fn new(ticked: u64) -> Self {
            Self {
                inner: SimpleContainer::new(2),
                cooldown: -1,
                ticked,
            }
        }
    }

    impl TransferCooldown for Paced {
        fn is_on_custom_cooldown(&self) -> bool {
            self.cooldown > MOVE_ITEM_SPEED
        }

        fn ticked_game_time(&self) -> u64 {
            self.ticked
        }

        fn set_cooldown(&mut self, cooldown: i32) {
            self.cooldown = cooldown;
        }
    }

    impl Container for Paced {
        fn get_container_size(&self) -> usize {
            self.inner.get_container_size()
        }

        fn get_item(&self, slot: usize) -> &ItemStack {
            self.inner.get_item(slot)
        }

        fn get_item_mut(&mut self, slot: usize) -> &mut ItemStack {
            self.inner.get_item_mut(slot)
        }

        fn set_item(&mut self, slot: usize, stack: ItemStack) {
            self.inner.set_item(slot, stack);
        }

        fn set_changed(&mut self) {
            self.inner.set_changed();
        }

        fn transfer_cooldown_mut(&mut self) -> Option<&mut dyn TransferCooldown> {
            Some(self)
        }
    }

    #[test]
    fn test_add_item_fills_slots_in_order() {
        let mut container = SimpleContainer::new(2);
        container.set_item(0, ItemStack::with_count(&STONE, 63));

        let leftover = add_item(None, &mut container, ItemStack::with_count(&STONE, 3), None);
        assert!(leftover.is_empty());
        assert_eq!(container.get_item(0).count(), 64);
        assert_eq!(container.get_item(1).count(), 2);
    }

    #[test]
    fn test_full_container() {
        let mut container = SimpleContainer::new(1);
        assert!(!is_full_container(&container, Direction::Up));
        container.set_item(0, ItemStack::with_count(&STONE, 64));
        assert!(is_full_container(&container, Direction::Up));

        let leftover = add_item(None, &mut container, ItemStack::new(&STONE), None);
        assert_eq!(leftover.count(), 1);
    }

    #[test]
    fn test_empty_destination_cooldown() {
        let mut ready = Paced::new(10);
        add_item(Some(10), &mut ready, ItemStack::new(&COAL), None);
        assert_eq!(ready.cooldown, MOVE_ITEM_SPEED - 1, "already ticked this game tick");

        let mut behind = Paced::new(9);
        add_item(Some(10), &mut behind, ItemStack::new(&COAL), None);
        assert_eq!(behind.cooldown, MOVE_ITEM_SPEED);

        let mut busy = Paced::new(10);
        busy.cooldown = 20;
        add_item(Some(10), &mut busy, ItemStack::new(&COAL), None);
        assert_eq!(busy.cooldown, 20, "custom cooldowns are kept");

        let mut non_empty = Paced::new(9);
        non_empty.set_item(1, ItemStack::new(&STONE));
        add_item(Some(10), &mut non_empty, ItemStack::new(&COAL), None);
        assert_eq!(non_empty.cooldown, -1);
    }

    #[test]
    fn test_take_from_slot_conserves_items() {
        let mut source = SimpleContainer::new(1);
        source.set_item(0, ItemStack::with_count(&COAL, 5));
        source.clear_changed();
        let mut target = SimpleContainer::new(1);
        target.set_item(0, ItemStack::with_count(&STONE, 64));

        assert!(!try_take_in_item_from_slot(&mut target, &mut source, 0, Direction::Down));
        assert_eq!(source.get_item(0).count(), 5);
        assert!(!source.has_changed());

        target.clear_content();
        assert!(try_take_in_item_from_slot(&mut target, &mut source, 0, Direction::Down));
        assert_eq!(source.get_item(0).count(), 4);
        assert_eq!(target.get_item(0).count(), 1);
        assert!(source.has_changed());
    }

    #[test]
    fn test_add_item_entity() {
        let mut container = SimpleContainer::new(1);
        container.set_item(0, ItemStack::with_count(&STONE, 60));
        let mut entity = ItemEntity::new(Vector3::new(0.5, 1.0, 0.5), ItemStack::with_count(&STONE, 10));

        assert!(!add_item_entity(&mut container, &mut entity));
        assert_eq!(entity.item().count(), 6);
        assert!(entity.is_alive());

        container.clear_content();
        assert!(add_item_entity(&mut container, &mut entity));
        assert!(!entity.is_alive());
        assert_eq!(container.get_item(0).count(), 6);
    }

    #[test]
    fn test_suck_area() {
        let area = suck_area(BlockPos::new(0, 0, 0));
        assert!(area.contains(Vector3::new(0.5, 1.0, 0.5)));
        assert!(!area.contains(Vector3::new(0.5, 0.5, 0.5)));
        assert!(!area.contains(Vector3::new(1.5, 1.0, 0.5)));
    }
}
