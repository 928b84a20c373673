//! Container locks keyed on item names.

use ingot_registry::item_stack::ItemStack;
use ingot_registry::nbt::get_string;
use simdnbt::owned::{NbtCompound, NbtTag};

use crate::entity::Viewer;

/// A lock on a container. A viewer can open a locked container only while holding
/// an item whose custom name matches the key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LockCode(Option<String>);

impl LockCode {
    /// No lock.
    pub const NO_LOCK: Self = Self(None);

    const TAG: &'static str = "lock";

    /// A lock opened by items named `key`. An empty key means no lock.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        if key.is_empty() { Self::NO_LOCK } else { Self(Some(key)) }
    }

    /// The key, if locked.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Whether this lock opens with `stack`.
    #[must_use]
    pub fn unlocks_with(&self, stack: &ItemStack) -> bool {
        match &self.0 {
            None => true,
            Some(key) => !stack.is_empty() && stack.custom_name() == Some(key.as_str()),
        }
    }

    /// Writes the key under `lock`, if locked.
    pub fn add_to_tag(&self, nbt: &mut NbtCompound) {
        if let Some(key) = &self.0 {
            nbt.insert(Self::TAG, NbtTag::String(key.clone().into()));
        }
    }

    /// Reads the key from `lock`. Missing means unlocked.
    #[must_use]
    pub fn from_tag(nbt: &NbtCompound) -> Self {
        get_string(nbt, Self::TAG).map_or(Self::NO_LOCK, Self::new)
    }
}

/// A container that can be locked.
pub trait Lockable {
    /// The current lock.
    fn lock_code(&self) -> &LockCode;

    /// Whether `viewer` may open the container.
    fn can_unlock(&self, viewer: &Viewer) -> bool {
        if viewer.spectator {
            return true;
        }
        let unlocked = self.lock_code().unlocks_with(&viewer.held_item);
        if !unlocked {
            log::debug!("Viewer {} is locked out", viewer.id);
        }
        unlocked
    }
}

#[cfg(test)]
mod tests {
    use ingot_registry::data_components::vanilla_components::CUSTOM_NAME;
    use ingot_registry::items::vanilla_items::STONE;

    use super::*;

    fn named(name: &str) -> ItemStack {
        let mut stack = ItemStack::new(&STONE);
        stack.set(&CUSTOM_NAME, name.to_string());
        stack
    }

    #[test]
    fn test_unlocks_with() {
        let lock = LockCode::new("key");
        assert!(lock.unlocks_with(&named("key")));
        assert!(!lock.unlocks_with(&named("other")));
        assert!(!lock.unlocks_with(&ItemStack::new(&STONE)));
        assert!(LockCode::NO_LOCK.unlocks_with(&ItemStack::empty()));
        assert_eq!(LockCode::new(""), LockCode::NO_LOCK);
    }

    #[test]
    fn test_tag() {
        let mut nbt = NbtCompound::new();
        LockCode::NO_LOCK.add_to_tag(&mut nbt);
        assert!(nbt.get("lock").is_none());

        LockCode::new("key").add_to_tag(&mut nbt);
        assert_eq!(LockCode::from_tag(&nbt), LockCode::new("key"));
    }
}
