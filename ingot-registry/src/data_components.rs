//! Typed data components.
//!
//! Items carry a prototype [`DataComponentMap`] shared by every stack of that item,
//! and each stack layers a sparse [`DataComponentPatch`] on top. A patch entry is
//! either an override or an explicit removal marker, so "removed" stays
//! distinguishable from "never set".

use std::collections::BTreeMap;
use std::ptr;

use ingot_utils::Identifier;
use simdnbt::owned::{NbtCompound, NbtList, NbtTag};

use crate::item_stack::ItemStack;
use crate::nbt::{compound_list, get_compound, get_i32, nbt_i32, nbt_string};

/// The component kinds the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataComponentKind {
    /// A player given name.
    CustomName,
    /// Overrides the item's stack limit.
    MaxStackSize,
    /// Durability used so far.
    Damage,
    /// The key a container requires to be opened.
    Lock,
    /// Stored container contents.
    Container,
    /// Anvil repair cost.
    RepairCost,
}

impl DataComponentKind {
    /// Every kind, in persistence order.
    pub const ALL: [DataComponentKind; 6] = [
        Self::CustomName,
        Self::MaxStackSize,
        Self::Damage,
        Self::Lock,
        Self::Container,
        Self::RepairCost,
    ];

    /// The registry key of this kind.
    #[must_use]
    pub const fn key(self) -> Identifier {
        Identifier::vanilla_static(match self {
            Self::CustomName => "custom_name",
            Self::MaxStackSize => "max_stack_size",
            Self::Damage => "damage",
            Self::Lock => "lock",
            Self::Container => "container",
            Self::RepairCost => "repair_cost",
        })
    }

    /// Looks a kind up by its registry key.
    #[must_use]
    pub fn by_key(key: &Identifier) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == *key)
    }
}

/// Contents stored in an item by the `minecraft:container` component.
///
/// Slots are kept in order; trailing empty slots are trimmed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemContainerContents {
    items: Vec<ItemStack>,
}

impl ItemContainerContents {
    /// The most slots the component can describe.
    pub const MAX_SIZE: usize = 256;

    /// Captures the given slots.
    #[must_use]
    pub fn from_items(items: &[ItemStack]) -> Self {
        let len = items
            .iter()
            .rposition(|stack| !stack.is_empty())
            .map_or(0, |last| last + 1)
            .min(Self::MAX_SIZE);
        Self {
            items: items[..len].to_vec(),
        }
    }

    /// Copies the stored stacks into `target`, clearing every other slot.
    pub fn copy_into(&self, target: &mut [ItemStack]) {
        for (slot, stack) in target.iter_mut().enumerate() {
            *stack = self.items.get(slot).cloned().unwrap_or_else(ItemStack::empty);
        }
    }

    /// The non-empty stored stacks.
    pub fn non_empty_items(&self) -> impl Iterator<Item = &ItemStack> {
        self.items.iter().filter(|stack| !stack.is_empty())
    }

    /// The stack in `slot`, empty if out of range.
    #[must_use]
    pub fn get(&self, slot: usize) -> &ItemStack {
        self.items.get(slot).unwrap_or_else(|| ItemStack::empty_ref())
    }

    fn to_nbt(&self) -> NbtTag {
        let entries = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, stack)| !stack.is_empty())
            .map(|(slot, stack)| {
                let mut entry = NbtCompound::new();
                entry.insert("slot", NbtTag::Int(slot as i32));
                entry.insert("item", NbtTag::Compound(stack.to_nbt()));
                entry
            })
            .collect();
        compound_list(entries)
    }

    fn from_nbt(tag: &NbtTag) -> Option<Self> {
        let entries: &[NbtCompound] = match tag {
            NbtTag::List(NbtList::Compound(entries)) => entries,
            NbtTag::List(NbtList::Empty) => &[],
            _ => return None,
        };

        let mut items = Vec::new();
        for entry in entries {
            let Some(slot) = get_i32(entry, "slot").and_then(|slot| usize::try_from(slot).ok())
            else {
                log::warn!("Skipping container entry without a valid slot");
                continue;
            };
            if slot >= Self::MAX_SIZE {
                log::warn!("Skipping container entry for slot {slot} past the limit");
                continue;
            }
            let Some(stack) = get_compound(entry, "item").and_then(ItemStack::from_nbt) else {
                continue;
            };
            if items.len() <= slot {
                items.resize_with(slot + 1, ItemStack::empty);
            }
            items[slot] = stack;
        }
        Some(Self { items })
    }
}

/// A component value tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum DataComponentValue {
    /// See [`DataComponentKind::CustomName`].
    CustomName(String),
    /// See [`DataComponentKind::MaxStackSize`].
    MaxStackSize(i32),
    /// See [`DataComponentKind::Damage`].
    Damage(i32),
    /// See [`DataComponentKind::Lock`].
    Lock(String),
    /// See [`DataComponentKind::Container`].
    Container(ItemContainerContents),
    /// See [`DataComponentKind::RepairCost`].
    RepairCost(i32),
}

impl DataComponentValue {
    /// The kind of this value.
    #[must_use]
    pub const fn kind(&self) -> DataComponentKind {
        match self {
            Self::CustomName(_) => DataComponentKind::CustomName,
            Self::MaxStackSize(_) => DataComponentKind::MaxStackSize,
            Self::Damage(_) => DataComponentKind::Damage,
            Self::Lock(_) => DataComponentKind::Lock,
            Self::Container(_) => DataComponentKind::Container,
            Self::RepairCost(_) => DataComponentKind::RepairCost,
        }
    }

    /// Encodes the value.
    #[must_use]
    pub fn to_nbt(&self) -> NbtTag {
        match self {
            Self::CustomName(s) | Self::Lock(s) => NbtTag::String(s.clone().into()),
            Self::MaxStackSize(v) | Self::Damage(v) | Self::RepairCost(v) => NbtTag::Int(*v),
            Self::Container(contents) => contents.to_nbt(),
        }
    }

    /// Decodes a value of `kind`. Returns `None` when the tag has the wrong shape or
    /// the value is out of range.
    #[must_use]
    pub fn from_nbt(kind: DataComponentKind, tag: &NbtTag) -> Option<Self> {
        match kind {
            DataComponentKind::CustomName => nbt_string(tag).map(Self::CustomName),
            DataComponentKind::Lock => nbt_string(tag).map(Self::Lock),
            DataComponentKind::MaxStackSize => nbt_i32(tag)
                .filter(|size| (1..=99).contains(size))
                .map(Self::MaxStackSize),
            DataComponentKind::Damage => nbt_i32(tag).filter(|d| *d >= 0).map(Self::Damage),
            DataComponentKind::RepairCost => {
                nbt_i32(tag).filter(|c| *c >= 0).map(Self::RepairCost)
            }
            DataComponentKind::Container => {
                ItemContainerContents::from_nbt(tag).map(Self::Container)
            }
        }
    }
}

/// A typed handle for reading and writing one component kind.
pub struct DataComponentType<T> {
    /// The kind this handle addresses.
    pub kind: DataComponentKind,
    wrap: fn(T) -> DataComponentValue,
    unwrap: fn(&DataComponentValue) -> Option<&T>,
    default: fn() -> T,
}

impl<T> DataComponentType<T> {
    /// Wraps a typed value.
    pub fn wrap(&self, value: T) -> DataComponentValue {
        (self.wrap)(value)
    }

    /// Borrows the typed value out of a raw value of the matching kind.
    pub fn unwrap<'a>(&self, value: &'a DataComponentValue) -> Option<&'a T> {
        (self.unwrap)(value)
    }

    /// The value used when neither the patch nor the prototype provide one.
    pub fn absolute_default(&self) -> T {
        (self.default)()
    }
}

macro_rules! component_type {
    ($(#[$meta:meta])* $name:ident: $ty:ty = $kind:ident, $default:expr) => {
        $(#[$meta])*
        pub const $name: DataComponentType<$ty> = {
            fn unwrap(value: &DataComponentValue) -> Option<&$ty> {
                match value {
                    DataComponentValue::$kind(v) => Some(v),
                    _ => None,
                }
            }
            DataComponentType {
                kind: DataComponentKind::$kind,
                wrap: DataComponentValue::$kind,
                unwrap,
                default: $default,
            }
        };
    };
}

/// Typed handles for the vanilla component kinds.
pub mod vanilla_components {
    use super::{DataComponentKind, DataComponentType, DataComponentValue, ItemContainerContents};

    component_type!(
        /// `minecraft:custom_name`
        CUSTOM_NAME: String = CustomName, String::new
    );
    component_type!(
        /// `minecraft:max_stack_size`
        MAX_STACK_SIZE: i32 = MaxStackSize, || 1
    );
    component_type!(
        /// `minecraft:damage`
        DAMAGE: i32 = Damage, || 0
    );
    component_type!(
        /// `minecraft:lock`
        LOCK: String = Lock, String::new
    );
    component_type!(
        /// `minecraft:container`
        CONTAINER: ItemContainerContents = Container, ItemContainerContents::default
    );
    component_type!(
        /// `minecraft:repair_cost`
        REPAIR_COST: i32 = RepairCost, || 0
    );
}

/// A complete set of component values, used for item prototypes and for the
/// components a block entity holds on to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataComponentMap {
    values: BTreeMap<DataComponentKind, DataComponentValue>,
}

/// The map without any components.
pub static EMPTY_COMPONENTS: DataComponentMap = DataComponentMap::new();

impl DataComponentMap {
    /// An empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Builder style [`Self::set`].
    #[must_use]
    pub fn with<T>(mut self, ty: &DataComponentType<T>, value: T) -> Self {
        self.set(ty, value);
        self
    }

    /// Reads a typed value.
    pub fn get<T>(&self, ty: &DataComponentType<T>) -> Option<&T> {
        self.values.get(&ty.kind).and_then(|value| ty.unwrap(value))
    }

    /// Reads a raw value.
    #[must_use]
    pub fn get_value(&self, kind: DataComponentKind) -> Option<&DataComponentValue> {
        self.values.get(&kind)
    }

    /// Whether a value of `kind` is present.
    #[must_use]
    pub fn has(&self, kind: DataComponentKind) -> bool {
        self.values.contains_key(&kind)
    }

    /// Stores a typed value.
    pub fn set<T>(&mut self, ty: &DataComponentType<T>, value: T) {
        self.values.insert(ty.kind, ty.wrap(value));
    }

    /// Stores a raw value under its own kind.
    pub fn insert_value(&mut self, value: DataComponentValue) {
        self.values.insert(value.kind(), value);
    }

    /// Removes a value.
    pub fn remove(&mut self, kind: DataComponentKind) -> Option<DataComponentValue> {
        self.values.remove(&kind)
    }

    /// Copies every value of `other` into this map.
    pub fn add_all(&mut self, other: &DataComponentMap) {
        for value in other.values.values() {
            self.insert_value(value.clone());
        }
    }

    /// All values in kind order.
    pub fn iter(&self) -> impl Iterator<Item = &DataComponentValue> {
        self.values.values()
    }

    /// The kinds present in the map.
    pub fn kinds(&self) -> impl Iterator<Item = DataComponentKind> + '_ {
        self.values.keys().copied()
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the map holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Encodes the map keyed by component id.
    #[must_use]
    pub fn to_nbt(&self) -> NbtCompound {
        let mut nbt = NbtCompound::new();
        for (kind, value) in &self.values {
            nbt.insert(kind.key().to_string(), value.to_nbt());
        }
        nbt
    }

    /// Decodes a map. Unknown or malformed entries are skipped with a warning.
    #[must_use]
    pub fn from_nbt(nbt: &NbtCompound) -> Self {
        let mut map = Self::new();
        for (key, tag) in nbt.iter() {
            let key = key.to_str();
            let Some(kind) = parse_kind(&key) else {
                log::warn!("Skipping unknown data component {key}");
                continue;
            };
            match DataComponentValue::from_nbt(kind, tag) {
                Some(value) => map.insert_value(value),
                None => log::warn!("Skipping malformed data component {key}"),
            }
        }
        map
    }
}

fn parse_kind(key: &str) -> Option<DataComponentKind> {
    key.parse::<Identifier>()
        .ok()
        .and_then(|id| DataComponentKind::by_key(&id))
}

/// Sparse overrides on top of a prototype map.
///
/// `Some(value)` overrides the prototype, `None` removes the prototype's value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataComponentPatch {
    entries: BTreeMap<DataComponentKind, Option<DataComponentValue>>,
}

/// The two halves of a patch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SplitResult {
    /// Values the patch sets.
    pub added: DataComponentMap,
    /// Kinds the patch removes.
    pub removed: Vec<DataComponentKind>,
}

impl DataComponentPatch {
    const REMOVED_PREFIX: char = '!';

    /// An empty patch.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The patch entry for `ty`: `None` if untouched, `Some(None)` if removed.
    pub fn get<T>(&self, ty: &DataComponentType<T>) -> Option<Option<&T>> {
        self.entries
            .get(&ty.kind)
            .map(|entry| entry.as_ref().and_then(|value| ty.unwrap(value)))
    }

    /// The raw patch entry for `kind`.
    #[must_use]
    pub fn get_entry(&self, kind: DataComponentKind) -> Option<&Option<DataComponentValue>> {
        self.entries.get(&kind)
    }

    /// Overrides a value.
    pub fn set<T>(&mut self, ty: &DataComponentType<T>, value: T) {
        self.entries.insert(ty.kind, Some(ty.wrap(value)));
    }

    /// Marks a kind as removed.
    pub fn remove(&mut self, kind: DataComponentKind) {
        self.entries.insert(kind, None);
    }

    /// Drops the patch entry for `kind`, whatever it was.
    pub fn clear_entry(&mut self, kind: DataComponentKind) {
        self.entries.remove(&kind);
    }

    pub(crate) fn set_entry(&mut self, kind: DataComponentKind, entry: Option<DataComponentValue>) {
        self.entries.insert(kind, entry);
    }

    /// Whether the patch has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries, removals included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The kinds this patch touches.
    pub fn kinds(&self) -> impl Iterator<Item = DataComponentKind> + '_ {
        self.entries.keys().copied()
    }

    /// A copy without the entries whose kind matches `predicate`.
    #[must_use]
    pub fn forget(&self, predicate: impl Fn(DataComponentKind) -> bool) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(kind, _)| !predicate(**kind))
                .map(|(kind, entry)| (*kind, entry.clone()))
                .collect(),
        }
    }

    /// Separates overrides from removals.
    #[must_use]
    pub fn split(&self) -> SplitResult {
        let mut result = SplitResult::default();
        for (kind, entry) in &self.entries {
            match entry {
                Some(value) => result.added.insert_value(value.clone()),
                None => result.removed.push(*kind),
            }
        }
        result
    }

    /// Encodes the patch. Removals are written as `"!<id>": {}`.
    #[must_use]
    pub fn to_nbt(&self) -> NbtCompound {
        let mut nbt = NbtCompound::new();
        for (kind, entry) in &self.entries {
            match entry {
                Some(value) => {
                    nbt.insert(kind.key().to_string(), value.to_nbt());
                }
                None => {
                    nbt.insert(
                        format!("{}{}", Self::REMOVED_PREFIX, kind.key()),
                        NbtTag::Compound(NbtCompound::new()),
                    );
                }
            }
        }
        nbt
    }

    /// Decodes a patch. Unknown or malformed entries are skipped with a warning.
    #[must_use]
    pub fn from_nbt(nbt: &NbtCompound) -> Self {
        let mut patch = Self::new();
        for (key, tag) in nbt.iter() {
            let key = key.to_str();
            if let Some(removed) = key.strip_prefix(Self::REMOVED_PREFIX) {
                match parse_kind(removed) {
                    Some(kind) => patch.remove(kind),
                    None => log::warn!("Skipping removal of unknown data component {removed}"),
                }
                continue;
            }
            let Some(kind) = parse_kind(&key) else {
                log::warn!("Skipping unknown data component {key}");
                continue;
            };
            match DataComponentValue::from_nbt(kind, tag) {
                Some(value) => patch.set_entry(kind, Some(value)),
                None => log::warn!("Skipping malformed data component {key}"),
            }
        }
        patch
    }
}

/// A prototype map with a patch applied on top.
#[derive(Debug, Clone)]
pub struct PatchedDataComponentMap {
    pub(crate) prototype: &'static DataComponentMap,
    pub(crate) patch: DataComponentPatch,
}

impl PartialEq for PatchedDataComponentMap {
    fn eq(&self, other: &Self) -> bool {
        (ptr::eq(self.prototype, other.prototype) || self.prototype == other.prototype)
            && self.patch == other.patch
    }
}

impl PatchedDataComponentMap {
    /// A map over `prototype` without overrides.
    #[must_use]
    pub const fn new(prototype: &'static DataComponentMap) -> Self {
        Self {
            prototype,
            patch: DataComponentPatch::new(),
        }
    }

    /// A map over `prototype` with `patch` applied.
    #[must_use]
    pub fn from_patch(prototype: &'static DataComponentMap, patch: DataComponentPatch) -> Self {
        let mut map = Self::new(prototype);
        map.apply_patch(&patch);
        map
    }

    /// Resolves override, then prototype.
    pub fn get<T>(&self, ty: &DataComponentType<T>) -> Option<&T> {
        match self.patch.get(ty) {
            Some(entry) => entry,
            None => self.prototype.get(ty),
        }
    }

    /// Resolves override, then prototype, then the kind's absolute default.
    pub fn get_or_default<T: Clone>(&self, ty: &DataComponentType<T>) -> T {
        self.get(ty).cloned().unwrap_or_else(|| ty.absolute_default())
    }

    /// Whether a value of `kind` is visible.
    #[must_use]
    pub fn has(&self, kind: DataComponentKind) -> bool {
        match self.patch.get_entry(kind) {
            Some(entry) => entry.is_some(),
            None => self.prototype.has(kind),
        }
    }

    /// Sets a value. Writing the prototype's own value clears the override.
    pub fn set<T>(&mut self, ty: &DataComponentType<T>, value: T) {
        let value = ty.wrap(value);
        self.set_value(value);
    }

    fn set_value(&mut self, value: DataComponentValue) {
        let kind = value.kind();
        if self.prototype.get_value(kind) == Some(&value) {
            self.patch.clear_entry(kind);
        } else {
            self.patch.set_entry(kind, Some(value));
        }
    }

    /// Removes a value. Only records a marker when the prototype has one to hide.
    pub fn remove(&mut self, kind: DataComponentKind) {
        if self.prototype.has(kind) {
            self.patch.remove(kind);
        } else {
            self.patch.clear_entry(kind);
        }
    }

    /// Applies every entry of `patch`.
    pub fn apply_patch(&mut self, patch: &DataComponentPatch) {
        for (kind, entry) in &patch.entries {
            match entry {
                Some(value) => self.set_value(value.clone()),
                None => self.remove(*kind),
            }
        }
    }

    /// The overrides relative to the prototype.
    #[must_use]
    pub fn patch(&self) -> &DataComponentPatch {
        &self.patch
    }

    /// The prototype this map layers on.
    #[must_use]
    pub fn prototype(&self) -> &'static DataComponentMap {
        self.prototype
    }

    /// Flattens into a plain map.
    #[must_use]
    pub fn to_map(&self) -> DataComponentMap {
        let mut map = self.prototype.clone();
        for (kind, entry) in &self.patch.entries {
            match entry {
                Some(value) => map.insert_value(value.clone()),
                None => {
                    map.remove(*kind);
                }
            }
        }
        map
    }
}
