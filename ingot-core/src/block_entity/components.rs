//! Moving data components between items and the block entities placed from them.

use std::collections::BTreeSet;

use ingot_registry::data_components::{
    DataComponentKind, DataComponentMap, DataComponentPatch, DataComponentType,
    PatchedDataComponentMap,
};

use super::BlockEntity;

/// Read access to the components a block entity is being built from.
///
/// Every kind looked up is remembered, so the components a block entity turns into
/// its own fields aren't stored a second time.
pub struct DataComponentInput<'a> {
    components: &'a PatchedDataComponentMap,
    consulted: BTreeSet<DataComponentKind>,
}

impl<'a> DataComponentInput<'a> {
    /// Wraps `components`.
    #[must_use]
    pub fn new(components: &'a PatchedDataComponentMap) -> Self {
        Self {
            components,
            consulted: BTreeSet::new(),
        }
    }

    /// Reads a component and marks its kind as consulted.
    pub fn get<T>(&mut self, ty: &DataComponentType<T>) -> Option<&'a T> {
        self.consulted.insert(ty.kind);
        self.components.get(ty)
    }

    /// Reads a component, falling back to the kind's default.
    pub fn get_or_default<T: Clone>(&mut self, ty: &DataComponentType<T>) -> T {
        self.consulted.insert(ty.kind);
        self.components.get_or_default(ty)
    }

    /// The kinds read so far.
    #[must_use]
    pub fn consulted(&self) -> &BTreeSet<DataComponentKind> {
        &self.consulted
    }
}

/// Applies the components of an item, `prototype` with `patch` on top, to a block
/// entity.
///
/// The block entity picks what it understands through
/// [`BlockEntity::apply_implicit_components`]. Whatever it didn't look at and the
/// patch explicitly set is kept as the block entity's carried components.
pub fn apply_components(
    block_entity: &mut dyn BlockEntity,
    prototype: &'static DataComponentMap,
    patch: &DataComponentPatch,
) {
    let components = PatchedDataComponentMap::from_patch(prototype, patch.clone());
    let mut input = DataComponentInput::new(&components);
    block_entity.apply_implicit_components(&mut input);

    let consulted = input.consulted;
    let leftover = patch.forget(|kind| consulted.contains(&kind));
    block_entity.set_components(leftover.split().added);
    block_entity.set_changed();
}

/// The components to put on an item made from a block entity: the carried ones,
/// then the ones derived from its fields.
#[must_use]
pub fn collect_components(block_entity: &dyn BlockEntity) -> DataComponentMap {
    let mut components = DataComponentMap::new();
    components.add_all(block_entity.components());
    block_entity.collect_implicit_components(&mut components);
    components
}
