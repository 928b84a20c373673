//! What a furnace may smelt and burn. The engine doesn't decide recipes; it asks
//! a [`SmeltingRules`] implementation supplied with the world.

use ingot_registry::item_stack::ItemStack;
use ingot_registry::items::ItemRef;
use rustc_hash::FxHashMap;

/// Default cook time of a smelting recipe.
pub const DEFAULT_COOKING_TIME: i32 = 200;

/// The outcome of smelting one input item.
#[derive(Debug, Clone, PartialEq)]
pub struct SmeltingRecipe {
    /// What one input turns into.
    pub result: ItemStack,
    /// Ticks it takes.
    pub cooking_time: i32,
}

/// Recipe and fuel lookup for furnaces.
pub trait SmeltingRules: Send + Sync {
    /// The recipe for `input`, if any.
    fn recipe_for(&self, input: &ItemStack) -> Option<SmeltingRecipe>;

    /// Ticks one unit of `fuel` burns for, 0 if it isn't fuel.
    fn burn_duration(&self, fuel: &ItemStack) -> i32;

    /// Whether `stack` burns at all.
    fn is_fuel(&self, stack: &ItemStack) -> bool {
        self.burn_duration(stack) > 0
    }
}

/// A fixed table of recipes and fuels keyed by item.
#[derive(Debug, Clone, Default)]
pub struct SmeltingTable {
    recipes: FxHashMap<ItemRef, SmeltingRecipe>,
    fuels: FxHashMap<ItemRef, i32>,
}

impl SmeltingTable {
    /// A table without recipes or fuels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a recipe turning `input` into `result` over `cooking_time` ticks.
    #[must_use]
    pub fn with_recipe(mut self, input: ItemRef, result: ItemStack, cooking_time: i32) -> Self {
        self.recipes.insert(
            input,
            SmeltingRecipe {
                result,
                cooking_time,
            },
        );
        self
    }

    /// Adds a fuel burning for `duration` ticks.
    #[must_use]
    pub fn with_fuel(mut self, fuel: ItemRef, duration: i32) -> Self {
        self.fuels.insert(fuel, duration);
        self
    }
}

impl SmeltingRules for SmeltingTable {
    fn recipe_for(&self, input: &ItemStack) -> Option<SmeltingRecipe> {
        if input.is_empty() {
            return None;
        }
        self.recipes.get(&input.item()).cloned()
    }

    fn burn_duration(&self, fuel: &ItemStack) -> i32 {
        if fuel.is_empty() {
            return 0;
        }
        self.fuels.get(&fuel.item()).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use ingot_registry::items::vanilla_items::{COAL, IRON_INGOT, RAW_IRON, STONE};

    use super::*;

    #[test]
    fn test_table_lookup() {
        let table = SmeltingTable::new()
            .with_recipe(&RAW_IRON, ItemStack::new(&IRON_INGOT), DEFAULT_COOKING_TIME)
            .with_fuel(&COAL, 1600);

        let recipe = table
            .recipe_for(&ItemStack::with_count(&RAW_IRON, 3))
            .expect("raw iron smelts");
        assert!(recipe.result.is(&IRON_INGOT));
        assert!(table.recipe_for(&ItemStack::new(&STONE)).is_none());
        assert!(table.is_fuel(&ItemStack::new(&COAL)));
        assert_eq!(table.burn_duration(&ItemStack::empty()), 0);
    }
}
