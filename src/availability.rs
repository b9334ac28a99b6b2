//! # Ingredient Availability
//!
//! Decides whether recipe ingredients are backed by the current inventory and
//! partitions a recipe's ingredient list into present and missing entries.
//!
//! Matching is a substring heuristic over normalized names. An inventory item
//! backs an ingredient when either normalized string contains the other, or
//! when both mention "oil". Quantities of every backing item are summed and
//! compared against the ingredient's own leading quantity, with no unit
//! conversion (see [`crate::text_processing`]).
//!
//! ## Usage
//!
//! ```rust
//! use scandibox::availability::partition_missing_ingredients;
//! use scandibox::kitchen_model::{Category, NewInventoryItem};
//! use chrono::Utc;
//! use uuid::Uuid;
//!
//! let inventory = vec![
//!     NewInventoryItem::new("milk", Category::Dairy, Utc::now()).into_item(Uuid::new_v4()),
//! ];
//! let partition = partition_missing_ingredients(&["milk", "eggs", "sugar"], &inventory);
//! assert_eq!(partition.present, vec!["milk"]);
//! assert_eq!(partition.missing, vec!["eggs", "sugar"]);
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

use crate::kitchen_model::InventoryItem;
use crate::text_processing::{normalize_name, parse_leading_quantity};

// Ad hoc synonym rule: any two strings mentioning "oil" are treated as the
// same ingredient. Kept literal; it also fires on words like "boiled".
const OIL_TOKEN: &str = "oil";

/// A recipe's ingredients split by availability, each side in original order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientPartition {
    pub present: Vec<String>,
    pub missing: Vec<String>,
}

/// Whether an inventory item name backs an ingredient string
///
/// Both arguments must already be normalized. Blank strings never match.
fn names_match(ingredient: &str, inventory_name: &str) -> bool {
    if ingredient.is_empty() || inventory_name.is_empty() {
        return false;
    }
    ingredient.contains(inventory_name)
        || inventory_name.contains(ingredient)
        || (ingredient.contains(OIL_TOKEN) && inventory_name.contains(OIL_TOKEN))
}

/// All inventory items that back the given ingredient, in inventory order
pub fn matching_items<'a>(ingredient: &str, inventory: &'a [InventoryItem]) -> Vec<&'a InventoryItem> {
    let wanted = normalize_name(ingredient);
    inventory
        .iter()
        .filter(|item| names_match(&wanted, &normalize_name(&item.name)))
        .collect()
}

/// Whether the inventory holds enough of an ingredient
///
/// Returns `false` when nothing matches. Otherwise sums the leading quantities
/// of every matching item and compares against the ingredient's own leading
/// quantity (1 when it names no amount).
pub fn is_ingredient_available(ingredient: &str, inventory: &[InventoryItem]) -> bool {
    let candidates = matching_items(ingredient, inventory);
    if candidates.is_empty() {
        return false;
    }

    let on_hand: f64 = candidates
        .iter()
        .map(|item| parse_leading_quantity(&item.quantity))
        .sum();
    let required = parse_leading_quantity(ingredient);

    debug!(
        "Ingredient '{}' needs {} and has {} across {} item(s)",
        ingredient,
        required,
        on_hand,
        candidates.len()
    );
    on_hand >= required
}

/// Split ingredients into those the inventory covers and those it does not
pub fn partition_missing_ingredients<S: AsRef<str>>(
    ingredients: &[S],
    inventory: &[InventoryItem],
) -> IngredientPartition {
    let mut partition = IngredientPartition::default();
    for ingredient in ingredients {
        let ingredient = ingredient.as_ref();
        if is_ingredient_available(ingredient, inventory) {
            partition.present.push(ingredient.to_string());
        } else {
            partition.missing.push(ingredient.to_string());
        }
    }
    partition
}

impl IngredientPartition {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Share of ingredients already in stock, as a 0-100 score
    pub fn coverage_percent(&self) -> u8 {
        let total = self.present.len() + self.missing.len();
        if total == 0 {
            return 100;
        }
        ((self.present.len() * 100) / total) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kitchen_model::{Category, NewInventoryItem};
    use chrono::Utc;
    use uuid::Uuid;

    fn item(name: &str, quantity: &str) -> InventoryItem {
        NewInventoryItem::new(name, Category::Other, Utc::now())
            .with_quantity(quantity)
            .into_item(Uuid::new_v4())
    }

    #[test]
    fn test_empty_inventory_never_available() {
        assert!(!is_ingredient_available("milk", &[]));
        assert!(!is_ingredient_available("2 eggs", &[]));
    }

    #[test]
    fn test_inventory_name_inside_ingredient() {
        let inventory = vec![item("Flour", "1kg")];
        assert!(is_ingredient_available("1 cup flour, sifted", &inventory));
    }

    #[test]
    fn test_ingredient_inside_inventory_name() {
        let inventory = vec![item("Whole Milk", "1L")];
        assert!(is_ingredient_available("milk", &inventory));
    }

    #[test]
    fn test_insufficient_quantity() {
        let inventory = vec![item("milk", "1L")];
        assert!(!is_ingredient_available("2L milk", &inventory));
    }

    #[test]
    fn test_quantities_are_summed() {
        let inventory = vec![item("flour", "2"), item("flour", "3")];
        assert!(is_ingredient_available("4 flour", &inventory));
        assert!(!is_ingredient_available("6 flour", &inventory));
    }

    #[test]
    fn test_oil_synonym_rule() {
        let inventory = vec![item("Olive Oil", "500ml")];
        assert!(is_ingredient_available("2 tbsp sunflower oil", &inventory));
        assert!(!is_ingredient_available("2 tbsp butter", &inventory));
    }

    #[test]
    fn test_blank_names_do_not_match() {
        let inventory = vec![item("   ", "5")];
        assert!(!is_ingredient_available("milk", &inventory));
        assert!(!is_ingredient_available("", &[item("milk", "5")]));
    }

    #[test]
    fn test_partition_preserves_order() {
        let inventory = vec![item("sugar", "1kg"), item("milk", "1L")];
        let partition =
            partition_missing_ingredients(&["milk", "eggs", "sugar", "butter"], &inventory);
        assert_eq!(partition.present, vec!["milk", "sugar"]);
        assert_eq!(partition.missing, vec!["eggs", "butter"]);
        assert_eq!(partition.coverage_percent(), 50);
        assert!(!partition.is_complete());
    }

    #[test]
    fn test_partition_of_empty_recipe() {
        let partition = partition_missing_ingredients::<&str>(&[], &[item("milk", "1")]);
        assert!(partition.present.is_empty());
        assert!(partition.is_complete());
        assert_eq!(partition.coverage_percent(), 100);
    }
}
