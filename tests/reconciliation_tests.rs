//! # Reconciliation Tests
//!
//! Properties and scenarios for availability matching, ingredient
//! partitioning, trip conversion and cooking deductions.

use chrono::{DateTime, Duration, TimeZone, Utc};
use scandibox::availability::{is_ingredient_available, partition_missing_ingredients};
use scandibox::conversion::{find_potential_deductions, plan_trip_conversion};
use scandibox::kitchen_model::{Category, InventoryItem, ItemStatus, NewInventoryItem, Recipe, ShoppingItem};
use scandibox::text_processing::{normalize_name, parse_leading_quantity};
use std::collections::HashSet;
use uuid::Uuid;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 17, 14, 45, 0).unwrap()
}

fn item(name: &str, quantity: &str) -> InventoryItem {
    NewInventoryItem::new(name, Category::Other, now())
        .with_quantity(quantity)
        .into_item(Uuid::new_v4())
}

fn shopping(name: &str, checked: bool) -> ShoppingItem {
    ShoppingItem {
        id: Uuid::new_v4(),
        name: name.to_string(),
        is_checked: checked,
    }
}

#[test]
fn test_nothing_is_available_in_an_empty_inventory() {
    for ingredient in ["milk", "2 eggs", "", "olive oil", "500g flour"] {
        assert!(!is_ingredient_available(ingredient, &[]), "{ingredient}");
    }
}

#[test]
fn test_item_backs_its_own_name_up_to_its_quantity() {
    for name in ["milk", "Greek Yoghurt", "rugbrød"] {
        let inventory = vec![item(name, "5")];
        assert!(is_ingredient_available(name, &inventory));
        assert!(is_ingredient_available(&format!("5 {name}"), &inventory));
        assert!(is_ingredient_available(&format!("3 {name}"), &inventory));
        assert!(!is_ingredient_available(&format!("6 {name}"), &inventory));
    }
}

#[test]
fn test_insufficient_quantity_scenario() {
    let inventory = vec![item("milk", "1L")];
    assert!(!is_ingredient_available("2L milk", &inventory));
}

#[test]
fn test_quantities_are_summed_across_items() {
    let inventory = vec![item("flour", "2"), item("flour", "3")];
    assert!(is_ingredient_available("4 flour", &inventory));
    assert!(is_ingredient_available("5 flour", &inventory));
    assert!(!is_ingredient_available("6 flour", &inventory));
}

#[test]
fn test_matching_in_either_direction() {
    // Inventory name inside the ingredient
    assert!(is_ingredient_available("2 large eggs", &[item("Eggs", "6")]));
    // Ingredient inside the inventory name
    assert!(is_ingredient_available("milk", &[item("Semi-skimmed milk", "1L")]));
}

#[test]
fn test_oil_rule_is_literal() {
    let inventory = vec![item("Rapeseed oil", "1")];
    assert!(is_ingredient_available("olive oil", &inventory));
    // The rule fires on any word containing "oil"
    assert!(is_ingredient_available("boiled potatoes", &inventory));
    assert!(!is_ingredient_available("butter", &inventory));
}

#[test]
fn test_units_are_not_compared() {
    let inventory = vec![item("sugar", "2 g")];
    assert!(is_ingredient_available("2 cups sugar", &inventory));
    assert_eq!(parse_leading_quantity("2 cups"), parse_leading_quantity("2 g"));
}

#[test]
fn test_blank_names_never_match() {
    let inventory = vec![item("   ", "10")];
    assert!(!is_ingredient_available("milk", &inventory));
    assert!(!is_ingredient_available("  ", &[item("milk", "1")]));
}

#[test]
fn test_normalizer_only_trims_and_lowercases() {
    assert_eq!(normalize_name("  Crème Fraîche "), "crème fraîche");
    assert_eq!(normalize_name("Eggs, large"), "eggs, large");
}

#[test]
fn test_partition_scenario() {
    let inventory = vec![item("milk", "1")];
    let partition = partition_missing_ingredients(&["milk", "eggs", "sugar"], &inventory);
    assert_eq!(partition.present, vec!["milk"]);
    assert_eq!(partition.missing, vec!["eggs", "sugar"]);
    assert!(!partition.is_complete());
    assert_eq!(partition.coverage_percent(), 33);
}

#[test]
fn test_partition_is_disjoint_ordered_and_complete() {
    let inventory = vec![item("butter", "1"), item("flour", "2"), item("olive oil", "1")];
    let ingredients = [
        "3 flour",
        "1 butter",
        "salt",
        "1 flour",
        "sesame oil",
        "2 butter",
        "pepper",
    ];

    let partition = partition_missing_ingredients(&ingredients, &inventory);

    let present: HashSet<_> = partition.present.iter().collect();
    let missing: HashSet<_> = partition.missing.iter().collect();
    assert!(present.is_disjoint(&missing));
    assert_eq!(partition.present.len() + partition.missing.len(), ingredients.len());

    let union: HashSet<String> = partition.present.iter().chain(&partition.missing).cloned().collect();
    let original: HashSet<String> = ingredients.iter().map(|s| s.to_string()).collect();
    assert_eq!(union, original);

    assert_eq!(partition.present, vec!["1 butter", "1 flour", "sesame oil"]);
    assert_eq!(partition.missing, vec!["3 flour", "salt", "2 butter", "pepper"]);
}

#[test]
fn test_partition_of_empty_inputs() {
    let partition = partition_missing_ingredients::<&str>(&[], &[item("milk", "1")]);
    assert!(partition.present.is_empty());
    assert!(partition.missing.is_empty());
    assert!(partition.is_complete());

    let partition = partition_missing_ingredients(&["milk"], &[]);
    assert_eq!(partition.missing, vec!["milk"]);
}

#[test]
fn test_trip_conversion_one_record_per_checked_item() {
    let target = now().date_naive() + Duration::days(7);
    let items = vec![
        shopping("eggs", true),
        shopping("bread", false),
        shopping("coffee", true),
        shopping("apples", true),
    ];

    let plan = plan_trip_conversion(&items, target, now());

    assert_eq!(plan.len(), 3);
    for conversion in &plan {
        assert!(conversion.source.is_checked);
        assert_eq!(conversion.record.name, conversion.source.name);
        assert_eq!(conversion.record.category, Category::Other);
        assert_eq!(conversion.record.quantity, "1");
        assert_eq!(conversion.record.status, ItemStatus::Active);
        assert_eq!(conversion.record.expiry_date, Some(target));
        assert_eq!(conversion.record.days_until_expiry, Some(7));
    }
}

#[test]
fn test_trip_conversion_scenario_week_out() {
    let target = now().date_naive() + Duration::days(7);
    let plan = plan_trip_conversion(&[shopping("eggs", true)], target, now());
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].record.days_until_expiry, Some(7));
}

#[test]
fn test_trip_conversion_with_nothing_checked() {
    let target = now().date_naive() + Duration::days(3);
    assert!(plan_trip_conversion(&[shopping("eggs", false)], target, now()).is_empty());
    assert!(plan_trip_conversion(&[], target, now()).is_empty());
}

#[test]
fn test_deductions_are_idempotent() {
    let recipe = Recipe::new("r1", "Pancakes")
        .with_ingredients(&["2 eggs", "300ml milk", "flour"])
        .with_instructions(&["Whisk everything", "Fry in butter"]);
    let inventory = vec![
        item("Eggs", "6"),
        item("Milk", "1L"),
        item("Butter", "250g"),
        item("Cheese", "1"),
    ];

    let first = find_potential_deductions(&recipe, &inventory);
    let second = find_potential_deductions(&recipe, &inventory);
    assert_eq!(first, second);

    let names: Vec<&str> = first.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Eggs", "Milk", "Butter"]);
}

#[test]
fn test_deductions_match_category_names() {
    let recipe = Recipe::new("r2", "Smoothie").with_ingredients(&["any frozen berries"]);
    let berries = NewInventoryItem::new("Blåbær", Category::Frozen, now()).into_item(Uuid::new_v4());
    let beef = NewInventoryItem::new("Mince", Category::Meat, now()).into_item(Uuid::new_v4());

    let deductions = find_potential_deductions(&recipe, &[berries.clone(), beef]);
    assert_eq!(deductions, vec![berries]);
}
