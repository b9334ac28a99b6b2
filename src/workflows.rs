//! # Kitchen Workflows
//!
//! Async orchestration of the reconciliation results against an
//! [`ItemStore`]. Each workflow reads a fresh inventory snapshot, computes
//! its plan with the pure functions in [`crate::availability`] and
//! [`crate::conversion`], then applies it one request at a time.
//!
//! Batches are not transactional. When a request fails part way through,
//! earlier requests stay applied and the error is
//! [`KitchenError::PartialBatch`]. Running the workflow again re-reads the
//! store, so already converted items are not converted twice.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::availability::partition_missing_ingredients;
use crate::billing::BillingService;
use crate::conversion::{detected_to_new_items, manual_entry_to_new_item, plan_trip_conversion, ManualEntry};
use crate::cooking_session::CookingSession;
use crate::errors::KitchenError;
use crate::inference::{DetectedItem, InferenceService, NutritionReport};
use crate::kitchen_model::{InventoryItem, PlanDay, Preferences, Recipe, ShoppingItem};
use crate::meal_plan::WeeklyPlan;
use crate::store::{inventory_snapshot, ItemStore};
use crate::subscription::{ExploreUsage, Feature, SubscriptionTier, DAILY_FREE_EXPLORE_LIMIT};
use crate::text_processing::normalize_name;

/// Result of adding a recipe's missing ingredients to the shopping list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMissingOutcome {
    /// Shopping entries created, in recipe order; empty when nothing was missing
    pub added: Vec<ShoppingItem>,
    pub already_stocked: Vec<String>,
}

/// Result of finishing a shopping trip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripOutcome {
    pub converted: Vec<InventoryItem>,
}

/// What a scan photographed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Food,
    Receipt,
}

impl ScanMode {
    pub fn feature(&self) -> Feature {
        match self {
            ScanMode::Food => Feature::SmartScan,
            ScanMode::Receipt => Feature::ReceiptScan,
        }
    }
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "food" => Ok(ScanMode::Food),
            "receipt" => Ok(ScanMode::Receipt),
            _ => Err(format!("Unknown scan mode: {s}")),
        }
    }
}

/// Recipes from one discovery round and the quota after it
#[derive(Debug, Clone, PartialEq)]
pub struct ExploreOutcome {
    pub recipes: Vec<Recipe>,
    pub usage: ExploreUsage,
}

fn interrupted(applied: Vec<String>, total: usize, err: anyhow::Error) -> KitchenError {
    let reason = format!("{err:#}");
    let completed = applied.len();
    error!(completed, total, "Batch interrupted: {}", reason);
    KitchenError::PartialBatch {
        completed,
        total,
        applied,
        reason,
    }
}

fn inventory_names(items: &[InventoryItem]) -> Vec<String> {
    items.iter().map(|i| i.name.clone()).collect()
}

fn shopping_names(items: &[ShoppingItem]) -> Vec<String> {
    items.iter().map(|i| i.name.clone()).collect()
}

/// Append every ingredient the inventory cannot cover to the shopping list
///
/// Inventory is only read. With nothing missing this succeeds with an empty
/// `added` list.
pub async fn add_missing_ingredients(
    store: &dyn ItemStore,
    user_id: Uuid,
    recipe: &Recipe,
) -> Result<AddMissingOutcome, KitchenError> {
    let inventory = inventory_snapshot(store, user_id).await?;
    let partition = partition_missing_ingredients(&recipe.ingredients, &inventory);

    let total = partition.missing.len();
    let mut added = Vec::with_capacity(total);
    for ingredient in &partition.missing {
        match store.add_shopping_item(user_id, ingredient).await {
            Ok(item) => added.push(item),
            Err(e) => return Err(interrupted(shopping_names(&added), total, e)),
        }
    }

    info!(
        user_id = %user_id,
        recipe = %recipe.title,
        added = added.len(),
        stocked = partition.present.len(),
        "Missing ingredients added to shopping list"
    );
    Ok(AddMissingOutcome {
        added,
        already_stocked: partition.present,
    })
}

/// Move every checked shopping entry into inventory
///
/// Each entry is inserted into inventory and then deleted from the shopping
/// list before the next one starts. If the delete fails after a successful
/// insert, that item exists in both places; a rerun will convert it again.
pub async fn complete_shopping_trip(
    store: &dyn ItemStore,
    user_id: Uuid,
    tier: SubscriptionTier,
    target_expiry: NaiveDate,
    now: DateTime<Utc>,
) -> Result<TripOutcome, KitchenError> {
    tier.ensure_allowed(Feature::TripToInventory)?;

    let shopping = store.list_shopping(user_id).await?;
    let plan = plan_trip_conversion(&shopping, target_expiry, now);

    let total = plan.len();
    let mut converted = Vec::with_capacity(total);
    for conversion in plan {
        let stored = match store.add_inventory_item(user_id, conversion.record).await {
            Ok(stored) => stored,
            Err(e) => return Err(interrupted(inventory_names(&converted), total, e)),
        };
        if let Err(e) = store.delete_shopping_item(user_id, conversion.source.id).await {
            warn!(item = %conversion.source.name, "Converted item left on shopping list");
            return Err(interrupted(inventory_names(&converted), total, e));
        }
        converted.push(stored);
    }

    info!(user_id = %user_id, converted = converted.len(), "Shopping trip completed");
    Ok(TripOutcome { converted })
}

/// Delete exactly the given inventory items. Returns how many were removed.
pub async fn apply_deductions(
    store: &dyn ItemStore,
    user_id: Uuid,
    item_ids: &[Uuid],
) -> Result<u64, KitchenError> {
    if item_ids.is_empty() {
        return Ok(0);
    }
    let removed = store.batch_delete_inventory(user_id, item_ids).await?;
    if removed < item_ids.len() as u64 {
        warn!(
            user_id = %user_id,
            requested = item_ids.len(),
            removed,
            "Some deducted items were already gone"
        );
    }
    info!(user_id = %user_id, removed, "Cooking deductions applied");
    Ok(removed)
}

/// Confirm a cooking session awaiting deduction and delete its selection
///
/// Returns `None` when the session was not awaiting confirmation.
pub async fn confirm_cooking_session(
    store: &dyn ItemStore,
    user_id: Uuid,
    session: &mut CookingSession,
) -> Result<Option<u64>, KitchenError> {
    match session.confirm() {
        Some(ids) => apply_deductions(store, user_id, &ids).await.map(Some),
        None => Ok(None),
    }
}

/// Finish a cooking session against a fresh inventory snapshot
pub async fn finish_cooking_session(
    store: &dyn ItemStore,
    user_id: Uuid,
    session: &mut CookingSession,
) -> Result<bool, KitchenError> {
    let inventory = inventory_snapshot(store, user_id).await?;
    Ok(session.finish(&inventory))
}

/// Store the usable items of a food or receipt scan
pub async fn import_detected_items(
    store: &dyn ItemStore,
    user_id: Uuid,
    tier: SubscriptionTier,
    mode: ScanMode,
    detected: &[DetectedItem],
    now: DateTime<Utc>,
) -> Result<Vec<InventoryItem>, KitchenError> {
    tier.ensure_allowed(mode.feature())?;

    let records = detected_to_new_items(detected, now);
    if records.len() < detected.len() {
        warn!(
            dropped = detected.len() - records.len(),
            "Scan entries without name or category ignored"
        );
    }

    let total = records.len();
    let mut stored = Vec::with_capacity(total);
    for record in records {
        match store.add_inventory_item(user_id, record).await {
            Ok(item) => stored.push(item),
            Err(e) => return Err(interrupted(inventory_names(&stored), total, e)),
        }
    }

    info!(user_id = %user_id, mode = ?mode, added = stored.len(), "Scan imported");
    Ok(stored)
}

/// Add one manually entered item
pub async fn add_manual_item(
    store: &dyn ItemStore,
    user_id: Uuid,
    entry: &ManualEntry,
    now: DateTime<Utc>,
) -> Result<InventoryItem, KitchenError> {
    if entry.name.trim().is_empty() {
        return Err(KitchenError::InvalidInput("Item name is empty".to_string()));
    }
    let item = store
        .add_inventory_item(user_id, manual_entry_to_new_item(entry, now))
        .await?;
    info!(user_id = %user_id, name = %item.name, "Manual item added");
    Ok(item)
}

/// Ask the inference service for replenishment ideas and add them to the list
///
/// Suggestions already on the shopping list (ignoring case) are skipped.
pub async fn smart_replenish(
    store: &dyn ItemStore,
    inference: &dyn InferenceService,
    user_id: Uuid,
    tier: SubscriptionTier,
) -> Result<Vec<ShoppingItem>, KitchenError> {
    tier.ensure_allowed(Feature::SmartReplenish)?;

    let inventory = inventory_snapshot(store, user_id).await?;
    let suggestions = inference.generate_shopping_list(&inventory).await?;

    let mut listed: Vec<String> = store
        .list_shopping(user_id)
        .await?
        .iter()
        .map(|i| normalize_name(&i.name))
        .collect();
    let fresh: Vec<String> = suggestions
        .into_iter()
        .filter(|name| {
            let key = normalize_name(name);
            if key.is_empty() || listed.contains(&key) {
                false
            } else {
                listed.push(key);
                true
            }
        })
        .collect();

    let total = fresh.len();
    let mut added = Vec::with_capacity(total);
    for name in &fresh {
        match store.add_shopping_item(user_id, name).await {
            Ok(item) => added.push(item),
            Err(e) => return Err(interrupted(shopping_names(&added), total, e)),
        }
    }

    info!(user_id = %user_id, added = added.len(), "Smart replenish finished");
    Ok(added)
}

/// Photograph food or a receipt and store what the model recognised
///
/// The tier is checked before the image is sent anywhere.
pub async fn scan_and_import(
    store: &dyn ItemStore,
    inference: &dyn InferenceService,
    user_id: Uuid,
    tier: SubscriptionTier,
    mode: ScanMode,
    image_base64: &str,
    now: DateTime<Utc>,
) -> Result<Vec<InventoryItem>, KitchenError> {
    tier.ensure_allowed(mode.feature())?;
    if image_base64.trim().is_empty() {
        return Err(KitchenError::InvalidInput("Image is empty".to_string()));
    }

    let detected = match mode {
        ScanMode::Food => inference.analyze_image(image_base64).await?,
        ScanMode::Receipt => inference.analyze_receipt(image_base64).await?,
    };
    import_detected_items(store, user_id, tier, mode, &detected, now).await
}

/// One round of recipe discovery from the current inventory
///
/// Free accounts get [`DAILY_FREE_EXPLORE_LIMIT`] rounds a day. The returned
/// usage only counts rounds that produced an answer; the caller stores it.
pub async fn explore_recipes(
    store: &dyn ItemStore,
    inference: &dyn InferenceService,
    user_id: Uuid,
    tier: SubscriptionTier,
    preferences: &Preferences,
    usage: Option<ExploreUsage>,
    today: NaiveDate,
) -> Result<ExploreOutcome, KitchenError> {
    let usage = usage.unwrap_or_else(|| ExploreUsage::new(today)).for_day(today);
    if !usage.can_generate(tier, today) {
        warn!(user_id = %user_id, count = usage.count, "Daily explore limit reached");
        return Err(KitchenError::QuotaExceeded {
            limit: DAILY_FREE_EXPLORE_LIMIT,
        });
    }

    let inventory = inventory_snapshot(store, user_id).await?;
    let recipes = inference
        .suggest_recipes(
            &inventory,
            preferences.household_size,
            &preferences.dietary_restrictions,
        )
        .await?;

    let usage = usage.record(today);
    info!(user_id = %user_id, recipes = recipes.len(), used = usage.count, "Recipes explored");
    Ok(ExploreOutcome { recipes, usage })
}

/// Build a week of dinners from the model's suggestions, Monday first
///
/// Needs something in the inventory. Days without a suggestion stay empty.
pub async fn generate_meal_plan(
    store: &dyn ItemStore,
    inference: &dyn InferenceService,
    user_id: Uuid,
    tier: SubscriptionTier,
    preferences: &Preferences,
) -> Result<WeeklyPlan, KitchenError> {
    tier.ensure_allowed(Feature::MealPlanGeneration)?;

    let inventory = inventory_snapshot(store, user_id).await?;
    if inventory.is_empty() {
        return Err(KitchenError::InvalidInput("Inventory is empty".to_string()));
    }
    let suggestions = inference
        .suggest_recipes(
            &inventory,
            preferences.household_size,
            &preferences.dietary_restrictions,
        )
        .await?;

    let mut plan = WeeklyPlan::new();
    for (recipe, day) in suggestions.iter().zip(PlanDay::WEEK) {
        plan.add_recipe(recipe, day);
    }
    info!(user_id = %user_id, planned = plan.entries().len(), "Meal plan generated");
    Ok(plan)
}

/// Nutrition notes for a single food
pub async fn analyze_nutrition(
    inference: &dyn InferenceService,
    tier: SubscriptionTier,
    food_name: &str,
) -> Result<NutritionReport, KitchenError> {
    tier.ensure_allowed(Feature::NutritionAnalysis)?;
    let food_name = food_name.trim();
    if food_name.is_empty() {
        return Err(KitchenError::InvalidInput("Food name is empty".to_string()));
    }
    inference.nutrition_analysis(food_name).await
}

/// Cancel the paid subscription, returning the tier the account drops to
///
/// The caller stores the returned tier. A failed cancellation leaves the
/// tier as it was.
pub async fn cancel_subscription(
    billing: &dyn BillingService,
    access_token: &str,
) -> Result<SubscriptionTier, KitchenError> {
    if access_token.trim().is_empty() {
        return Err(KitchenError::InvalidInput("Access token is empty".to_string()));
    }
    let tier = billing.cancel_subscription(access_token).await?;
    info!(tier = %tier, "Subscription cancelled");
    Ok(tier)
}
