//! # Inventory Conversions
//!
//! Pure planning functions that turn shopping-list entries, scan results,
//! manual entries and finished recipes into inventory changes. Nothing here
//! performs I/O; the caller applies the returned plan against a store (see
//! [`crate::workflows`]).

use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::KitchenError;
use crate::inference::DetectedItem;
use crate::kitchen_model::{
    Category, InventoryItem, NewInventoryItem, Recipe, ShoppingItem, DEFAULT_SHELF_LIFE_DAYS,
};
use crate::text_processing::normalize_name;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// One checked shopping entry and the inventory record it becomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripConversion {
    pub source: ShoppingItem,
    pub record: NewInventoryItem,
}

/// A manually entered inventory item, before defaults are applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntry {
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

/// Whole days from `now` until midnight UTC at the start of `target`, rounded up
///
/// # Examples
///
/// ```rust
/// use chrono::{Duration, TimeZone, Utc};
/// use scandibox::conversion::days_until;
///
/// let now = Utc.with_ymd_and_hms(2026, 10, 17, 15, 30, 0).unwrap();
/// let target = now.date_naive() + Duration::days(7);
/// assert_eq!(days_until(target, now), 7);
/// ```
pub fn days_until(target: NaiveDate, now: DateTime<Utc>) -> i64 {
    let target_start = target.and_time(chrono::NaiveTime::MIN).and_utc();
    let millis = (target_start - now).num_milliseconds();
    (millis as f64 / MILLIS_PER_DAY).ceil() as i64
}

/// Parse a user-supplied expiry date
///
/// Accepts a bare `YYYY-MM-DD` date or a full RFC 3339 timestamp, from which
/// only the UTC date is kept.
pub fn parse_expiry_date(raw: &str) -> Result<NaiveDate, KitchenError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| KitchenError::InvalidInput(format!("Invalid expiry date: {raw}")))
}

/// Plan the inventory records created by finishing a shopping trip
///
/// Every checked entry becomes one active record in category `Other` with
/// quantity "1", the target date as its expiry date and `daysUntilExpiry`
/// computed by [`days_until`]. Unchecked entries are skipped. Output order
/// follows input order.
pub fn plan_trip_conversion(
    items: &[ShoppingItem],
    target_expiry: NaiveDate,
    now: DateTime<Utc>,
) -> Vec<TripConversion> {
    let days = days_until(target_expiry, now);
    items
        .iter()
        .filter(|item| item.is_checked)
        .map(|item| TripConversion {
            source: item.clone(),
            record: NewInventoryItem::new(&item.name, Category::Other, now)
                .with_expiry_date(target_expiry)
                .with_days_until_expiry(days),
        })
        .collect()
}

/// Inventory items a finished recipe has probably used up
///
/// Joins the recipe's ingredients and instructions into one lowercase haystack
/// and flags every item whose normalized name or category appears in it.
/// Items keep their inventory order.
pub fn find_potential_deductions(recipe: &Recipe, inventory: &[InventoryItem]) -> Vec<InventoryItem> {
    let haystack = recipe
        .ingredients
        .iter()
        .chain(recipe.instructions.iter())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let deductions: Vec<InventoryItem> = inventory
        .iter()
        .filter(|item| {
            let name = normalize_name(&item.name);
            let category = normalize_name(item.category.as_str());
            (!name.is_empty() && haystack.contains(&name)) || haystack.contains(&category)
        })
        .cloned()
        .collect();

    debug!(
        "Recipe '{}' flags {} of {} inventory item(s) for deduction",
        recipe.title,
        deductions.len(),
        inventory.len()
    );
    deductions
}

/// Apply defaults to a manual inventory entry
///
/// A blank quantity becomes "1". Without an expiry date the item is assumed to
/// keep for [`DEFAULT_SHELF_LIFE_DAYS`].
pub fn manual_entry_to_new_item(entry: &ManualEntry, now: DateTime<Utc>) -> NewInventoryItem {
    let quantity = if entry.quantity.trim().is_empty() {
        "1"
    } else {
        entry.quantity.trim()
    };
    let item = NewInventoryItem::new(entry.name.trim(), entry.category, now).with_quantity(quantity);
    match entry.expiry_date {
        Some(expiry) => item
            .with_expiry_date(expiry)
            .with_days_until_expiry(days_until(expiry, now)),
        None => item.with_days_until_expiry(DEFAULT_SHELF_LIFE_DAYS),
    }
}

/// Turn scan results into inventory records
///
/// Entries lacking a name or a category are dropped. Unknown categories map to
/// `Other`, a missing quantity to "1" and a missing shelf life to
/// [`DEFAULT_SHELF_LIFE_DAYS`].
pub fn detected_to_new_items(detected: &[DetectedItem], now: DateTime<Utc>) -> Vec<NewInventoryItem> {
    detected
        .iter()
        .filter_map(|found| {
            let name = found.name.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
            let category = found.category.as_deref().filter(|c| !c.trim().is_empty())?;
            let quantity = found
                .quantity
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .unwrap_or("1");
            let days = found
                .days_until_expiry
                .filter(|d| *d != 0)
                .unwrap_or(DEFAULT_SHELF_LIFE_DAYS);
            Some(
                NewInventoryItem::new(name, Category::parse_lenient(category), now)
                    .with_quantity(quantity)
                    .with_days_until_expiry(days),
            )
        })
        .collect()
}
