//! # Kitchen Data Model
//!
//! This module defines the data structures shared by every kitchen flow:
//! inventory records, shopping-list entries, recipes and user profiles.
//!
//! ## Core Concepts
//!
//! - **InventoryItem**: a food item currently on hand, with a free-text quantity
//! - **ShoppingItem**: a free-text entry on the shopping list, checked or not
//! - **Recipe**: a suggested or saved recipe with ordered ingredients and steps
//! - **UserProfile**: account, subscription tier and household preferences
//!
//! ## Usage
//!
//! ```rust
//! use scandibox::kitchen_model::{Category, NewInventoryItem};
//! use chrono::Utc;
//!
//! let milk = NewInventoryItem::new("Milk", Category::Dairy, Utc::now())
//!     .with_quantity("1L")
//!     .with_days_until_expiry(5);
//! assert_eq!(milk.quantity, "1L");
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::subscription::SubscriptionTier;

/// Shelf life assumed when nothing better is known
pub const DEFAULT_SHELF_LIFE_DAYS: i64 = 7;

/// Food category of an inventory item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    Produce,
    Dairy,
    Meat,
    Pantry,
    Frozen,
    Beverages,
    #[default]
    Other,
}

/// Lifecycle status of an inventory item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Active,
    Consumed,
    Wasted,
}

/// A food item currently held by the household
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    /// Free-text magnitude and unit (e.g. "500g", "1L", "2")
    pub quantity: String,
    pub added_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_until_expiry: Option<i64>,
    #[serde(default)]
    pub status: ItemStatus,
}

/// An inventory record that has not been assigned an identifier yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub name: String,
    pub category: Category,
    pub quantity: String,
    pub added_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_until_expiry: Option<i64>,
    #[serde(default)]
    pub status: ItemStatus,
}

/// An entry on the shopping list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    pub id: Uuid,
    pub name: String,
    pub is_checked: bool,
}

/// Day of the week a planned recipe is assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlanDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// A recipe suggested by the inference service or saved by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    /// How well the recipe fits the current inventory (0-100)
    #[serde(default, deserialize_with = "deserialize_match_score")]
    pub match_score: u8,
    #[serde(default)]
    pub time_estimate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<PlanDay>,
}

/// Round any JSON number to a 0-100 score; `null` reads as 0
pub(crate) fn deserialize_match_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let score = Option::<f64>::deserialize(deserializer)?;
    Ok(score.map(|s| s.round().clamp(0.0, 100.0) as u8).unwrap_or(0))
}

/// Interface language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    No,
}

/// Household preferences attached to a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    pub household_size: u32,
    #[serde(default)]
    pub language: Language,
}

/// A user account with its subscription level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub subscription_tier: SubscriptionTier,
    #[serde(default)]
    pub family_name: String,
    pub preferences: Preferences,
}

impl Category {
    /// All categories in display order
    pub const ALL: [Category; 7] = [
        Category::Produce,
        Category::Dairy,
        Category::Meat,
        Category::Pantry,
        Category::Frozen,
        Category::Beverages,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Produce => "Produce",
            Category::Dairy => "Dairy",
            Category::Meat => "Meat",
            Category::Pantry => "Pantry",
            Category::Frozen => "Frozen",
            Category::Beverages => "Beverages",
            Category::Other => "Other",
        }
    }

    /// Parse a category leniently, mapping anything unrecognised to `Other`
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or(Category::Other)
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown category: {wanted}"))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Active => "active",
            ItemStatus::Consumed => "consumed",
            ItemStatus::Wasted => "wasted",
        }
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(ItemStatus::Active),
            "consumed" => Ok(ItemStatus::Consumed),
            "wasted" => Ok(ItemStatus::Wasted),
            other => Err(format!("Unknown item status: {other}")),
        }
    }
}

impl NewInventoryItem {
    /// Create an active record with quantity "1" and no expiry information
    pub fn new(name: &str, category: Category, added_date: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            category,
            quantity: "1".to_string(),
            added_date,
            expiry_date: None,
            days_until_expiry: None,
            status: ItemStatus::Active,
        }
    }

    pub fn with_quantity(mut self, quantity: &str) -> Self {
        self.quantity = quantity.to_string();
        self
    }

    pub fn with_expiry_date(mut self, expiry_date: NaiveDate) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }

    pub fn with_days_until_expiry(mut self, days: i64) -> Self {
        self.days_until_expiry = Some(days);
        self
    }

    /// Attach an identifier, producing a stored inventory item
    pub fn into_item(self, id: Uuid) -> InventoryItem {
        InventoryItem {
            id,
            name: self.name,
            category: self.category,
            quantity: self.quantity,
            added_date: self.added_date,
            expiry_date: self.expiry_date,
            days_until_expiry: self.days_until_expiry,
            status: self.status,
        }
    }
}

impl InventoryItem {
    /// Whether the item expires within the given number of days
    ///
    /// Items without expiry information count as expiring today.
    pub fn expires_within(&self, days: i64) -> bool {
        self.days_until_expiry.unwrap_or(0) <= days
    }
}

impl ShoppingItem {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            is_checked: false,
        }
    }
}

impl Recipe {
    /// Create a recipe with the given id and title and nothing else
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            ingredients: Vec::new(),
            instructions: Vec::new(),
            match_score: 0,
            time_estimate: String::new(),
            calories: None,
            day: None,
        }
    }

    pub fn with_ingredients<S: AsRef<str>>(mut self, ingredients: &[S]) -> Self {
        self.ingredients = ingredients.iter().map(|i| i.as_ref().to_string()).collect();
        self
    }

    pub fn with_instructions<S: AsRef<str>>(mut self, instructions: &[S]) -> Self {
        self.instructions = instructions.iter().map(|i| i.as_ref().to_string()).collect();
        self
    }

    pub fn with_match_score(mut self, score: i64) -> Self {
        self.match_score = score.clamp(0, 100) as u8;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_time_estimate(mut self, time_estimate: &str) -> Self {
        self.time_estimate = time_estimate.to_string();
        self
    }
}

impl PlanDay {
    pub const WEEK: [PlanDay; 7] = [
        PlanDay::Monday,
        PlanDay::Tuesday,
        PlanDay::Wednesday,
        PlanDay::Thursday,
        PlanDay::Friday,
        PlanDay::Saturday,
        PlanDay::Sunday,
    ];
}

impl FromStr for PlanDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PlanDay::WEEK
            .iter()
            .copied()
            .find(|d| d.to_string().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown day: {wanted}"))
    }
}

impl fmt::Display for PlanDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::No => "no",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "no" | "nb" | "nn" => Ok(Language::No),
            other => Err(format!("Unsupported language: {other}")),
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dietary_restrictions: Vec::new(),
            household_size: 1,
            language: Language::En,
        }
    }
}

impl UserProfile {
    /// A free-tier profile with default preferences
    pub fn new(id: Uuid, email: &str) -> Self {
        Self {
            id,
            email: email.to_string(),
            subscription_tier: SubscriptionTier::Free,
            family_name: String::new(),
            preferences: Preferences::default(),
        }
    }
}

impl fmt::Display for InventoryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]", self.quantity, self.name, self.category)?;
        if let Some(days) = self.days_until_expiry {
            write!(f, " ({days}d)")?;
        }
        Ok(())
    }
}
