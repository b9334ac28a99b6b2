//! # Subscription Tiers
//!
//! The tier ladder `Free < Standard < Pro < ProMax` gates features. A tier
//! allows every feature its lower tiers allow.

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

use crate::errors::KitchenError;

/// Recipe discovery generations a Free account gets per day
pub const DAILY_FREE_EXPLORE_LIMIT: u32 = 3;

/// Subscription level, ordered from least to most capable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum SubscriptionTier {
    #[default]
    Free,
    Standard,
    Pro,
    #[serde(rename = "Pro Max")]
    ProMax,
}

/// A tier-gated capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// Photograph food to add it to inventory
    SmartScan,
    /// Photograph a receipt to add its lines to inventory
    ReceiptScan,
    /// Move checked shopping items into inventory
    TripToInventory,
    /// AI suggestions for the shopping list
    SmartReplenish,
    /// AI meal plans from inventory
    MealPlanGeneration,
    /// Per-item nutrition analysis
    NutritionAnalysis,
    /// Recipe discovery without a daily quota
    UnlimitedExplore,
}

/// A purchasable plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    pub tier: SubscriptionTier,
    /// Monthly price in NOK
    pub price: u32,
    pub name: String,
    pub price_id: Option<String>,
    pub description: String,
    pub features: Vec<String>,
}

/// Billing price identifiers for the paid tiers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceIds {
    pub standard: Option<String>,
    pub pro: Option<String>,
    pub pro_max: Option<String>,
}

/// Free-tier recipe discovery usage for one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreUsage {
    pub date: NaiveDate,
    pub count: u32,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "Free",
            SubscriptionTier::Standard => "Standard",
            SubscriptionTier::Pro => "Pro",
            SubscriptionTier::ProMax => "Pro Max",
        }
    }

    pub fn allows(&self, feature: Feature) -> bool {
        *self >= feature.required_tier()
    }

    /// Fail with [`KitchenError::FeatureLocked`] when the tier is too low
    pub fn ensure_allowed(&self, feature: Feature) -> Result<(), KitchenError> {
        if self.allows(feature) {
            Ok(())
        } else {
            Err(KitchenError::FeatureLocked {
                feature,
                required: feature.required_tier(),
            })
        }
    }
}

impl FromStr for SubscriptionTier {
    type Err = KitchenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.to_lowercase().as_str() {
            "free" => Ok(SubscriptionTier::Free),
            "standard" => Ok(SubscriptionTier::Standard),
            "pro" => Ok(SubscriptionTier::Pro),
            "promax" => Ok(SubscriptionTier::ProMax),
            _ => Err(KitchenError::InvalidInput(format!("Unknown subscription tier: {s}"))),
        }
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Feature {
    pub fn required_tier(&self) -> SubscriptionTier {
        match self {
            Feature::SmartScan | Feature::TripToInventory | Feature::UnlimitedExplore => {
                SubscriptionTier::Standard
            }
            Feature::ReceiptScan | Feature::SmartReplenish | Feature::MealPlanGeneration => {
                SubscriptionTier::Pro
            }
            Feature::NutritionAnalysis => SubscriptionTier::ProMax,
        }
    }

    /// Key of the localized feature name
    pub fn message_key(&self) -> &'static str {
        match self {
            Feature::SmartScan => "feature-smart-scan",
            Feature::ReceiptScan => "feature-receipt-scan",
            Feature::TripToInventory => "feature-trip-to-inventory",
            Feature::SmartReplenish => "feature-smart-replenish",
            Feature::MealPlanGeneration => "feature-meal-plan",
            Feature::NutritionAnalysis => "feature-nutrition",
            Feature::UnlimitedExplore => "feature-unlimited-explore",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The paid plans, cheapest first
pub fn subscription_plans(prices: &PriceIds) -> Vec<SubscriptionPlan> {
    let features = |list: &[&str]| list.iter().map(|f| f.to_string()).collect::<Vec<_>>();
    vec![
        SubscriptionPlan {
            tier: SubscriptionTier::Standard,
            price: 50,
            name: "Standard".to_string(),
            price_id: prices.standard.clone(),
            description: "For the users".to_string(),
            features: features(&[
                "Unlimited Inventory",
                "Basic Expiry Alerts",
                "Manual Meal Planning",
                "1 User Account",
            ]),
        },
        SubscriptionPlan {
            tier: SubscriptionTier::Pro,
            price: 100,
            name: "Pro".to_string(),
            price_id: prices.pro.clone(),
            description: "For pro users".to_string(),
            features: features(&[
                "All the Standard features",
                "AI Receipt Scanning",
                "Weekly Meal Plans",
                "Smart Replenish (AI)",
            ]),
        },
        SubscriptionPlan {
            tier: SubscriptionTier::ProMax,
            price: 150,
            name: "Pro Max".to_string(),
            price_id: prices.pro_max.clone(),
            description: "For the big guys".to_string(),
            features: features(&[
                "All the Pro features",
                "Weekly Meal Plans",
                "Advanced AI Nutrition Analysis",
                "Priority Support",
            ]),
        },
    ]
}

impl SubscriptionPlan {
    /// Price id required to start checkout for this plan
    pub fn require_price_id(&self) -> Result<&str, KitchenError> {
        self.price_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                KitchenError::Configuration(format!("Missing price id for the {} plan", self.name))
            })
    }
}

impl ExploreUsage {
    pub fn new(date: NaiveDate) -> Self {
        Self { date, count: 0 }
    }

    /// Usage as of `today`; a record from an earlier day counts as zero
    pub fn for_day(self, today: NaiveDate) -> Self {
        if self.date == today {
            self
        } else {
            Self::new(today)
        }
    }

    pub fn can_generate(&self, tier: SubscriptionTier, today: NaiveDate) -> bool {
        tier.allows(Feature::UnlimitedExplore)
            || self.for_day(today).count < DAILY_FREE_EXPLORE_LIMIT
    }

    /// Record one generation, resetting the counter on a new day
    pub fn record(self, today: NaiveDate) -> Self {
        let current = self.for_day(today);
        Self {
            date: today,
            count: current.count + 1,
        }
    }

    pub fn remaining(&self, today: NaiveDate) -> u32 {
        DAILY_FREE_EXPLORE_LIMIT.saturating_sub(self.for_day(today).count)
    }
}

/// Per-user explore usage kept in a local JSON file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreLedger {
    usage: HashMap<Uuid, ExploreUsage>,
}

impl ExploreLedger {
    pub fn usage(&self, user_id: Uuid) -> Option<ExploreUsage> {
        self.usage.get(&user_id).copied()
    }

    pub fn set_usage(&mut self, user_id: Uuid, usage: ExploreUsage) {
        self.usage.insert(user_id, usage);
    }

    /// Load the ledger; a missing file is an empty ledger
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read explore usage {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse explore usage {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize explore usage")?;
        fs::write(path, content).with_context(|| format!("Failed to write explore usage {}", path.display()))
    }
}

/// The tier a command runs with
///
/// A requested override is only honoured in sandbox mode; otherwise the
/// stored tier is authoritative and asking for another one is an error.
pub fn effective_tier(
    stored: SubscriptionTier,
    requested: Option<SubscriptionTier>,
    sandbox_mode: bool,
) -> Result<SubscriptionTier, KitchenError> {
    match requested {
        None => Ok(stored),
        Some(tier) if sandbox_mode => {
            warn!(stored = %stored, requested = %tier, "Sandbox tier override");
            Ok(tier)
        }
        Some(_) => Err(KitchenError::Configuration(
            "Tier overrides require SANDBOX_MODE".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(SubscriptionTier::Free < SubscriptionTier::Standard);
        assert!(SubscriptionTier::Standard < SubscriptionTier::Pro);
        assert!(SubscriptionTier::Pro < SubscriptionTier::ProMax);
    }

    #[test]
    fn test_higher_tiers_are_supersets() {
        let features = [
            Feature::SmartScan,
            Feature::ReceiptScan,
            Feature::TripToInventory,
            Feature::SmartReplenish,
            Feature::MealPlanGeneration,
            Feature::NutritionAnalysis,
            Feature::UnlimitedExplore,
        ];
        let tiers = [
            SubscriptionTier::Free,
            SubscriptionTier::Standard,
            SubscriptionTier::Pro,
            SubscriptionTier::ProMax,
        ];
        for window in tiers.windows(2) {
            for feature in features {
                if window[0].allows(feature) {
                    assert!(window[1].allows(feature), "{:?} lost {:?}", window[1], feature);
                }
            }
        }
        assert!(features.iter().all(|f| SubscriptionTier::ProMax.allows(*f)));
        assert!(features.iter().all(|f| !SubscriptionTier::Free.allows(*f)));
    }

    #[test]
    fn test_ensure_allowed_reports_required_tier() {
        let err = SubscriptionTier::Standard
            .ensure_allowed(Feature::ReceiptScan)
            .unwrap_err();
        match err {
            KitchenError::FeatureLocked { feature, required } => {
                assert_eq!(feature, Feature::ReceiptScan);
                assert_eq!(required, SubscriptionTier::Pro);
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_tier_parsing_and_serde() {
        assert_eq!("Pro Max".parse::<SubscriptionTier>().unwrap(), SubscriptionTier::ProMax);
        assert_eq!("promax".parse::<SubscriptionTier>().unwrap(), SubscriptionTier::ProMax);
        assert!("Gold".parse::<SubscriptionTier>().is_err());
        assert_eq!(serde_json::to_string(&SubscriptionTier::ProMax).unwrap(), "\"Pro Max\"");
    }

    #[test]
    fn test_plans_require_price_ids() {
        let prices = PriceIds {
            standard: Some("price_standard".to_string()),
            pro: None,
            pro_max: Some("  ".to_string()),
        };
        let plans = subscription_plans(&prices);
        assert_eq!(plans.len(), 3);
        assert_eq!(plans[0].require_price_id().unwrap(), "price_standard");
        assert!(matches!(plans[1].require_price_id(), Err(KitchenError::Configuration(_))));
        assert!(matches!(plans[2].require_price_id(), Err(KitchenError::Configuration(_))));
    }

    #[test]
    fn test_explore_quota_for_free_tier() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let mut usage = ExploreUsage::new(today);
        for _ in 0..DAILY_FREE_EXPLORE_LIMIT {
            assert!(usage.can_generate(SubscriptionTier::Free, today));
            usage = usage.record(today);
        }
        assert!(!usage.can_generate(SubscriptionTier::Free, today));
        assert!(usage.can_generate(SubscriptionTier::Standard, today));
        assert_eq!(usage.remaining(today), 0);

        let tomorrow = today.succ_opt().unwrap();
        assert!(usage.can_generate(SubscriptionTier::Free, tomorrow));
        assert_eq!(usage.record(tomorrow).count, 1);
    }

    #[test]
    fn test_tier_override_needs_sandbox_mode() {
        let err = effective_tier(SubscriptionTier::Free, Some(SubscriptionTier::ProMax), false).unwrap_err();
        assert!(matches!(err, KitchenError::Configuration(_)));
        // A request matching the stored tier is still an override
        assert!(effective_tier(SubscriptionTier::Pro, Some(SubscriptionTier::Pro), false).is_err());

        assert_eq!(
            effective_tier(SubscriptionTier::Free, Some(SubscriptionTier::ProMax), true).unwrap(),
            SubscriptionTier::ProMax
        );
        assert_eq!(
            effective_tier(SubscriptionTier::Standard, None, false).unwrap(),
            SubscriptionTier::Standard
        );
    }

    #[test]
    fn test_explore_ledger_save_and_load() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("usage").join("explore.json");
        let user = Uuid::new_v4();
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();

        let mut ledger = ExploreLedger::load(&path)?;
        assert_eq!(ledger.usage(user), None);

        ledger.set_usage(user, ExploreUsage::new(today).record(today));
        ledger.save(&path)?;

        let loaded = ExploreLedger::load(&path)?;
        assert_eq!(loaded.usage(user).map(|u| u.count), Some(1));
        assert_eq!(loaded.usage(Uuid::new_v4()), None);
        Ok(())
    }
}
