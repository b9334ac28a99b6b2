//! # Localization Tests
//!
//! Message retrieval, language fallback and plural selection for the
//! embedded English and Norwegian bundles.

use scandibox::errors::KitchenError;
use scandibox::kitchen_model::Language;
use scandibox::localization::{describe_error, t, t_args, LocalizationManager};
use scandibox::subscription::{Feature, SubscriptionTier};
use std::collections::HashMap;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> LocalizationManager {
        LocalizationManager::new().expect("Failed to create localization manager")
    }

    #[test]
    fn test_get_message_existing_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("inventory-title", "en", None);
        assert_eq!(message, "Inventory");
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("nonexistent-key", "en", None);
        assert_eq!(message, "Missing translation: nonexistent-key");
    }

    #[test]
    fn test_get_message_unsupported_language() {
        let manager = setup_localization();

        assert!(!manager.is_language_supported("fr"));
        let message = manager.get_message_in_language("inventory-title", "fr", None);
        assert_eq!(message, "Inventory");
    }

    #[test]
    fn test_norwegian_differs_from_english() {
        let manager = setup_localization();

        assert!(manager.is_language_supported("no"));
        let norwegian = manager.get_message_in_language("inventory-title", "no", None);
        assert_eq!(norwegian, "Beholdning");
    }

    #[test]
    fn test_get_message_with_args() {
        let manager = setup_localization();

        let mut args = HashMap::new();
        args.insert("name", "Almond Milk");

        let message = manager.get_message_in_language("item-added", "en", Some(&args));
        assert_eq!(message, "Added Almond Milk to inventory.");
    }

    #[test]
    fn test_zero_added_is_reported_as_success() {
        let message = t_args(Language::En, "missing-added", &[("count", "0")]);
        assert!(message.contains("0 items added"));
        assert!(message.starts_with("Everything is in stock"));
    }

    #[test]
    fn test_plural_selection() {
        assert_eq!(
            t_args(Language::En, "trip-complete", &[("count", "1")]),
            "Trip finished. Moved 1 item to inventory."
        );
        assert_eq!(
            t_args(Language::En, "trip-complete", &[("count", "3")]),
            "Trip finished. Moved 3 items to inventory."
        );
        assert_eq!(
            t_args(Language::No, "trip-complete", &[("count", "3")]),
            "Handleturen er ferdig. Flyttet 3 varer til beholdningen."
        );
    }

    #[test]
    fn test_every_english_key_has_a_norwegian_translation() {
        let manager = setup_localization();
        let keys = [
            "inventory-title",
            "inventory-empty",
            "item-added",
            "recipe-status",
            "missing-added",
            "trip-complete",
            "deduction-prompt",
            "deduction-applied",
            "scan-complete",
            "scan-empty",
            "feature-locked",
            "explore-limit-reached",
            "explore-recipe",
            "explore-remaining",
            "meal-plan-generated",
            "nutrition-calories",
            "plan-activated",
            "subscription-cancelled",
            "error-partial",
            "error-partial-applied",
        ];
        for key in keys {
            let message = manager.get_message_in_language(key, "no", None);
            assert!(!message.starts_with("Missing translation"), "{key} missing in no");
        }
        for feature in [
            Feature::SmartScan,
            Feature::ReceiptScan,
            Feature::TripToInventory,
            Feature::SmartReplenish,
            Feature::MealPlanGeneration,
            Feature::NutritionAnalysis,
            Feature::UnlimitedExplore,
        ] {
            assert!(!t(Language::No, feature.message_key()).starts_with("Missing translation"));
        }
    }

    #[test]
    fn test_describe_feature_locked() {
        let err = KitchenError::FeatureLocked {
            feature: Feature::ReceiptScan,
            required: SubscriptionTier::Pro,
        };
        assert_eq!(describe_error(Language::En, &err), "Receipt Scan is a Pro feature.");
    }

    #[test]
    fn test_describe_partial_batch() {
        let err = KitchenError::PartialBatch {
            completed: 2,
            total: 5,
            applied: vec!["eggs".to_string(), "milk".to_string()],
            reason: "timeout".to_string(),
        };
        assert_eq!(
            describe_error(Language::En, &err),
            "Stopped after 2 of 5 items. Run it again to finish the rest.\nAlready done: eggs, milk"
        );

        let nothing_done = KitchenError::PartialBatch {
            completed: 0,
            total: 1,
            applied: Vec::new(),
            reason: "timeout".to_string(),
        };
        assert_eq!(
            describe_error(Language::No, &nothing_done),
            "Stoppet etter 0 av 1 varer. Kjør på nytt for å fullføre resten."
        );
    }

    #[test]
    fn test_explore_remaining_plurals() {
        assert_eq!(
            t_args(Language::En, "explore-remaining", &[("remaining", "1")]),
            "1 free exploration left today."
        );
        assert_eq!(
            t_args(Language::No, "explore-remaining", &[("remaining", "0")]),
            "Ingen gratis utforskninger igjen i dag."
        );
    }

    #[test]
    fn test_describe_quota_exceeded() {
        let err = KitchenError::QuotaExceeded { limit: 3 };
        assert_eq!(
            describe_error(Language::En, &err),
            "Daily limit reached. Upgrade for unlimited recipes."
        );
    }
}
