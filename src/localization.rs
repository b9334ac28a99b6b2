use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Arc;
use unic_langid::LanguageIdentifier;

use crate::errors::KitchenError;
use crate::kitchen_model::Language;

const FALLBACK_LANGUAGE: &str = "en";

const RESOURCES: [(&str, &str); 2] = [
    ("en", include_str!("../locales/en/main.ftl")),
    ("no", include_str!("../locales/no/main.ftl")),
];

/// Localized user-facing messages, English and Norwegian
pub struct LocalizationManager {
    bundles: HashMap<String, Arc<FluentBundle<FluentResource>>>,
}

impl LocalizationManager {
    /// Build bundles for every embedded language
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for (code, source) in RESOURCES {
            let locale: LanguageIdentifier = code.parse()?;
            let bundle = Self::create_bundle(&locale, source)?;
            bundles.insert(code.to_string(), Arc::new(bundle));
        }

        Ok(Self { bundles })
    }

    fn create_bundle(locale: &LanguageIdentifier, source: &str) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Plain text output; no bidi isolation marks around arguments
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Invalid Fluent resource for {locale}: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Duplicate Fluent messages for {locale}: {errors:?}"))?;

        Ok(bundle)
    }

    pub fn is_language_supported(&self, language: &str) -> bool {
        self.bundles.contains_key(language)
    }

    /// Message in English
    pub fn get_message(&self, key: &str, args: Option<&HashMap<&str, &str>>) -> String {
        self.get_message_in_language(key, FALLBACK_LANGUAGE, args)
    }

    /// Message in `language`, falling back to English for unknown languages
    ///
    /// Argument values that look numeric are passed as numbers so plural
    /// selectors can match them.
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let Some(bundle) = self
            .bundles
            .get(language)
            .or_else(|| self.bundles.get(FALLBACK_LANGUAGE))
        else {
            return format!("Missing translation: {key}");
        };

        let Some(pattern) = bundle.get_message(key).and_then(|msg| msg.value()) else {
            return format!("Missing translation: {key}");
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (name, value) in args {
                fluent_args.set(*name, FluentValue::try_number(*value));
            }
            fluent_args
        });

        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, fluent_args.as_ref(), &mut errors);
        if !errors.is_empty() {
            log::debug!("Formatting '{}' in '{}' reported {:?}", key, language, errors);
        }
        value.into_owned()
    }

    pub fn get_message_with_args(&self, key: &str, language: &str, args: &[(&str, &str)]) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, language, Some(&args_map))
    }
}

lazy_static! {
    static ref LOCALIZATION_MANAGER: Result<LocalizationManager, String> =
        LocalizationManager::new().map_err(|e| format!("{e:#}"));
}

/// Shared manager built on first use
pub fn get_localization_manager() -> Result<&'static LocalizationManager> {
    LOCALIZATION_MANAGER
        .as_ref()
        .map_err(|e| anyhow!("Localization unavailable: {e}"))
}

pub fn t(language: Language, key: &str) -> String {
    t_args(language, key, &[])
}

pub fn t_args(language: Language, key: &str, args: &[(&str, &str)]) -> String {
    match get_localization_manager() {
        Ok(manager) => manager.get_message_with_args(key, language.code(), args),
        Err(_) => format!("Missing translation: {key}"),
    }
}

/// User-facing description of a workflow error
pub fn describe_error(language: Language, err: &KitchenError) -> String {
    match err {
        KitchenError::Configuration(detail) => {
            t_args(language, "error-configuration", &[("detail", detail.as_str())])
        }
        KitchenError::Store(detail) | KitchenError::Inference(detail) | KitchenError::Billing(detail) => {
            t_args(language, "error-service", &[("detail", detail.as_str())])
        }
        KitchenError::PartialBatch {
            completed,
            total,
            applied,
            ..
        } => {
            let completed = completed.to_string();
            let total = total.to_string();
            let summary = t_args(
                language,
                "error-partial",
                &[("completed", completed.as_str()), ("total", total.as_str())],
            );
            if applied.is_empty() {
                return summary;
            }
            let items = applied.join(", ");
            let done = t_args(language, "error-partial-applied", &[("items", items.as_str())]);
            format!("{summary}\n{done}")
        }
        KitchenError::QuotaExceeded { .. } => t(language, "explore-limit-reached"),
        KitchenError::FeatureLocked { feature, required } => {
            let feature_name = t(language, feature.message_key());
            t_args(
                language,
                "feature-locked",
                &[("feature", feature_name.as_str()), ("tier", required.as_str())],
            )
        }
        KitchenError::InvalidInput(detail) => {
            t_args(language, "error-invalid-input", &[("detail", detail.as_str())])
        }
    }
}
