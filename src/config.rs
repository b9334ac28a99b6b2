//! Environment configuration.
//!
//! Every credential is optional at load time. A missing value only matters
//! when the feature depending on it is used: billing fails with a
//! configuration error, inference falls back to mock data.
//!
//! Without a database, items and the explore quota are kept as JSON files
//! under `SCANDIBOX_DATA_DIR`.

/// Local data directory used when none is configured
pub const DEFAULT_DATA_DIR: &str = ".scandibox";

use std::path::PathBuf;

use crate::inference::DEFAULT_GEMINI_MODEL;
use crate::subscription::PriceIds;

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub billing_functions_url: Option<String>,
    pub billing_anon_key: Option<String>,
    pub price_ids: PriceIds,
    /// Explicit opt-in to synthetic billing; never switched on by a failure
    pub sandbox_mode: bool,
    pub json_logs: bool,
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let flag = |key: &str| {
            get(key)
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false)
        };

        Self {
            database_url: get("DATABASE_URL"),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            billing_functions_url: get("BILLING_FUNCTIONS_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            billing_anon_key: get("BILLING_ANON_KEY"),
            price_ids: PriceIds {
                standard: get("PRICE_ID_STANDARD"),
                pro: get("PRICE_ID_PRO"),
                pro_max: get("PRICE_ID_PRO_MAX"),
            },
            sandbox_mode: flag("SANDBOX_MODE"),
            json_logs: get("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
            data_dir: PathBuf::from(get("SCANDIBOX_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())),
        }
    }

    /// Item file used when no database is configured
    pub fn local_store_path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }

    pub fn explore_usage_path(&self) -> PathBuf {
        self.data_dir.join("explore_usage.json")
    }
}
