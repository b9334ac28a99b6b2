//! # Inference Module
//!
//! Structured suggestions from a generative model: food and receipt scans,
//! recipe ideas, shopping-list replenishment and nutrition notes. The model is
//! an opaque oracle; only the JSON shape of its answers matters here.
//!
//! When no API key is configured [`MockInference`] answers instead, so the
//! reconciliation code downstream always receives well-formed data.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::config::AppConfig;
use crate::errors::KitchenError;
use crate::kitchen_model::{InventoryItem, Recipe};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const SYSTEM_INSTRUCTION: &str = "You are an AI assistant for a kitchen management app called \
\"ScandiBox\". Your goal is to identify food items from images, estimate their shelf life, and \
suggest recipes. Always return responses in pure JSON format without Markdown code blocks when \
asked for data.";

const FOOD_SCAN_PROMPT: &str = "Identify the food items in this image. Return a JSON array where \
each object has: 'name' (string), 'category' (one of Produce, Dairy, Meat, Pantry, Frozen, \
Beverages, Other), 'quantity' (string estimate), and 'daysUntilExpiry' (estimated integer based on \
typical shelf life of fresh produce/goods). Return ONLY the JSON.";

const RECEIPT_SCAN_PROMPT: &str = "This is a grocery receipt. List every food item bought. Return \
a JSON array where each object has: 'name' (string, plain product name without brand codes), \
'category' (one of Produce, Dairy, Meat, Pantry, Frozen, Beverages, Other), 'quantity' (string, \
as printed or '1'), and 'daysUntilExpiry' (estimated integer). Ignore non-food lines, totals and \
discounts. Return ONLY the JSON.";

/// One item reported by an image or receipt scan; any field may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub days_until_expiry: Option<i64>,
}

/// Short nutrition summary for a single food
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionReport {
    pub calories: String,
    pub benefits: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Identify food items in a base64-encoded JPEG
    async fn analyze_image(&self, image_base64: &str) -> Result<Vec<DetectedItem>, KitchenError>;

    /// Read the food lines of a base64-encoded receipt photo
    async fn analyze_receipt(&self, image_base64: &str) -> Result<Vec<DetectedItem>, KitchenError>;

    async fn suggest_recipes(
        &self,
        inventory: &[InventoryItem],
        household_size: u32,
        dietary_restrictions: &[String],
    ) -> Result<Vec<Recipe>, KitchenError>;

    /// Item names worth adding to the shopping list
    async fn generate_shopping_list(&self, inventory: &[InventoryItem]) -> Result<Vec<String>, KitchenError>;

    async fn nutrition_analysis(&self, food_name: &str) -> Result<NutritionReport, KitchenError>;

    fn is_mock(&self) -> bool {
        false
    }
}

/// Strip Markdown code fences the model sometimes wraps around JSON
pub fn clean_json_string(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

fn parse_json<T: serde::de::DeserializeOwned>(text: &str, what: &str) -> Result<T, KitchenError> {
    serde_json::from_str(clean_json_string(text))
        .map_err(|e| KitchenError::Inference(format!("Unparseable {what} payload: {e}")))
}

/// Parse a scan answer into detected items
pub fn parse_detected_items(text: &str) -> Result<Vec<DetectedItem>, KitchenError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    parse_json(text, "scan")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecipeSuggestion {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    ingredients: Vec<String>,
    #[serde(default)]
    instructions: Vec<String>,
    #[serde(default)]
    time_estimate: String,
    #[serde(default, deserialize_with = "crate::kitchen_model::deserialize_match_score")]
    match_score: u8,
    #[serde(default)]
    calories: Option<u32>,
}

/// Parse a recipe answer, assigning ids `gen-<batch>-<index>`
///
/// Suggestions without a title are dropped. Match scores are clamped to 0-100.
pub fn parse_recipes(text: &str, batch: i64) -> Result<Vec<Recipe>, KitchenError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let suggestions: Vec<RecipeSuggestion> = parse_json(text, "recipe")?;
    Ok(suggestions
        .into_iter()
        .filter(|s| !s.title.trim().is_empty())
        .enumerate()
        .map(|(index, s)| {
            let mut recipe = Recipe::new(&format!("gen-{batch}-{index}"), s.title.trim())
                .with_description(&s.description)
                .with_ingredients(&s.ingredients)
                .with_instructions(&s.instructions)
                .with_time_estimate(&s.time_estimate)
                .with_match_score(i64::from(s.match_score));
            recipe.calories = s.calories;
            recipe
        })
        .collect())
}

/// Parse a list of item names, dropping blanks and exact duplicates
pub fn parse_string_list(text: &str) -> Result<Vec<String>, KitchenError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let names: Vec<String> = parse_json(text, "shopping list")?;
    let mut seen = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim().to_string();
        if !name.is_empty() && !seen.contains(&name) {
            seen.push(name);
        }
    }
    Ok(seen)
}

pub fn parse_nutrition(text: &str) -> Result<NutritionReport, KitchenError> {
    parse_json(text, "nutrition")
}

/// Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, parts: Value, json_output: bool) -> Result<String, KitchenError> {
        let mut body = json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{ "role": "user", "parts": parts }]
        });
        if json_output {
            body["generationConfig"] = json!({ "responseMimeType": "application/json" });
        }

        let url = format!("{GEMINI_API_BASE}/{}:generateContent", self.model);
        debug!(model = %self.model, "Calling inference service");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| KitchenError::Inference(format!("Request failed: {e}")))?;

        let status = response.status();
        let response_json: Value = response
            .json()
            .await
            .map_err(|e| KitchenError::Inference(format!("Invalid response body: {e}")))?;

        if !status.is_success() {
            let message = response_json["error"]["message"]
                .as_str()
                .unwrap_or("unknown error");
            error!(status = %status, "Inference request rejected: {}", message);
            return Err(KitchenError::Inference(format!("{status}: {message}")));
        }

        extract_text(&response_json)
    }

    async fn scan(&self, image_base64: &str, prompt: &str) -> Result<Vec<DetectedItem>, KitchenError> {
        let parts = json!([
            { "inline_data": { "mime_type": "image/jpeg", "data": image_base64 } },
            { "text": prompt }
        ]);
        let text = self.generate(parts, true).await?;
        parse_detected_items(&text)
    }
}

/// Text of the first candidate of a `generateContent` response
pub fn extract_text(response: &Value) -> Result<String, KitchenError> {
    response["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| KitchenError::Inference("Invalid response format".to_string()))
}

fn inventory_summary(inventory: &[InventoryItem]) -> String {
    inventory
        .iter()
        .map(|i| format!("{} {}", i.quantity, i.name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl InferenceService for GeminiClient {
    async fn analyze_image(&self, image_base64: &str) -> Result<Vec<DetectedItem>, KitchenError> {
        self.scan(image_base64, FOOD_SCAN_PROMPT).await
    }

    async fn analyze_receipt(&self, image_base64: &str) -> Result<Vec<DetectedItem>, KitchenError> {
        self.scan(image_base64, RECEIPT_SCAN_PROMPT).await
    }

    async fn suggest_recipes(
        &self,
        inventory: &[InventoryItem],
        household_size: u32,
        dietary_restrictions: &[String],
    ) -> Result<Vec<Recipe>, KitchenError> {
        let diet = if dietary_restrictions.is_empty() {
            "none".to_string()
        } else {
            dietary_restrictions.join(", ")
        };
        let prompt = format!(
            "Given these ingredients: {}. Suggest 3 healthy, scandinavian-inspired or simple \
             recipes for a household of {} people. Dietary restrictions: {}. Return a JSON array \
             of objects with 'title', 'description', 'ingredients' (array of strings), \
             'instructions' (array of strings), 'timeEstimate', 'matchScore' (0-100 integer) \
             and 'calories' (integer per serving).",
            inventory_summary(inventory),
            household_size.max(1),
            diet
        );
        let text = self.generate(json!([{ "text": prompt }]), true).await?;
        parse_recipes(&text, chrono::Utc::now().timestamp_millis())
    }

    async fn generate_shopping_list(&self, inventory: &[InventoryItem]) -> Result<Vec<String>, KitchenError> {
        let listing = inventory
            .iter()
            .map(|i| match i.days_until_expiry {
                Some(days) => format!("{} (Expires in {} days)", i.name, days),
                None => i.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let prompt = format!(
            "Analyze this inventory: {listing}. 1. Identify items that are expiring soon or likely \
             low in stock. 2. Suggest 5-8 essential items that are missing for a balanced \
             Scandinavian kitchen (e.g. basics, fresh produce). Return ONLY a JSON array of \
             strings (the item names)."
        );
        let text = self.generate(json!([{ "text": prompt }]), true).await?;
        parse_string_list(&text)
    }

    async fn nutrition_analysis(&self, food_name: &str) -> Result<NutritionReport, KitchenError> {
        let prompt = format!(
            "Give a short nutrition analysis of {food_name}. Return a JSON object with 'calories' \
             (string, energy per 100g), 'benefits' (one sentence) and optionally 'warning' (one \
             sentence, only when relevant)."
        );
        let text = self.generate(json!([{ "text": prompt }]), true).await?;
        parse_nutrition(&text)
    }
}

/// Fixed answers used when no inference credentials are configured
#[derive(Debug, Clone, Copy, Default)]
pub struct MockInference;

impl MockInference {
    pub fn scan_payload() -> Vec<DetectedItem> {
        vec![
            DetectedItem {
                name: Some("Detected Apple".to_string()),
                category: Some("Produce".to_string()),
                quantity: Some("3".to_string()),
                days_until_expiry: Some(7),
            },
            DetectedItem {
                name: Some("Detected Milk".to_string()),
                category: Some("Dairy".to_string()),
                quantity: Some("1L".to_string()),
                days_until_expiry: Some(5),
            },
        ]
    }
}

#[async_trait]
impl InferenceService for MockInference {
    async fn analyze_image(&self, _image_base64: &str) -> Result<Vec<DetectedItem>, KitchenError> {
        warn!("No inference API key configured, returning mock scan data");
        Ok(Self::scan_payload())
    }

    async fn analyze_receipt(&self, _image_base64: &str) -> Result<Vec<DetectedItem>, KitchenError> {
        warn!("No inference API key configured, returning mock scan data");
        Ok(Self::scan_payload())
    }

    async fn suggest_recipes(
        &self,
        _inventory: &[InventoryItem],
        _household_size: u32,
        _dietary_restrictions: &[String],
    ) -> Result<Vec<Recipe>, KitchenError> {
        Ok(Vec::new())
    }

    async fn generate_shopping_list(&self, _inventory: &[InventoryItem]) -> Result<Vec<String>, KitchenError> {
        Ok(Vec::new())
    }

    async fn nutrition_analysis(&self, food_name: &str) -> Result<NutritionReport, KitchenError> {
        Ok(NutritionReport {
            calories: "unknown".to_string(),
            benefits: format!("No analysis available for {food_name} without an inference key"),
            warning: None,
        })
    }

    fn is_mock(&self) -> bool {
        true
    }
}

/// Gemini when an API key is configured, the mock otherwise
pub fn inference_from_config(config: &AppConfig) -> Box<dyn InferenceService> {
    match config.gemini_api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(key) => Box::new(GeminiClient::new(key, &config.gemini_model)),
        None => {
            warn!("Gemini API key is missing. AI features will use mock data.");
            Box::new(MockInference)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_json_string_strips_fences() {
        assert_eq!(clean_json_string("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(clean_json_string("```\n{}\n```"), "{}");
        assert_eq!(clean_json_string("  [\"milk\"] "), "[\"milk\"]");
    }

    #[test]
    fn test_parse_detected_items_tolerates_missing_fields() {
        let items = parse_detected_items(
            r#"```json
            [{"name":"Banana","category":"Produce","daysUntilExpiry":4},{"quantity":"2"}]
            ```"#,
        )
        .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name.as_deref(), Some("Banana"));
        assert_eq!(items[0].quantity, None);
        assert_eq!(items[1].name, None);
    }

    #[test]
    fn test_parse_recipes_assigns_ids_and_clamps_scores() {
        let recipes = parse_recipes(
            r#"[{"title":"Fish soup","matchScore":140,"ingredients":["cod"]},
                {"title":"  "},
                {"title":"Rye bread","matchScore":-5}]"#,
            1700,
        )
        .unwrap();
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].id, "gen-1700-0");
        assert_eq!(recipes[0].match_score, 100);
        assert_eq!(recipes[1].id, "gen-1700-1");
        assert_eq!(recipes[1].match_score, 0);
    }

    #[test]
    fn test_parse_string_list_dedupes() {
        let names = parse_string_list(r#"["Milk", " ", "Eggs", "Milk"]"#).unwrap();
        assert_eq!(names, vec!["Milk", "Eggs"]);
        assert!(parse_string_list("").unwrap().is_empty());
    }

    #[test]
    fn test_garbage_payload_is_an_inference_error() {
        assert!(matches!(
            parse_recipes("Sorry, I cannot help", 1),
            Err(KitchenError::Inference(_))
        ));
    }

    #[test]
    fn test_extract_text() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "text": "[]" }] } }]
        });
        assert_eq!(extract_text(&response).unwrap(), "[]");
        assert!(extract_text(&json!({})).is_err());
    }

    #[tokio::test]
    async fn test_mock_returns_fixed_scan_payload() {
        let mock = MockInference;
        let items = mock.analyze_image("ignored").await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name.as_deref(), Some("Detected Apple"));
        assert_eq!(items[1].quantity.as_deref(), Some("1L"));
        assert!(mock.suggest_recipes(&[], 2, &[]).await.unwrap().is_empty());
        assert!(mock.is_mock());
    }
}
