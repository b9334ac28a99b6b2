//! Weekly meal planner: at most one recipe per day, kept in Monday..Sunday order.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

use crate::kitchen_model::{PlanDay, Recipe};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPlan {
    entries: Vec<Recipe>,
}

impl WeeklyPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Planned recipes ordered by day
    pub fn entries(&self) -> &[Recipe] {
        &self.entries
    }

    pub fn for_day(&self, day: PlanDay) -> Option<&Recipe> {
        self.entries.iter().find(|r| r.day == Some(day))
    }

    /// Plan a copy of `recipe` for `day`, replacing whatever was planned there
    ///
    /// Returns the id of the planned copy.
    pub fn add_recipe(&mut self, recipe: &Recipe, day: PlanDay) -> String {
        self.entries.retain(|r| r.day != Some(day));

        let mut planned = recipe.clone();
        planned.id = format!("plan-{}", Uuid::new_v4());
        planned.day = Some(day);
        let id = planned.id.clone();

        debug!(day = %day, recipe = %planned.title, "Recipe planned");
        self.entries.push(planned);
        self.entries.sort_by_key(|r| r.day);
        id
    }

    /// Remove a planned recipe by id. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|r| r.id != id);
        self.entries.len() < before
    }

    /// Every ingredient of the week, in plan order, without exact duplicates
    pub fn ingredients(&self) -> Vec<String> {
        let mut all: Vec<String> = Vec::new();
        for ingredient in self.entries.iter().flat_map(|r| r.ingredients.iter()) {
            if !all.contains(ingredient) {
                all.push(ingredient.clone());
            }
        }
        all
    }

    /// Load a plan from JSON; a missing file is an empty plan
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read meal plan {}", path.display()))?;
        let mut plan: WeeklyPlan = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse meal plan {}", path.display()))?;
        plan.entries.sort_by_key(|r| r.day);
        Ok(plan)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize meal plan")?;
        fs::write(path, content).with_context(|| format!("Failed to write meal plan {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn recipe(title: &str) -> Recipe {
        Recipe::new("gen-1-0", title).with_ingredients(&["2 eggs", "milk"])
    }

    #[test]
    fn test_add_replaces_day_and_keeps_week_order() {
        let mut plan = WeeklyPlan::new();
        plan.add_recipe(&recipe("Soup"), PlanDay::Friday);
        plan.add_recipe(&recipe("Pasta"), PlanDay::Monday);
        let id = plan.add_recipe(&recipe("Stew"), PlanDay::Friday);

        let days: Vec<_> = plan.entries().iter().map(|r| r.day).collect();
        assert_eq!(days, vec![Some(PlanDay::Monday), Some(PlanDay::Friday)]);
        assert_eq!(plan.for_day(PlanDay::Friday).map(|r| r.title.as_str()), Some("Stew"));
        assert!(id.starts_with("plan-"));
    }

    #[test]
    fn test_remove() {
        let mut plan = WeeklyPlan::new();
        let id = plan.add_recipe(&recipe("Soup"), PlanDay::Tuesday);
        assert!(plan.remove(&id));
        assert!(!plan.remove(&id));
        assert!(plan.entries().is_empty());
    }

    #[test]
    fn test_ingredients_are_deduplicated() {
        let mut plan = WeeklyPlan::new();
        plan.add_recipe(&recipe("Omelette"), PlanDay::Monday);
        plan.add_recipe(
            &Recipe::new("r", "Pancakes").with_ingredients(&["milk", "flour"]),
            PlanDay::Sunday,
        );
        assert_eq!(plan.ingredients(), vec!["2 eggs", "milk", "flour"]);
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("plan.json");

        assert!(WeeklyPlan::load(&path)?.entries().is_empty());

        let mut plan = WeeklyPlan::new();
        plan.add_recipe(&recipe("Soup"), PlanDay::Wednesday);
        plan.save(&path)?;

        let loaded = WeeklyPlan::load(&path)?;
        assert_eq!(loaded, plan);
        Ok(())
    }

    #[test]
    fn test_load_rejects_garbage() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("plan.json");
        fs::write(&path, "not json")?;
        assert!(WeeklyPlan::load(&path).is_err());
        Ok(())
    }
}
