//! Cooking session module tracking progress through a recipe's steps and the
//! inventory deductions proposed once the last step is done.
//!
//! ```text
//! NotStarted --start--> Stepping(0) --next/previous--> Stepping(i)
//! Stepping(last) --finish--> AwaitingDeductionConfirm | Closed
//! AwaitingDeductionConfirm --confirm/skip--> Closed
//! any --exit--> Closed
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::conversion::find_potential_deductions;
use crate::kitchen_model::{InventoryItem, Recipe};

/// An inventory item proposed for removal and whether the user keeps it selected
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeductionCandidate {
    pub item: InventoryItem,
    pub selected: bool,
}

/// Conversation state of a cooking session
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum CookingState {
    #[default]
    NotStarted,
    Stepping {
        step: usize,
    },
    AwaitingDeductionConfirm {
        candidates: Vec<DeductionCandidate>,
    },
    Closed,
}

/// Step-by-step cooking of one recipe
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CookingSession {
    recipe: Recipe,
    state: CookingState,
}

impl CookingSession {
    pub fn new(recipe: Recipe) -> Self {
        Self {
            recipe,
            state: CookingState::NotStarted,
        }
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn state(&self) -> &CookingState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, CookingState::Closed)
    }

    /// Index of the final step; a recipe without instructions has a single empty step
    fn last_step(&self) -> usize {
        self.recipe.instructions.len().saturating_sub(1)
    }

    /// Current instruction text while stepping
    pub fn current_instruction(&self) -> Option<&str> {
        match self.state {
            CookingState::Stepping { step } => self.recipe.instructions.get(step).map(String::as_str),
            _ => None,
        }
    }

    /// Begin at the first step. Only valid before the session has started.
    pub fn start(&mut self) -> bool {
        if self.state != CookingState::NotStarted {
            return false;
        }
        debug!(recipe = %self.recipe.title, "Cooking session started");
        self.state = CookingState::Stepping { step: 0 };
        true
    }

    /// Advance one step; no-op on the last step
    pub fn next(&mut self) -> bool {
        let last = self.last_step();
        match &mut self.state {
            CookingState::Stepping { step } if *step < last => {
                *step += 1;
                true
            }
            _ => false,
        }
    }

    /// Go back one step; no-op on the first step
    pub fn previous(&mut self) -> bool {
        match &mut self.state {
            CookingState::Stepping { step } if *step > 0 => {
                *step -= 1;
                true
            }
            _ => false,
        }
    }

    /// Finish cooking from the last step and scan the inventory for deductions
    ///
    /// With no candidates the session closes directly. Otherwise it waits for
    /// confirmation with every candidate preselected. Ignored unless the
    /// session is on its last step.
    pub fn finish(&mut self, inventory: &[InventoryItem]) -> bool {
        let last = self.last_step();
        if self.state != (CookingState::Stepping { step: last }) {
            return false;
        }

        let candidates: Vec<DeductionCandidate> = find_potential_deductions(&self.recipe, inventory)
            .into_iter()
            .map(|item| DeductionCandidate {
                item,
                selected: true,
            })
            .collect();

        if candidates.is_empty() {
            info!(recipe = %self.recipe.title, "Cooking finished with nothing to deduct");
            self.state = CookingState::Closed;
        } else {
            info!(
                recipe = %self.recipe.title,
                candidates = candidates.len(),
                "Cooking finished, awaiting deduction confirmation"
            );
            self.state = CookingState::AwaitingDeductionConfirm { candidates };
        }
        true
    }

    /// Flip the selection of one candidate. Returns the new selection state.
    pub fn toggle(&mut self, item_id: Uuid) -> Option<bool> {
        match &mut self.state {
            CookingState::AwaitingDeductionConfirm { candidates } => {
                let candidate = candidates.iter_mut().find(|c| c.item.id == item_id)?;
                candidate.selected = !candidate.selected;
                Some(candidate.selected)
            }
            _ => None,
        }
    }

    /// Ids currently selected for deduction
    pub fn selected_ids(&self) -> Vec<Uuid> {
        match &self.state {
            CookingState::AwaitingDeductionConfirm { candidates } => candidates
                .iter()
                .filter(|c| c.selected)
                .map(|c| c.item.id)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Accept the selection and close. Returns the ids to delete from inventory.
    pub fn confirm(&mut self) -> Option<Vec<Uuid>> {
        if !matches!(self.state, CookingState::AwaitingDeductionConfirm { .. }) {
            return None;
        }
        let ids = self.selected_ids();
        self.state = CookingState::Closed;
        Some(ids)
    }

    /// Discard the candidates and close without touching inventory
    pub fn skip(&mut self) -> bool {
        if !matches!(self.state, CookingState::AwaitingDeductionConfirm { .. }) {
            return false;
        }
        self.state = CookingState::Closed;
        true
    }

    /// Abandon the session from any state, dropping any selection
    pub fn exit(&mut self) {
        self.state = CookingState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kitchen_model::{Category, NewInventoryItem};
    use chrono::Utc;

    fn pancakes() -> Recipe {
        Recipe::new("r1", "Pancakes")
            .with_ingredients(&["2 eggs", "300ml milk", "flour"])
            .with_instructions(&["Whisk", "Rest", "Fry"])
    }

    #[test]
    fn test_session_steps_are_bounded() {
        let mut session = CookingSession::new(pancakes());
        assert!(!session.next());
        assert!(session.start());
        assert!(!session.start());
        assert!(!session.previous());
        assert_eq!(session.current_instruction(), Some("Whisk"));
        assert!(session.next());
        assert!(session.next());
        assert!(!session.next());
        assert_eq!(session.state(), &CookingState::Stepping { step: 2 });
        assert!(session.previous());
        assert_eq!(session.current_instruction(), Some("Rest"));
    }

    #[test]
    fn test_finish_only_on_last_step() {
        let mut session = CookingSession::new(pancakes());
        session.start();
        assert!(!session.finish(&[]));
        session.next();
        session.next();
        assert!(session.finish(&[]));
        assert!(session.is_closed());
    }

    #[test]
    fn test_recipe_without_instructions_can_finish() {
        let mut session = CookingSession::new(Recipe::new("r2", "Salad"));
        session.start();
        assert_eq!(session.current_instruction(), None);
        assert!(session.finish(&[]));
        assert!(session.is_closed());
    }

    #[test]
    fn test_toggle_outside_confirmation_is_ignored() {
        let mut session = CookingSession::new(pancakes());
        assert_eq!(session.toggle(Uuid::new_v4()), None);
        assert_eq!(session.confirm(), None);
        assert!(!session.skip());
    }

    #[test]
    fn test_state_serialization() {
        let mut session = CookingSession::new(pancakes());
        session.start();
        let eggs = NewInventoryItem::new("eggs", Category::Dairy, Utc::now()).into_item(Uuid::new_v4());
        session.next();
        session.next();
        session.finish(&[eggs]);

        let json = serde_json::to_string(&session).unwrap();
        let restored: CookingSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.state(), session.state());
    }
}
