use chrono::{DateTime, Utc};

use super::state::CookingState;
use crate::recipe::{CollectedIngredient, Recipe, RecipeProposal, Step};
use crate::timer::{TimerManager, TimerReading};

/// Everything one cooking conversation knows
///
/// A session owns its recipe, candidates, collected ingredients and timers
/// outright. It is only changed through `apply`, which works on a copy and
/// swaps it in when the whole transition succeeded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowSession {
    pub(crate) state: CookingState,
    pub(crate) servings: Option<u32>,
    pub(crate) collected: Vec<CollectedIngredient>,
    pub(crate) candidates: Vec<RecipeProposal>,
    pub(crate) recipe: Option<Recipe>,
    pub(crate) current_step: usize,
    pub(crate) timers: TimerManager,
}

impl WorkflowSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CookingState {
        self.state
    }

    pub fn servings(&self) -> Option<u32> {
        self.servings
    }

    pub fn collected_ingredients(&self) -> &[CollectedIngredient] {
        &self.collected
    }

    pub fn candidates(&self) -> &[RecipeProposal] {
        &self.candidates
    }

    pub fn recipe(&self) -> Option<&Recipe> {
        self.recipe.as_ref()
    }

    pub fn timers(&self) -> &TimerManager {
        &self.timers
    }

    /// Index of the step being presented or executed
    pub fn current_step_index(&self) -> Option<usize> {
        match self.state {
            CookingState::CookingGuidance | CookingState::StepExecution => Some(self.current_step),
            _ => None,
        }
    }

    pub fn current_step(&self) -> Option<&Step> {
        let index = self.current_step_index()?;
        self.recipe.as_ref()?.steps().get(index)
    }

    /// Timer of the step currently being executed, polled at `now`
    pub fn poll_active_timer(&mut self, now: DateTime<Utc>) -> Option<TimerReading> {
        if self.state != CookingState::StepExecution {
            return None;
        }
        let id = self.timers.latest_for_step(self.current_step)?;
        self.timers.poll(id, now).ok()
    }

    /// Every timer of the session that is still counting down
    pub fn running_timers(&mut self, now: DateTime<Utc>) -> Vec<TimerReading> {
        self.timers.running(now)
    }

    /// Check the structural invariants that every committed session holds
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.state.has_recipe() != self.recipe.is_some() {
            return Err(format!(
                "state {} with recipe present = {}",
                self.state,
                self.recipe.is_some()
            ));
        }

        if self.state == CookingState::StepExecution {
            let len = self.recipe.as_ref().map_or(0, Recipe::len);
            if self.current_step >= len {
                return Err(format!("current step {} outside 0..{len}", self.current_step));
            }
        }

        if self.state == CookingState::RecipeConfirmation && self.candidates.is_empty() {
            return Err("confirming with no candidates".to_string());
        }

        if !self.state.has_recipe() && !self.timers.is_empty() {
            return Err(format!("{} timers alive without a recipe", self.timers.len()));
        }

        Ok(())
    }
}
