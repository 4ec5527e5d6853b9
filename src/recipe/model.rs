use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

use super::duration::infer_step_duration;
use super::types::*;
use crate::timer::MAX_TIMER_SECS;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecipeError {
    #[error("Malformed recipe: {reason}")]
    MalformedRecipe { reason: String },
    #[error("Index {index} out of range (have {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

fn malformed(reason: impl Into<String>) -> RecipeError {
    RecipeError::MalformedRecipe {
        reason: reason.into(),
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// The confirmed recipe being cooked
///
/// Base quantities and steps are fixed at construction. Only the requested
/// servings and each step's status change afterwards; scaled quantities are
/// always recomputed from the base values, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    name: String,
    description: Option<String>,
    difficulty: Option<Difficulty>,
    base_servings: u32,
    requested_servings: u32,
    ingredients: Vec<Ingredient>,
    steps: Vec<Step>,
}

impl Recipe {
    pub fn from_proposal(proposal: &RecipeProposal, requested_servings: u32) -> Result<Self, RecipeError> {
        let name = proposal.name.trim();
        if name.is_empty() {
            return Err(malformed("recipe has no name"));
        }
        if proposal.base_servings <= 0 {
            return Err(malformed(format!(
                "base servings must be positive, got {}",
                proposal.base_servings
            )));
        }
        let base_servings = u32::try_from(proposal.base_servings)
            .map_err(|_| malformed(format!("base servings too large: {}", proposal.base_servings)))?;
        if requested_servings == 0 {
            return Err(malformed("requested servings must be positive"));
        }
        if proposal.steps.is_empty() {
            return Err(malformed(format!("'{name}' has no steps")));
        }

        let mut seen = HashSet::new();
        let mut ingredients = Vec::with_capacity(proposal.ingredients.len());
        for proposed in &proposal.ingredients {
            let ingredient_name = proposed.name.trim();
            if ingredient_name.is_empty() {
                return Err(malformed("ingredient with an empty name"));
            }
            if !seen.insert(normalize_name(ingredient_name)) {
                return Err(malformed(format!("ingredient '{ingredient_name}' listed twice")));
            }
            if !proposed.amount.is_finite() || proposed.amount <= 0.0 {
                return Err(malformed(format!(
                    "ingredient '{ingredient_name}' has invalid amount {}",
                    proposed.amount
                )));
            }

            let unit = proposed
                .unit
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string);
            let kind = proposed.kind.unwrap_or(if unit.is_some() {
                UnitKind::Continuous
            } else {
                UnitKind::Discrete
            });

            ingredients.push(Ingredient {
                name: ingredient_name.to_string(),
                quantity: Quantity {
                    amount: proposed.amount,
                    unit,
                    kind,
                },
                preparation: proposed.preparation.clone().filter(|p| !p.trim().is_empty()),
            });
        }

        let mut steps = Vec::with_capacity(proposal.steps.len());
        for (index, proposed) in proposal.steps.iter().enumerate() {
            let instruction = proposed.instruction.trim();
            if instruction.is_empty() {
                return Err(malformed(format!("step {} has no instruction", index + 1)));
            }

            for referenced in &proposed.ingredients {
                if !seen.contains(&normalize_name(referenced)) {
                    return Err(malformed(format!(
                        "step {} uses '{}' which is not in the ingredient list",
                        index + 1,
                        referenced.trim()
                    )));
                }
            }

            let duration_secs = match proposed.duration_secs {
                Some(secs) if secs <= 0 => {
                    return Err(malformed(format!(
                        "step {} has non-positive duration {secs}s",
                        index + 1
                    )))
                }
                Some(secs) if secs > MAX_TIMER_SECS => {
                    return Err(malformed(format!(
                        "step {} lasts {secs}s, longer than a timer can run",
                        index + 1
                    )))
                }
                Some(secs) => Some(secs),
                None => infer_step_duration(instruction),
            };

            steps.push(Step {
                index,
                instruction: instruction.to_string(),
                duration_secs,
                ingredients: proposed.ingredients.iter().map(|i| i.trim().to_string()).collect(),
                status: StepStatus::Pending,
            });
        }

        debug!(
            recipe = %name,
            base_servings = base_servings,
            requested_servings = requested_servings,
            ingredients = ingredients.len(),
            steps = steps.len(),
            "Recipe built from proposal"
        );

        Ok(Self {
            name: name.to_string(),
            description: proposal.description.clone(),
            difficulty: proposal.difficulty,
            base_servings,
            requested_servings,
            ingredients,
            steps,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    pub fn base_servings(&self) -> u32 {
        self.base_servings
    }

    pub fn requested_servings(&self) -> u32 {
        self.requested_servings
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn multiplier(&self) -> f64 {
        f64::from(self.requested_servings) / f64::from(self.base_servings)
    }

    /// `base_amount * requested_servings / base_servings`, rounded to two
    /// decimals for measured units and to a whole number (minimum one) for
    /// counted ones. Measured amounts at the base servings are returned as
    /// written.
    pub fn scaled_quantity(&self, ingredient: &Ingredient) -> ScaledQuantity {
        let raw = ingredient.quantity.amount * f64::from(self.requested_servings)
            / f64::from(self.base_servings);

        let amount = match ingredient.quantity.kind {
            UnitKind::Continuous if self.requested_servings == self.base_servings => ingredient.quantity.amount,
            UnitKind::Continuous => (raw * 100.0).round() / 100.0,
            UnitKind::Discrete => raw.round().max(1.0),
        };

        ScaledQuantity {
            amount,
            unit: ingredient.quantity.unit.clone(),
            kind: ingredient.quantity.kind,
        }
    }

    /// Every ingredient paired with its scaled quantity, in recipe order
    pub fn scaled_ingredients(&self) -> Vec<(&Ingredient, ScaledQuantity)> {
        self.ingredients
            .iter()
            .map(|ingredient| (ingredient, self.scaled_quantity(ingredient)))
            .collect()
    }

    pub fn ingredient(&self, name: &str) -> Option<&Ingredient> {
        let wanted = normalize_name(name);
        self.ingredients.iter().find(|i| normalize_name(&i.name) == wanted)
    }

    pub fn step_at(&self, index: usize) -> Result<&Step, RecipeError> {
        self.steps.get(index).ok_or(RecipeError::IndexOutOfRange {
            index,
            len: self.steps.len(),
        })
    }

    pub fn set_requested_servings(&mut self, servings: u32) -> Result<(), RecipeError> {
        if servings == 0 {
            return Err(malformed("requested servings must be positive"));
        }
        self.requested_servings = servings;
        Ok(())
    }

    pub(crate) fn mark_step(&mut self, index: usize, status: StepStatus) -> Result<(), RecipeError> {
        let len = self.steps.len();
        let step = self
            .steps
            .get_mut(index)
            .ok_or(RecipeError::IndexOutOfRange { index, len })?;
        step.status = status;
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.steps.iter().all(|s| s.status != StepStatus::Pending)
    }
}
