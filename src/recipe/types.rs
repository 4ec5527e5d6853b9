// Core data types for recipes and ingredients

use serde::{Deserialize, Serialize};

/// How a quantity is rounded after scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Measured amounts (grams, ml, cups), rounded to two decimals
    Continuous,
    /// Counted items (eggs, cloves), rounded to a whole number of at least one
    Discrete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub amount: f64,
    pub unit: Option<String>,
    pub kind: UnitKind,
}

/// Ingredient of a confirmed recipe, holding its base (unscaled) quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: Quantity,
    pub preparation: Option<String>,
}

/// Quantity of an ingredient for the requested number of servings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledQuantity {
    pub amount: f64,
    pub unit: Option<String>,
    pub kind: UnitKind,
}

impl std::fmt::Display for ScaledQuantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            UnitKind::Discrete => write!(f, "{}", self.amount as i64)?,
            UnitKind::Continuous => {
                let text = format!("{:.2}", self.amount);
                write!(f, "{}", text.trim_end_matches('0').trim_end_matches('.'))?
            }
        }
        if let Some(unit) = &self.unit {
            write!(f, " {unit}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StepStatus {
    #[default]
    Pending,
    Done,
    Skipped,
}

/// One instruction of a confirmed recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub index: usize,
    pub instruction: String,
    /// Nominal duration in seconds, always positive when present
    pub duration_secs: Option<i64>,
    /// Names of the recipe ingredients used in this step
    pub ingredients: Vec<String>,
    pub status: StepStatus,
}

impl Step {
    pub fn is_timed(&self) -> bool {
        self.duration_secs.is_some()
    }
}

/// Ingredient the user said they have, quantity optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedIngredient {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<String>,
}

impl CollectedIngredient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: None,
        }
    }

    pub fn with_quantity(name: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: Some(quantity.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Ingredient line as proposed by the language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedIngredient {
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub unit: Option<String>,
    /// Rounding rule; inferred from `unit` when absent (no unit means counted)
    #[serde(default)]
    pub kind: Option<UnitKind>,
    #[serde(default)]
    pub preparation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedStep {
    pub instruction: String,
    #[serde(default)]
    pub duration_secs: Option<i64>,
    #[serde(default)]
    pub ingredients: Vec<String>,
}

/// Candidate recipe returned by the recipe source, not yet validated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeProposal {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    pub base_servings: i64,
    pub ingredients: Vec<ProposedIngredient>,
    pub steps: Vec<ProposedStep>,
}
