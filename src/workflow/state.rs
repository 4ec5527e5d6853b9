use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the user is in the cooking process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CookingState {
    #[default]
    Starting,
    IngredientCollection,
    RecipeProposal,
    RecipeConfirmation,
    CookingGuidance,
    StepExecution,
    Completed,
}

impl CookingState {
    pub const ALL: [CookingState; 7] = [
        CookingState::Starting,
        CookingState::IngredientCollection,
        CookingState::RecipeProposal,
        CookingState::RecipeConfirmation,
        CookingState::CookingGuidance,
        CookingState::StepExecution,
        CookingState::Completed,
    ];

    /// States in which a confirmed recipe must be present
    pub fn has_recipe(self) -> bool {
        matches!(
            self,
            CookingState::CookingGuidance | CookingState::StepExecution | CookingState::Completed
        )
    }

    pub fn is_terminal(self) -> bool {
        self == CookingState::Completed
    }

    pub fn title(self) -> &'static str {
        match self {
            CookingState::Starting => "Starting",
            CookingState::IngredientCollection => "Ingredient Collection",
            CookingState::RecipeProposal => "Recipe Proposal",
            CookingState::RecipeConfirmation => "Recipe Confirmation",
            CookingState::CookingGuidance => "Cooking Guidance",
            CookingState::StepExecution => "Step Execution",
            CookingState::Completed => "Completed",
        }
    }
}

impl fmt::Display for CookingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
