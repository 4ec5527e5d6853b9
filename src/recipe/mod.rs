// Recipe Module - proposals from the language model and the confirmed recipe
//
// A `RecipeProposal` is whatever the collaborator returned. `Recipe` is the
// validated, servings-aware form that the cooking states work with.

pub mod duration;
pub mod model;
pub mod types;

pub use duration::{infer_step_duration, parse_duration};
pub use model::{Recipe, RecipeError};
pub use types::{
    CollectedIngredient, Difficulty, Ingredient, ProposedIngredient, ProposedStep, Quantity,
    RecipeProposal, ScaledQuantity, Step, StepStatus, UnitKind,
};
