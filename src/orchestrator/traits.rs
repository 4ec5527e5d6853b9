// Traits for dependency injection - the collaborators a cooking session talks to

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::recipe::{CollectedIngredient, RecipeProposal, Step};
use crate::workflow::{CookingState, ExpectedInput, WorkflowEvent};

/// The interpreter could not turn an utterance into a decision for the
/// current state. Always recoverable by asking again.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InterpretationFailure {
    #[error("I didn't understand \"{utterance}\"")]
    Unrecognized { utterance: String },

    #[error("'{decision}' isn't possible while in {state}")]
    UnexpectedDecision {
        decision: String,
        state: CookingState,
    },

    #[error("Could not read the decision: {0}")]
    InvalidDecision(String),

    #[error("Interpreter unavailable: {0}")]
    Unavailable(String),
}

/// Turns free text into a structured decision constrained by `expected`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn interpret(
        &self,
        utterance: &str,
        expected: &ExpectedInput,
    ) -> std::result::Result<WorkflowEvent, InterpretationFailure>;
}

/// Proposes candidate recipes for what the user has at hand
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn propose(
        &self,
        ingredients: &[CollectedIngredient],
        servings: u32,
        count: usize,
    ) -> Result<Vec<RecipeProposal>>;
}

/// Answers free-form questions about the step being cooked
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CookingAdvisor: Send + Sync {
    async fn answer(&self, step: &Step, question: &str) -> Result<String>;
}
