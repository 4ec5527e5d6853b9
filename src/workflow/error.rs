use thiserror::Error;

use super::state::CookingState;
use crate::recipe::RecipeError;
use crate::timer::TimerError;

/// Failure of a single `apply`. The session is left exactly as it was.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("Illegal transition: '{event}' not allowed in {state} ({reason})")]
    IllegalTransition {
        state: CookingState,
        event: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error(transparent)]
    Recipe(#[from] RecipeError),
}

impl WorkflowError {
    pub(crate) fn illegal(state: CookingState, event: &'static str, reason: impl Into<String>) -> Self {
        WorkflowError::IllegalTransition {
            state,
            event,
            reason: reason.into(),
        }
    }
}
