use serde::{Deserialize, Serialize};

use crate::recipe::{CollectedIngredient, RecipeProposal};

/// Structured decision fed into the state machine
///
/// The interpreter produces one of these from a user utterance; the
/// orchestrator produces `ProposalsReceived` and `TimerTick` itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum WorkflowEvent {
    ProvideServings { servings: i64 },
    AddIngredients { ingredients: Vec<CollectedIngredient> },
    FinishCollecting,
    ProposalsReceived { candidates: Vec<RecipeProposal> },
    /// Zero-based index into the held candidates
    SelectRecipe { index: usize },
    RejectAll,
    Advance,
    CompleteStep,
    SkipStep,
    TimerTick,
    StartTimer { seconds: i64 },
    CancelTimer,
    AdjustServings { servings: i64 },
    AskQuestion { question: String },
    Restart,
}

impl WorkflowEvent {
    /// Tag used on the wire and in the expected-input schema
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowEvent::ProvideServings { .. } => "provide_servings",
            WorkflowEvent::AddIngredients { .. } => "add_ingredients",
            WorkflowEvent::FinishCollecting => "finish_collecting",
            WorkflowEvent::ProposalsReceived { .. } => "proposals_received",
            WorkflowEvent::SelectRecipe { .. } => "select_recipe",
            WorkflowEvent::RejectAll => "reject_all",
            WorkflowEvent::Advance => "advance",
            WorkflowEvent::CompleteStep => "complete_step",
            WorkflowEvent::SkipStep => "skip_step",
            WorkflowEvent::TimerTick => "timer_tick",
            WorkflowEvent::StartTimer { .. } => "start_timer",
            WorkflowEvent::CancelTimer => "cancel_timer",
            WorkflowEvent::AdjustServings { .. } => "adjust_servings",
            WorkflowEvent::AskQuestion { .. } => "ask_question",
            WorkflowEvent::Restart => "restart",
        }
    }
}
