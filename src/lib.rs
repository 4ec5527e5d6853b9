// Cooking Assistant Library - conversational cooking workflow
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod llm;
pub mod orchestrator;
pub mod recipe;
pub mod telemetry;
pub mod timer;
pub mod workflow;

// Re-export key types for easy access
pub use config::{config, CookingAssistantConfig};
pub use llm::{ChatClient, LlmAgent, LlmError};
pub use orchestrator::{
    Collaborators, CommandInterpreter, CookingAdvisor, InterpretationFailure, Interpreter, Orchestrator,
    RecipeSource, Reply, ReplyKind,
};
pub use recipe::{parse_duration, CollectedIngredient, Recipe, RecipeError, RecipeProposal};
pub use telemetry::{generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use timer::{format_duration, Clock, ManualClock, SystemClock, TimerError, TimerManager, TimerReading};
pub use workflow::{
    expected_input_schema, CookingState, Effect, ExpectedInput, Transition, WorkflowError, WorkflowEvent,
    WorkflowMachine, WorkflowSession,
};
