// Workflow Module - cooking session state machine
//
// `WorkflowSession` is the whole state of one conversation. It only changes
// through `apply`, which either commits a complete transition or returns an
// error and leaves the session as it was.

pub mod error;
pub mod event;
pub mod machine;
pub mod schema;
pub mod session;
pub mod state;

pub use error::WorkflowError;
pub use event::WorkflowEvent;
pub use machine::{Effect, Transition, TransitionRecord, WorkflowMachine, DEFAULT_SERVINGS};
pub use schema::{expected_input_schema, DecisionSpec, ExpectedInput, FieldKind, FieldSpec};
pub use session::WorkflowSession;
pub use state::CookingState;
