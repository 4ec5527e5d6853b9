// Orchestrator Module - one request/response cycle per user turn
//
// Sequences interpretation, state machine application and collaborator
// calls. It holds no business rules of its own.

pub mod command;
pub mod messages;
#[allow(clippy::module_inception)]
pub mod orchestrator;
pub mod traits;

pub use command::{parse_ingredient_list, CommandInterpreter};
pub use orchestrator::{Collaborators, Orchestrator, Reply, ReplyKind};
pub use traits::{CookingAdvisor, InterpretationFailure, Interpreter, RecipeSource};
