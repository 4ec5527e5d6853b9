//! Expected-input schema
//!
//! Describes, for the current state, which decisions the interpreter may
//! return and what fields each one carries. The same description is rendered
//! into the interpreter prompt and used to reject decisions the state cannot
//! accept before they reach the machine.

use serde::Serialize;
use serde_json::{json, Value};

use super::event::WorkflowEvent;
use super::session::WorkflowSession;
use super::state::CookingState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    PositiveInteger,
    Index,
    Seconds,
    Text,
    IngredientList,
}

impl FieldKind {
    fn json_schema(self) -> Value {
        match self {
            FieldKind::PositiveInteger => json!({ "type": "integer", "minimum": 1 }),
            FieldKind::Index => json!({ "type": "integer", "minimum": 0 }),
            FieldKind::Seconds => json!({ "type": "integer", "minimum": 1 }),
            FieldKind::Text => json!({ "type": "string" }),
            FieldKind::IngredientList => json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "quantity": { "type": ["string", "null"] }
                    },
                    "required": ["name"]
                }
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionSpec {
    pub decision: &'static str,
    pub description: &'static str,
    pub fields: Vec<FieldSpec>,
}

/// What the session is waiting for right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpectedInput {
    pub state: CookingState,
    pub prompt: String,
    pub decisions: Vec<DecisionSpec>,
    /// Named choices, e.g. candidate recipe names in numbered order
    pub options: Vec<String>,
}

impl ExpectedInput {
    pub fn allows(&self, event: &WorkflowEvent) -> bool {
        let kind = event.kind();
        self.decisions.iter().any(|d| d.decision == kind)
    }

    pub fn decision_names(&self) -> Vec<&'static str> {
        self.decisions.iter().map(|d| d.decision).collect()
    }

    /// JSON Schema (`oneOf` over the allowed decisions) for structured output
    pub fn to_json_schema(&self) -> Value {
        let variants: Vec<Value> = self
            .decisions
            .iter()
            .map(|decision| {
                let mut properties = serde_json::Map::new();
                properties.insert("decision".to_string(), json!({ "const": decision.decision }));
                let mut required = vec![Value::from("decision")];
                for field in &decision.fields {
                    properties.insert(field.name.to_string(), field.kind.json_schema());
                    required.push(Value::from(field.name));
                }
                json!({
                    "type": "object",
                    "description": decision.description,
                    "properties": properties,
                    "required": required,
                })
            })
            .collect();

        json!({ "oneOf": variants })
    }
}

fn decision(decision: &'static str, description: &'static str, fields: Vec<FieldSpec>) -> DecisionSpec {
    DecisionSpec {
        decision,
        description,
        fields,
    }
}

fn field(name: &'static str, kind: FieldKind, description: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        description,
    }
}

fn restart() -> DecisionSpec {
    decision("restart", "Abandon this session and start over", vec![])
}

fn cooking_helpers() -> [DecisionSpec; 2] {
    [
        decision(
            "adjust_servings",
            "Rescale the recipe for a different number of people",
            vec![field("servings", FieldKind::PositiveInteger, "New number of servings")],
        ),
        decision(
            "ask_question",
            "A question about the current step",
            vec![field("question", FieldKind::Text, "The question as asked")],
        ),
    ]
}

pub fn expected_input_schema(session: &WorkflowSession) -> ExpectedInput {
    let state = session.state();
    let mut options = Vec::new();

    let (prompt, mut decisions) = match state {
        CookingState::Starting => (
            "How many servings would you like to cook?".to_string(),
            vec![decision(
                "provide_servings",
                "Number of people to cook for",
                vec![field("servings", FieldKind::PositiveInteger, "Number of servings")],
            )],
        ),
        CookingState::IngredientCollection => (
            "Which ingredients do you have? Say 'done' when you are finished.".to_string(),
            vec![
                decision(
                    "add_ingredients",
                    "Ingredients the user has, with optional quantities",
                    vec![field(
                        "ingredients",
                        FieldKind::IngredientList,
                        "Each ingredient with its name and quantity if stated",
                    )],
                ),
                decision("finish_collecting", "The user has listed everything", vec![]),
            ],
        ),
        CookingState::RecipeProposal => ("Looking for recipes...".to_string(), vec![]),
        CookingState::RecipeConfirmation => {
            options = session.candidates().iter().map(|c| c.name.clone()).collect();
            (
                "Which recipe would you like to cook?".to_string(),
                vec![
                    decision(
                        "select_recipe",
                        "Choose one of the listed recipes",
                        vec![field("index", FieldKind::Index, "Zero-based position in the options")],
                    ),
                    decision("reject_all", "None of the recipes suit; propose others", vec![]),
                ],
            )
        }
        CookingState::CookingGuidance => {
            let mut decisions = vec![decision("advance", "Ready to begin the presented step", vec![])];
            decisions.extend(cooking_helpers());
            ("Say 'next' when you are ready for this step.".to_string(), decisions)
        }
        CookingState::StepExecution => {
            let mut decisions = vec![
                decision("complete_step", "The current step is finished", vec![]),
                decision("skip_step", "Skip the current step", vec![]),
                decision(
                    "start_timer",
                    "Start an additional timer for this step",
                    vec![field("seconds", FieldKind::Seconds, "Timer length in seconds")],
                ),
                decision("cancel_timer", "Stop the running timer for this step", vec![]),
            ];
            decisions.extend(cooking_helpers());
            ("Say 'next' when this step is done.".to_string(), decisions)
        }
        CookingState::Completed => (
            "Enjoy your meal! Would you like to cook something else?".to_string(),
            vec![],
        ),
    };

    decisions.push(restart());

    ExpectedInput {
        state,
        prompt,
        decisions,
        options,
    }
}
