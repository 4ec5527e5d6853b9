//! Offline keyword interpreter
//!
//! Understands the short commands of the terminal assistant ("next",
//! "timer 10 min", "ask ...", numbers and comma lists) without calling a
//! language model. Which reading applies is decided by the expected input.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

use super::traits::{InterpretationFailure, Interpreter};
use crate::recipe::{parse_duration, CollectedIngredient};
use crate::workflow::{CookingState, ExpectedInput, WorkflowEvent};

static LEADING_QUANTITY: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<qty>\d+(?:[./]\d+)?\s*(?:kg|g|mg|ml|l|cups?|tbsp|tsp|oz|lbs?|cloves?|cans?|slices?|pinch(?:es)?)?)\s+(?:of\s+)?(?P<name>.+)$",
    )
    .ok()
});

static SERVINGS_REQUEST: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:servings?|serves?|for)\s+(\d+)(?:\s+(?:people|persons|servings))?$").ok()
});

const RESTART_WORDS: &[&str] = &["restart", "abort", "start over", "reset"];
const FINISH_WORDS: &[&str] = &["done", "finished", "that's all", "thats all", "no more", "that is all"];
const NEXT_WORDS: &[&str] = &["next", "n", "go", "ready", "start", "ok", "okay"];
const DONE_WORDS: &[&str] = &["next", "n", "done", "finished", "complete"];
const REJECT_WORDS: &[&str] = &["none", "no", "other", "others", "something else", "reject"];
const AGAIN_WORDS: &[&str] = &["yes", "y", "again", "another"];

#[derive(Debug, Clone, Copy, Default)]
pub struct CommandInterpreter;

impl CommandInterpreter {
    pub fn new() -> Self {
        Self
    }

    fn unrecognized(utterance: &str) -> InterpretationFailure {
        InterpretationFailure::Unrecognized {
            utterance: utterance.to_string(),
        }
    }

    fn read(&self, utterance: &str, expected: &ExpectedInput) -> Result<WorkflowEvent, InterpretationFailure> {
        let text = utterance.trim();
        let lowered = text.to_lowercase();

        if RESTART_WORDS.contains(&lowered.as_str()) {
            return Ok(WorkflowEvent::Restart);
        }

        match expected.state {
            CookingState::Starting => parse_count(&lowered)
                .map(|servings| WorkflowEvent::ProvideServings { servings })
                .ok_or_else(|| Self::unrecognized(text)),

            CookingState::IngredientCollection => {
                if FINISH_WORDS.contains(&lowered.as_str()) {
                    return Ok(WorkflowEvent::FinishCollecting);
                }
                let ingredients = parse_ingredient_list(text);
                if ingredients.is_empty() {
                    Err(Self::unrecognized(text))
                } else {
                    Ok(WorkflowEvent::AddIngredients { ingredients })
                }
            }

            CookingState::RecipeConfirmation => {
                if REJECT_WORDS.contains(&lowered.as_str()) {
                    return Ok(WorkflowEvent::RejectAll);
                }
                if let Some(choice) = parse_count(&lowered) {
                    // Candidates are shown numbered from one
                    return choice
                        .checked_sub(1)
                        .and_then(|index| usize::try_from(index).ok())
                        .map(|index| WorkflowEvent::SelectRecipe { index })
                        .ok_or_else(|| Self::unrecognized(text));
                }
                expected
                    .options
                    .iter()
                    .position(|name| name.to_lowercase().contains(&lowered) && !lowered.is_empty())
                    .map(|index| WorkflowEvent::SelectRecipe { index })
                    .ok_or_else(|| Self::unrecognized(text))
            }

            CookingState::CookingGuidance => {
                if lowered.is_empty() || NEXT_WORDS.contains(&lowered.as_str()) {
                    return Ok(WorkflowEvent::Advance);
                }
                cooking_helper(text, &lowered).ok_or_else(|| Self::unrecognized(text))
            }

            CookingState::StepExecution => {
                if DONE_WORDS.contains(&lowered.as_str()) {
                    return Ok(WorkflowEvent::CompleteStep);
                }
                if lowered == "skip" {
                    return Ok(WorkflowEvent::SkipStep);
                }
                if matches!(lowered.as_str(), "cancel" | "cancel timer" | "stop timer") {
                    return Ok(WorkflowEvent::CancelTimer);
                }
                if let Some(duration) = lowered.strip_prefix("timer") {
                    return parse_duration(duration)
                        .map(|seconds| WorkflowEvent::StartTimer { seconds })
                        .ok_or_else(|| {
                            InterpretationFailure::InvalidDecision(format!(
                                "'{}' is not a duration. Try '10 min' or '30 sec'",
                                duration.trim()
                            ))
                        });
                }
                cooking_helper(text, &lowered).ok_or_else(|| Self::unrecognized(text))
            }

            CookingState::Completed if AGAIN_WORDS.contains(&lowered.as_str()) => Ok(WorkflowEvent::Restart),

            CookingState::RecipeProposal | CookingState::Completed => Err(Self::unrecognized(text)),
        }
    }
}

#[async_trait]
impl Interpreter for CommandInterpreter {
    async fn interpret(
        &self,
        utterance: &str,
        expected: &ExpectedInput,
    ) -> Result<WorkflowEvent, InterpretationFailure> {
        self.read(utterance, expected)
    }
}

fn parse_count(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok()
}

/// Questions and servings changes, accepted while cooking
fn cooking_helper(text: &str, lowered: &str) -> Option<WorkflowEvent> {
    // Strip from the original text so the question keeps its casing
    if let Some(question) = text
        .get(..4)
        .filter(|prefix| prefix.eq_ignore_ascii_case("ask "))
        .and_then(|_| text.get(4..))
    {
        return Some(WorkflowEvent::AskQuestion {
            question: question.trim().to_string(),
        });
    }
    if text.ends_with('?') {
        return Some(WorkflowEvent::AskQuestion {
            question: text.to_string(),
        });
    }

    let caps = SERVINGS_REQUEST.as_ref()?.captures(lowered)?;
    let servings = caps.get(1)?.as_str().parse().ok()?;
    Some(WorkflowEvent::AdjustServings { servings })
}

/// Split "2 eggs, 200g flour and milk" into named ingredients
pub fn parse_ingredient_list(text: &str) -> Vec<CollectedIngredient> {
    text.split([',', ';', '\n'])
        .flat_map(|part| part.split(" and "))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let captures = LEADING_QUANTITY.as_ref().and_then(|re| re.captures(part));
            match captures.and_then(|c| Some((c.name("qty")?, c.name("name")?))) {
                Some((qty, name)) => CollectedIngredient::with_quantity(name.as_str().trim(), qty.as_str().trim()),
                None => CollectedIngredient::new(part),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::RecipeProposal;
    use crate::workflow::{expected_input_schema, WorkflowSession};

    fn expected(state: CookingState) -> ExpectedInput {
        let mut session = WorkflowSession::new();
        session.state = state;
        let mut expected = expected_input_schema(&session);
        expected.options = vec!["Tomato Pasta".to_string(), "Fried Rice".to_string()];
        expected
    }

    fn read(text: &str, state: CookingState) -> Result<WorkflowEvent, InterpretationFailure> {
        tokio_test::block_on(CommandInterpreter::new().interpret(text, &expected(state)))
    }

    #[test]
    fn test_servings_are_numbers() {
        assert_eq!(
            read(" 4 ", CookingState::Starting),
            Ok(WorkflowEvent::ProvideServings { servings: 4 })
        );
        // Range checks belong to the state machine
        assert_eq!(
            read("0", CookingState::Starting),
            Ok(WorkflowEvent::ProvideServings { servings: 0 })
        );
        assert!(read("four", CookingState::Starting).is_err());
    }

    #[test]
    fn test_ingredient_lists_with_quantities() {
        let event = read("2 eggs, 200g flour and a pinch of salt; milk", CookingState::IngredientCollection).unwrap();
        let WorkflowEvent::AddIngredients { ingredients } = event else {
            panic!("expected ingredients");
        };
        assert_eq!(
            ingredients,
            vec![
                CollectedIngredient::with_quantity("eggs", "2"),
                CollectedIngredient::with_quantity("flour", "200g"),
                CollectedIngredient::new("a pinch of salt"),
                CollectedIngredient::new("milk"),
            ]
        );
        assert_eq!(
            read("Done", CookingState::IngredientCollection),
            Ok(WorkflowEvent::FinishCollecting)
        );
    }

    #[test]
    fn test_recipe_choice_is_one_based() {
        assert_eq!(
            read("2", CookingState::RecipeConfirmation),
            Ok(WorkflowEvent::SelectRecipe { index: 1 })
        );
        assert_eq!(
            read("fried rice", CookingState::RecipeConfirmation),
            Ok(WorkflowEvent::SelectRecipe { index: 1 })
        );
        assert_eq!(read("none", CookingState::RecipeConfirmation), Ok(WorkflowEvent::RejectAll));
        assert!(read("0", CookingState::RecipeConfirmation).is_err());
    }

    #[test]
    fn test_step_commands() {
        assert_eq!(read("next", CookingState::StepExecution), Ok(WorkflowEvent::CompleteStep));
        assert_eq!(read("skip", CookingState::StepExecution), Ok(WorkflowEvent::SkipStep));
        assert_eq!(
            read("timer 10 min", CookingState::StepExecution),
            Ok(WorkflowEvent::StartTimer { seconds: 600 })
        );
        assert!(matches!(
            read("timer soon", CookingState::StepExecution),
            Err(InterpretationFailure::InvalidDecision(_))
        ));
        assert_eq!(read("cancel timer", CookingState::StepExecution), Ok(WorkflowEvent::CancelTimer));
        assert_eq!(read("next", CookingState::CookingGuidance), Ok(WorkflowEvent::Advance));
    }

    #[test]
    fn test_questions_and_servings_while_cooking() {
        assert_eq!(
            read("ask How thick should the Sauce be", CookingState::StepExecution),
            Ok(WorkflowEvent::AskQuestion {
                question: "How thick should the Sauce be".to_string()
            })
        );
        assert_eq!(
            read("Can I use butter instead?", CookingState::CookingGuidance),
            Ok(WorkflowEvent::AskQuestion {
                question: "Can I use butter instead?".to_string()
            })
        );
        assert_eq!(
            read("for 6 people", CookingState::StepExecution),
            Ok(WorkflowEvent::AdjustServings { servings: 6 })
        );
    }

    #[test]
    fn test_questions_with_non_ascii_text() {
        assert_eq!(
            read("ask İİİİİ", CookingState::StepExecution),
            Ok(WorkflowEvent::AskQuestion {
                question: "İİİİİ".to_string()
            })
        );
        assert_eq!(
            read("Ask Ist das Öl heiß genug", CookingState::CookingGuidance),
            Ok(WorkflowEvent::AskQuestion {
                question: "Ist das Öl heiß genug".to_string()
            })
        );
        assert!(read("İİİ", CookingState::StepExecution).is_err());
    }

    #[test]
    fn test_patterns_compile() {
        assert!(LEADING_QUANTITY.is_some());
        assert!(SERVINGS_REQUEST.is_some());
    }

    #[test]
    fn test_restart_words_work_everywhere() {
        for state in CookingState::ALL {
            assert_eq!(read("start over", state), Ok(WorkflowEvent::Restart), "{state}");
        }
        assert_eq!(read("yes", CookingState::Completed), Ok(WorkflowEvent::Restart));
        assert!(read("maybe", CookingState::Completed).is_err());
    }

    #[test]
    fn test_options_come_from_candidates() {
        let mut session = WorkflowSession::new();
        session.state = CookingState::RecipeConfirmation;
        session.candidates = vec![RecipeProposal {
            name: "Shakshuka".to_string(),
            description: None,
            difficulty: None,
            base_servings: 2,
            ingredients: vec![],
            steps: vec![],
        }];
        let expected = expected_input_schema(&session);
        let event = tokio_test::block_on(CommandInterpreter::new().interpret("shak", &expected));
        assert_eq!(event, Ok(WorkflowEvent::SelectRecipe { index: 0 }));
    }
}
