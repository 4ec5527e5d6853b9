// Shared fixtures for integration tests: recorded recipe proposals and
// hand-written collaborator fakes
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use cooking_assistant::config::SessionConfig;
use cooking_assistant::orchestrator::{Collaborators, CommandInterpreter, CookingAdvisor, Orchestrator, RecipeSource};
use cooking_assistant::recipe::{CollectedIngredient, RecipeProposal, Step};
use cooking_assistant::timer::ManualClock;

pub const PROPOSALS_JSON: &str = include_str!("proposals.json");

/// Pancakes (base 4), frittata (base 2) and a stew whose step uses an
/// unlisted ingredient
pub fn recorded_proposals() -> Vec<RecipeProposal> {
    cooking_assistant::llm::decode_proposals(PROPOSALS_JSON).expect("fixture proposals decode")
}

pub fn pancakes() -> RecipeProposal {
    recorded_proposals().remove(0)
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap()))
}

/// Recipe source that answers from a script and records each request
#[derive(Default)]
pub struct FakeRecipeSource {
    answers: Mutex<VecDeque<Result<Vec<RecipeProposal>, String>>>,
    pub calls: Mutex<Vec<(Vec<String>, u32, usize)>>,
}

impl FakeRecipeSource {
    pub fn answering(answers: Vec<Result<Vec<RecipeProposal>, String>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RecipeSource for FakeRecipeSource {
    async fn propose(
        &self,
        ingredients: &[CollectedIngredient],
        servings: u32,
        count: usize,
    ) -> Result<Vec<RecipeProposal>> {
        self.calls.lock().unwrap().push((
            ingredients.iter().map(|i| i.name.clone()).collect(),
            servings,
            count,
        ));
        match self.answers.lock().unwrap().pop_front() {
            Some(Ok(candidates)) => Ok(candidates),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(Vec::new()),
        }
    }
}

/// Advisor with a fixed answer that remembers the questions it was asked
#[derive(Default)]
pub struct FakeAdvisor {
    pub questions: Mutex<Vec<(usize, String)>>,
}

#[async_trait]
impl CookingAdvisor for FakeAdvisor {
    async fn answer(&self, step: &Step, question: &str) -> Result<String> {
        self.questions.lock().unwrap().push((step.index, question.to_string()));
        Ok("Keep the heat at medium.".to_string())
    }
}

/// Offline orchestrator wired to fakes and a manual clock
pub fn offline_orchestrator(
    recipes: Arc<FakeRecipeSource>,
    advisor: Arc<FakeAdvisor>,
    clock: Arc<ManualClock>,
) -> Orchestrator {
    let collaborators = Collaborators {
        interpreter: Arc::new(CommandInterpreter::new()),
        recipes,
        advisor,
    };
    Orchestrator::new(collaborators, clock, SessionConfig::default())
}
