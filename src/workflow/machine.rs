// Cooking Workflow State Machine
//
// Every transition is computed on a copy of the session and only swapped in
// when it succeeded as a whole. A rejected event leaves the session untouched.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::error::WorkflowError;
use super::event::WorkflowEvent;
use super::schema::{expected_input_schema, ExpectedInput};
use super::session::WorkflowSession;
use super::state::CookingState;
use crate::recipe::{CollectedIngredient, Recipe, StepStatus};
use crate::timer::{Clock, TimerReading, TimerStatus};

/// Servings used when a recipe is requested before any count was given
pub const DEFAULT_SERVINGS: u32 = 2;

/// Follow-up work or notices produced by a transition for the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the recipe source for candidates
    RequestProposals {
        ingredients: Vec<CollectedIngredient>,
        servings: u32,
    },
    IngredientsCollected { total: usize },
    CandidatesReady { count: usize, rejected: usize },
    /// Nothing usable came back; the user should add or change ingredients
    NoViableProposals { rejected: usize },
    RecipeConfirmed { name: String },
    /// The selected candidate failed validation; new proposals are requested
    RecipeRejected { reason: String },
    TimerStarted(TimerReading),
    TimerRunning(TimerReading),
    TimerCompleted(TimerReading),
    TimerCancelled(TimerReading),
    StepFinished {
        index: usize,
        status: StepStatus,
        interrupted_timers: usize,
    },
    RecipeCompleted { name: String },
    ServingsAdjusted { servings: u32 },
    AnswerQuestion { step_index: usize, question: String },
    SessionReset,
}

/// Result of a successful `apply`
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: CookingState,
    pub to: CookingState,
    pub event: &'static str,
    pub effects: Vec<Effect>,
}

fn positive_servings(value: i64) -> Option<u32> {
    u32::try_from(value).ok().filter(|s| *s > 0)
}

impl WorkflowSession {
    /// Apply one event, returning the successor session and what happened.
    /// `self` is never modified.
    pub fn apply(
        &self,
        event: &WorkflowEvent,
        now: DateTime<Utc>,
    ) -> Result<(WorkflowSession, Transition), WorkflowError> {
        let mut next = self.clone();
        let effects = next.handle(event, now)?;
        let transition = Transition {
            from: self.state,
            to: next.state,
            event: event.kind(),
            effects,
        };
        Ok((next, transition))
    }

    fn handle(&mut self, event: &WorkflowEvent, now: DateTime<Utc>) -> Result<Vec<Effect>, WorkflowError> {
        use CookingState::*;

        let state = self.state;
        let kind = event.kind();

        match (state, event) {
            (_, WorkflowEvent::Restart) => {
                *self = WorkflowSession::new();
                Ok(vec![Effect::SessionReset])
            }

            (Starting, WorkflowEvent::ProvideServings { servings }) => {
                let servings = positive_servings(*servings).ok_or_else(|| {
                    WorkflowError::illegal(
                        state,
                        kind,
                        format!("servings must be a positive whole number, got {servings}"),
                    )
                })?;
                self.servings = Some(servings);
                self.state = IngredientCollection;
                Ok(Vec::new())
            }

            (IngredientCollection, WorkflowEvent::AddIngredients { ingredients }) => {
                if ingredients.iter().all(|i| i.name.trim().is_empty()) {
                    return Err(WorkflowError::illegal(state, kind, "no ingredients given"));
                }
                self.merge_ingredients(ingredients);
                Ok(vec![Effect::IngredientsCollected {
                    total: self.collected.len(),
                }])
            }

            (IngredientCollection, WorkflowEvent::FinishCollecting) => {
                if self.collected.is_empty() {
                    return Err(WorkflowError::illegal(state, kind, "no ingredients collected yet"));
                }
                self.state = RecipeProposal;
                Ok(vec![self.proposal_request()])
            }

            (RecipeProposal, WorkflowEvent::ProposalsReceived { candidates }) => {
                let servings = self.requested_servings();
                let mut valid = Vec::with_capacity(candidates.len());
                for candidate in candidates {
                    match Recipe::from_proposal(candidate, servings) {
                        Ok(_) => valid.push(candidate.clone()),
                        Err(e) => warn!(candidate = %candidate.name, error = %e, "Dropping malformed proposal"),
                    }
                }
                let rejected = candidates.len() - valid.len();

                if valid.is_empty() {
                    self.candidates.clear();
                    self.state = IngredientCollection;
                    Ok(vec![Effect::NoViableProposals { rejected }])
                } else {
                    let count = valid.len();
                    self.candidates = valid;
                    self.state = RecipeConfirmation;
                    Ok(vec![Effect::CandidatesReady { count, rejected }])
                }
            }

            (RecipeConfirmation, WorkflowEvent::SelectRecipe { index }) => {
                let proposal = self.candidates.get(*index).ok_or(
                    crate::recipe::RecipeError::IndexOutOfRange {
                        index: *index,
                        len: self.candidates.len(),
                    },
                )?;
                let built = Recipe::from_proposal(proposal, self.requested_servings());
                self.candidates.clear();

                match built {
                    Ok(recipe) => {
                        let name = recipe.name().to_string();
                        self.recipe = Some(recipe);
                        self.current_step = 0;
                        self.state = CookingGuidance;
                        Ok(vec![Effect::RecipeConfirmed { name }])
                    }
                    Err(e) => {
                        warn!(error = %e, "Selected recipe is malformed, requesting new proposals");
                        self.state = RecipeProposal;
                        Ok(vec![
                            Effect::RecipeRejected {
                                reason: e.to_string(),
                            },
                            self.proposal_request(),
                        ])
                    }
                }
            }

            (RecipeConfirmation, WorkflowEvent::RejectAll) => {
                self.candidates.clear();
                self.state = RecipeProposal;
                Ok(vec![self.proposal_request()])
            }

            (CookingGuidance, WorkflowEvent::Advance) => {
                let index = self.current_step;
                let duration = self.active_recipe(kind)?.step_at(index)?.duration_secs;

                let mut effects = Vec::new();
                if let Some(seconds) = duration {
                    let id = self.timers.start(index, seconds, now)?;
                    effects.push(Effect::TimerStarted(self.timers.poll(id, now)?));
                }
                self.state = StepExecution;
                Ok(effects)
            }

            (StepExecution, WorkflowEvent::CompleteStep) => self.finish_step(StepStatus::Done, kind, now),

            (StepExecution, WorkflowEvent::SkipStep) => self.finish_step(StepStatus::Skipped, kind, now),

            // Only a completed timer finishes the step here. A step without a
            // timer, or whose timer was cancelled, is finished with CompleteStep
            // or SkipStep; ticking it is illegal.
            (StepExecution, WorkflowEvent::TimerTick) => {
                let id = self
                    .timers
                    .latest_for_step(self.current_step)
                    .ok_or_else(|| WorkflowError::illegal(state, kind, "current step has no timer"))?;
                let reading = self.timers.poll(id, now)?;

                match reading.status {
                    TimerStatus::Running => Ok(vec![Effect::TimerRunning(reading)]),
                    TimerStatus::Completed => {
                        let mut effects = vec![Effect::TimerCompleted(reading)];
                        effects.extend(self.finish_step(StepStatus::Done, kind, now)?);
                        Ok(effects)
                    }
                    TimerStatus::Cancelled => Err(WorkflowError::illegal(
                        state,
                        kind,
                        "the timer for this step was cancelled",
                    )),
                }
            }

            (StepExecution, WorkflowEvent::StartTimer { seconds }) => {
                let id = self.timers.start(self.current_step, *seconds, now)?;
                Ok(vec![Effect::TimerStarted(self.timers.poll(id, now)?)])
            }

            (StepExecution, WorkflowEvent::CancelTimer) => {
                let id = self
                    .timers
                    .running_for_step(self.current_step, now)
                    .ok_or_else(|| WorkflowError::illegal(state, kind, "no running timer for this step"))?;
                Ok(vec![Effect::TimerCancelled(self.timers.cancel(id, now)?)])
            }

            (CookingGuidance | StepExecution, WorkflowEvent::AdjustServings { servings }) => {
                let servings = positive_servings(*servings).ok_or_else(|| {
                    WorkflowError::illegal(
                        state,
                        kind,
                        format!("servings must be a positive whole number, got {servings}"),
                    )
                })?;
                self.active_recipe_mut(kind)?.set_requested_servings(servings)?;
                Ok(vec![Effect::ServingsAdjusted { servings }])
            }

            (CookingGuidance | StepExecution, WorkflowEvent::AskQuestion { question }) => {
                let question = question.trim();
                if question.is_empty() {
                    return Err(WorkflowError::illegal(state, kind, "empty question"));
                }
                Ok(vec![Effect::AnswerQuestion {
                    step_index: self.current_step,
                    question: question.to_string(),
                }])
            }

            (state, event) => Err(WorkflowError::illegal(
                state,
                event.kind(),
                "not accepted in this state",
            )),
        }
    }

    fn requested_servings(&self) -> u32 {
        self.servings.unwrap_or(DEFAULT_SERVINGS)
    }

    fn proposal_request(&self) -> Effect {
        Effect::RequestProposals {
            ingredients: self.collected.clone(),
            servings: self.requested_servings(),
        }
    }

    fn active_recipe(&self, kind: &'static str) -> Result<&Recipe, WorkflowError> {
        self.recipe
            .as_ref()
            .ok_or_else(|| WorkflowError::illegal(self.state, kind, "no confirmed recipe"))
    }

    fn active_recipe_mut(&mut self, kind: &'static str) -> Result<&mut Recipe, WorkflowError> {
        let state = self.state;
        self.recipe
            .as_mut()
            .ok_or_else(|| WorkflowError::illegal(state, kind, "no confirmed recipe"))
    }

    /// Dedupe by name, case-insensitively. A re-stated quantity replaces the
    /// earlier one; an ingredient repeated without quantity keeps its old one.
    fn merge_ingredients(&mut self, incoming: &[CollectedIngredient]) {
        for item in incoming {
            let name = item.name.trim();
            if name.is_empty() {
                continue;
            }
            let quantity = item
                .quantity
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string);

            let key = name.to_lowercase();
            match self.collected.iter_mut().find(|c| c.name.to_lowercase() == key) {
                Some(existing) => {
                    if quantity.is_some() {
                        existing.quantity = quantity;
                    }
                }
                None => self.collected.push(CollectedIngredient {
                    name: name.to_string(),
                    quantity,
                }),
            }
        }
    }

    fn finish_step(
        &mut self,
        status: StepStatus,
        kind: &'static str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Effect>, WorkflowError> {
        let index = self.current_step;
        let interrupted = self.timers.clear_step(index, now);

        let recipe = self.active_recipe_mut(kind)?;
        recipe.mark_step(index, status)?;
        let is_last = index + 1 >= recipe.len();
        let name = recipe.name().to_string();

        let mut effects = vec![Effect::StepFinished {
            index,
            status,
            interrupted_timers: interrupted.len(),
        }];

        if is_last {
            self.state = CookingState::Completed;
            effects.push(Effect::RecipeCompleted { name });
        } else {
            self.current_step = index + 1;
            self.state = CookingState::CookingGuidance;
        }
        Ok(effects)
    }
}

/// Audit trail entry for an applied transition
#[derive(Debug, Clone, Serialize)]
pub struct TransitionRecord {
    pub from: CookingState,
    pub to: CookingState,
    pub event: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Owns one session and the clock it reads, and keeps the transition history
pub struct WorkflowMachine {
    session: WorkflowSession,
    clock: Arc<dyn Clock>,
    history: Vec<TransitionRecord>,
}

impl std::fmt::Debug for WorkflowMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowMachine")
            .field("session", &self.session)
            .field("clock_now", &self.clock.now())
            .field("history", &self.history)
            .finish()
    }
}

impl WorkflowMachine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            session: WorkflowSession::new(),
            clock,
            history: Vec::new(),
        }
    }

    pub fn with_session(mut self, session: WorkflowSession) -> Self {
        self.session = session;
        self
    }

    /// The only way the session changes. On error nothing is modified.
    pub fn apply(&mut self, event: WorkflowEvent) -> Result<Transition, WorkflowError> {
        let now = self.clock.now();

        let (next, transition) = match self.session.apply(&event, now) {
            Ok(applied) => applied,
            Err(e) => {
                warn!(
                    state = %self.session.state(),
                    event = event.kind(),
                    error = %e,
                    "Workflow event rejected"
                );
                return Err(e);
            }
        };

        debug_assert!(next.check_invariants().is_ok(), "{:?}", next.check_invariants());
        self.session = next;

        info!(
            from_state = %transition.from,
            to_state = %transition.to,
            event = transition.event,
            effects = transition.effects.len(),
            "Cooking workflow state transition"
        );
        self.history.push(TransitionRecord {
            from: transition.from,
            to: transition.to,
            event: transition.event,
            timestamp: now,
        });

        Ok(transition)
    }

    pub fn poll_active_timer(&mut self) -> Option<TimerReading> {
        let now = self.clock.now();
        self.session.poll_active_timer(now)
    }

    pub fn running_timers(&mut self) -> Vec<TimerReading> {
        let now = self.clock.now();
        self.session.running_timers(now)
    }

    pub fn expected_input(&self) -> ExpectedInput {
        expected_input_schema(&self.session)
    }

    pub fn session(&self) -> &WorkflowSession {
        &self.session
    }

    pub fn state(&self) -> CookingState {
        self.session.state()
    }

    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
