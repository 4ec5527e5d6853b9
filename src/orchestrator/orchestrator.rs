use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

use super::messages;
use super::traits::{CookingAdvisor, InterpretationFailure, Interpreter, RecipeSource};
use crate::config::SessionConfig;
use crate::recipe::{CollectedIngredient, RecipeProposal};
use crate::telemetry::generate_correlation_id;
use crate::timer::{Clock, TimerStatus};
use crate::workflow::{CookingState, Effect, ExpectedInput, Transition, WorkflowEvent, WorkflowMachine};

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// The decision was applied
    Progress,
    /// Nothing changed; the cook is asked again
    Reprompt { attempt: u32 },
    /// Repeated re-prompts; the full set of options is listed
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub state: CookingState,
    pub message: String,
    pub kind: ReplyKind,
}

impl Reply {
    pub fn is_reprompt(&self) -> bool {
        !matches!(self.kind, ReplyKind::Progress)
    }
}

/// Collaborators for one cooking conversation
#[derive(Clone)]
pub struct Collaborators {
    pub interpreter: Arc<dyn Interpreter>,
    pub recipes: Arc<dyn RecipeSource>,
    pub advisor: Arc<dyn CookingAdvisor>,
}

/// Drives one cooking session turn by turn
///
/// Each turn builds the expected input for the current state, hands the
/// utterance to the interpreter, applies the resulting decision and formats
/// the outcome. Guards live in the state machine; a rejected decision only
/// produces a re-prompt.
pub struct Orchestrator {
    machine: WorkflowMachine,
    collaborators: Collaborators,
    settings: SessionConfig,
    session_id: String,
    reprompts: u32,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("machine", &self.machine)
            .field("settings", &self.settings)
            .field("session_id", &self.session_id)
            .field("reprompts", &self.reprompts)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(collaborators: Collaborators, clock: Arc<dyn Clock>, settings: SessionConfig) -> Self {
        Self {
            machine: WorkflowMachine::new(clock),
            collaborators,
            settings,
            session_id: generate_correlation_id(),
            reprompts: 0,
        }
    }

    pub fn machine(&self) -> &WorkflowMachine {
        &self.machine
    }

    pub fn state(&self) -> CookingState {
        self.machine.state()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn span(&self) -> tracing::Span {
        info_span!(
            "session",
            session.id = %self.session_id,
            state = %self.machine.state()
        )
    }

    /// Greeting plus the first question
    pub fn opening(&mut self) -> Reply {
        let prompt = self.prompt();
        Reply {
            state: self.state(),
            message: format!(
                "{}\n\n{prompt} (press enter for {})",
                messages::welcome(),
                self.settings.default_servings
            ),
            kind: ReplyKind::Progress,
        }
    }

    /// Process one user utterance
    pub async fn handle_turn(&mut self, utterance: &str) -> Reply {
        let span = self.span();
        self.turn(utterance).instrument(span).await
    }

    /// Poll the active timer and, once it has run out, move the session on.
    /// Returns `None` while nothing changed.
    pub async fn tick(&mut self) -> Option<Reply> {
        let reading = self.machine.poll_active_timer()?;
        if reading.status != TimerStatus::Completed {
            return None;
        }

        let span = self.span();
        async {
            match self.machine.apply(WorkflowEvent::TimerTick) {
                Ok(transition) => Some(self.progress(transition).await),
                Err(e) => {
                    warn!(error = %e, "Timer tick rejected");
                    None
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Current timers formatted for display, empty when none are running
    pub fn timer_status(&mut self) -> Vec<String> {
        self.machine
            .running_timers()
            .iter()
            .map(messages::timer_line)
            .collect()
    }

    async fn turn(&mut self, utterance: &str) -> Reply {
        let expected = self.machine.expected_input();

        let event = match self.interpret(utterance, &expected).await {
            Ok(event) => event,
            Err(failure) => {
                info!(error = %failure, "Could not interpret utterance");
                return self.reprompt(&failure.to_string(), &expected);
            }
        };

        if !expected.allows(&event) {
            let failure = InterpretationFailure::UnexpectedDecision {
                decision: event.kind().to_string(),
                state: expected.state,
            };
            info!(error = %failure, "Interpreter returned a decision outside the expected input");
            return self.reprompt(&failure.to_string(), &expected);
        }

        match self.machine.apply(event) {
            Ok(transition) => self.progress(transition).await,
            Err(e) => self.reprompt(&e.to_string(), &expected),
        }
    }

    async fn interpret(
        &self,
        utterance: &str,
        expected: &ExpectedInput,
    ) -> Result<WorkflowEvent, InterpretationFailure> {
        if expected.state == CookingState::Starting && utterance.trim().is_empty() {
            return Ok(WorkflowEvent::ProvideServings {
                servings: i64::from(self.settings.default_servings),
            });
        }

        let event = self.collaborators.interpreter.interpret(utterance, expected).await?;
        debug!(decision = event.kind(), "Utterance interpreted");
        Ok(event)
    }

    fn reprompt(&mut self, reason: &str, expected: &ExpectedInput) -> Reply {
        self.reprompts += 1;
        let attempt = self.reprompts;

        if attempt > self.settings.max_reprompts {
            self.reprompts = 0;
            return Reply {
                state: self.state(),
                message: messages::help(reason, expected),
                kind: ReplyKind::Help,
            };
        }

        Reply {
            state: self.state(),
            message: messages::reprompt(reason, expected),
            kind: ReplyKind::Reprompt { attempt },
        }
    }

    /// Carry out the effects of an applied transition and of any transitions
    /// they trigger, then describe where the session ended up.
    async fn progress(&mut self, first: Transition) -> Reply {
        self.reprompts = 0;
        let mut notices = Vec::new();
        let mut pending = VecDeque::from([first]);

        while let Some(transition) = pending.pop_front() {
            for effect in &transition.effects {
                if let Some(notice) = messages::describe_effect(effect, self.machine.session()) {
                    notices.push(notice);
                }

                match effect {
                    Effect::RequestProposals { ingredients, servings } => {
                        let candidates = self.fetch_proposals(ingredients, *servings).await;
                        match self.machine.apply(WorkflowEvent::ProposalsReceived { candidates }) {
                            Ok(next) => pending.push_back(next),
                            Err(e) => warn!(error = %e, "Proposals could not be applied"),
                        }
                    }
                    Effect::AnswerQuestion { question, .. } => {
                        notices.push(self.answer_question(question).await);
                    }
                    _ => {}
                }
            }

            let entered_guidance = transition.to == CookingState::CookingGuidance
                && transition.from != CookingState::CookingGuidance;
            if self.settings.auto_advance && entered_guidance {
                match self.machine.apply(WorkflowEvent::Advance) {
                    Ok(next) => pending.push_back(next),
                    Err(e) => warn!(error = %e, "Could not begin the next step"),
                }
            }
        }

        notices.push(self.prompt());
        Reply {
            state: self.state(),
            message: notices.join("\n\n"),
            kind: ReplyKind::Progress,
        }
    }

    fn prompt(&mut self) -> String {
        let expected = self.machine.expected_input();
        let mut timers = self.machine.running_timers();
        if let Some(active) = self.machine.poll_active_timer() {
            if active.status == TimerStatus::Completed {
                timers.push(active);
            }
        }
        messages::state_prompt(self.machine.session(), &expected, &timers)
    }

    /// Ask the recipe source, retrying failures and empty answers up to the
    /// configured number of attempts. Gives up with no candidates.
    async fn fetch_proposals(&self, ingredients: &[CollectedIngredient], servings: u32) -> Vec<RecipeProposal> {
        let attempts = self.settings.max_proposal_attempts.max(1);

        for attempt in 1..=attempts {
            match self
                .collaborators
                .recipes
                .propose(ingredients, servings, self.settings.candidate_count)
                .await
            {
                Ok(candidates) if !candidates.is_empty() => {
                    info!(attempt = attempt, count = candidates.len(), "Recipe proposals received");
                    return candidates;
                }
                Ok(_) => warn!(attempt = attempt, "Recipe source returned no candidates"),
                Err(e) => warn!(attempt = attempt, error = %e, "Recipe source failed"),
            }
        }

        Vec::new()
    }

    async fn answer_question(&self, question: &str) -> String {
        let Some(step) = self.machine.session().current_step() else {
            return "There is no step to ask about right now.".to_string();
        };

        match self.collaborators.advisor.answer(step, question).await {
            Ok(answer) => messages::answer(question, &answer),
            Err(e) => {
                warn!(error = %e, "Cooking advisor failed");
                "Sorry, I couldn't get an answer to that right now.".to_string()
            }
        }
    }
}
