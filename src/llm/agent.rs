use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::client::{ChatClient, ChatMessage, LlmError, ResponseFormat};
use super::prompts;
use crate::config::LlmConfig;
use crate::orchestrator::{CookingAdvisor, InterpretationFailure, Interpreter, RecipeSource};
use crate::recipe::{CollectedIngredient, RecipeProposal, Step};
use crate::workflow::{ExpectedInput, WorkflowEvent};

/// Language model backed implementation of every collaborator
#[derive(Debug, Clone)]
pub struct LlmAgent {
    client: ChatClient,
}

impl LlmAgent {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: ChatClient::new(config)?,
        })
    }

    pub fn from_client(client: ChatClient) -> Self {
        Self { client }
    }
}

/// Cut the JSON object out of a reply that may be wrapped in prose or a
/// code fence
fn extract_json(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

pub fn decode_decision(raw: &str) -> Result<WorkflowEvent, InterpretationFailure> {
    let json = extract_json(raw)
        .ok_or_else(|| InterpretationFailure::InvalidDecision(format!("no JSON object in reply: {raw}")))?;
    let value: Value =
        serde_json::from_str(json).map_err(|e| InterpretationFailure::InvalidDecision(e.to_string()))?;

    if value.get("decision").and_then(Value::as_str) == Some(prompts::UNRECOGNIZED) {
        return Err(InterpretationFailure::Unrecognized {
            utterance: value
                .get("utterance")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        });
    }

    serde_json::from_value(value).map_err(|e| InterpretationFailure::InvalidDecision(e.to_string()))
}

/// Read `{"recipes": [...]}` (or a bare list). Entries that do not parse are
/// skipped; the rest are validated later by the state machine.
pub fn decode_proposals(raw: &str) -> Result<Vec<RecipeProposal>> {
    let trimmed = raw.trim();
    let value: Value = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        let json = extract_json(trimmed).context("no JSON object in recipe reply")?;
        serde_json::from_str(json)?
    };

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("recipes") {
            Some(Value::Array(entries)) => entries,
            _ => anyhow::bail!("recipe reply has no 'recipes' list"),
        },
        _ => anyhow::bail!("recipe reply is neither an object nor a list"),
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<RecipeProposal>(entry) {
            Ok(proposal) => Some(proposal),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable recipe proposal");
                None
            }
        })
        .collect())
}

#[async_trait]
impl Interpreter for LlmAgent {
    async fn interpret(
        &self,
        utterance: &str,
        expected: &ExpectedInput,
    ) -> Result<WorkflowEvent, InterpretationFailure> {
        let messages = [
            ChatMessage::system(prompts::interpretation_system(expected)),
            ChatMessage::user(utterance),
        ];

        let raw = self
            .client
            .complete(&messages, ResponseFormat::Json)
            .await
            .map_err(|e| InterpretationFailure::Unavailable(e.to_string()))?;
        debug!(reply = %raw, "Interpreter reply");

        decode_decision(&raw).map_err(|failure| match failure {
            InterpretationFailure::Unrecognized { .. } => InterpretationFailure::Unrecognized {
                utterance: utterance.to_string(),
            },
            other => other,
        })
    }
}

#[async_trait]
impl RecipeSource for LlmAgent {
    async fn propose(
        &self,
        ingredients: &[CollectedIngredient],
        servings: u32,
        count: usize,
    ) -> Result<Vec<RecipeProposal>> {
        let messages = [
            ChatMessage::system(prompts::proposal_system(count)),
            ChatMessage::user(prompts::proposal_user(ingredients, servings)),
        ];

        let raw = self.client.complete(&messages, ResponseFormat::Json).await?;
        let proposals = decode_proposals(&raw)?;
        info!(count = proposals.len(), model = %self.client.model(), "Recipe proposals decoded");
        Ok(proposals)
    }
}

#[async_trait]
impl CookingAdvisor for LlmAgent {
    async fn answer(&self, step: &Step, question: &str) -> Result<String> {
        let messages = [
            ChatMessage::system(prompts::advisor_system(step)),
            ChatMessage::user(question),
        ];
        Ok(self.client.complete(&messages, ResponseFormat::Text).await?)
    }
}
