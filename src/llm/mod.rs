// LLM Module - OpenAI-compatible collaborators for interpretation,
// recipe proposals and cooking questions

pub mod agent;
pub mod client;
pub mod prompts;

pub use agent::{decode_decision, decode_proposals, LlmAgent};
pub use client::{ChatClient, ChatMessage, LlmError, ResponseFormat, Role};
