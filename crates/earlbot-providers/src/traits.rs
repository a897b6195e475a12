//! Completion service trait — the seam between the skills and the hosted LLM.
//!
//! `HttpProvider` in `http_provider.rs` implements it for any
//! OpenAI-compatible API; tests implement it with scripted responses.

use async_trait::async_trait;
use earlbot_core::error::ServiceError;
use earlbot_core::types::{ConversationTurn, Message};

/// Sampling settings passed to each completion call.
#[derive(Clone, Debug)]
pub struct LlmRequestConfig {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for LlmRequestConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.6,
        }
    }
}

/// One completion request: system instruction, prior turns, the new user
/// text, and optional stop sequences.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub prior_turns: Vec<ConversationTurn>,
    pub user_text: String,
    pub stop: Vec<String>,
}

impl CompletionRequest {
    pub fn new(system_prompt: impl Into<String>, user_text: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_text: user_text.into(),
            ..Default::default()
        }
    }

    /// Attach prior conversation turns, oldest first.
    pub fn with_history<'a>(mut self, turns: impl IntoIterator<Item = &'a ConversationTurn>) -> Self {
        self.prior_turns = turns.into_iter().cloned().collect();
        self
    }

    /// Add a stop sequence.
    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.stop.push(stop.into());
        self
    }

    /// Flatten into chat messages: system, history, then the user text.
    pub fn to_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.prior_turns.len() + 2);
        messages.push(Message::system(&self.system_prompt));
        messages.extend(self.prior_turns.iter().map(ConversationTurn::to_message));
        messages.push(Message::user(&self.user_text));
        messages
    }
}

/// A hosted text-completion service.
///
/// Failures are returned as [`ServiceError`]; implementations never retry.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send one completion request and return the generated text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ServiceError>;

    /// Model identifier, for logging and status output.
    fn model(&self) -> &str;
}
