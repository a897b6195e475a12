//! Direct chat — one completion per message, with conversation memory.

use std::sync::Arc;

use tracing::debug;

use earlbot_core::error::ServiceError;
use earlbot_core::session::{ConversationMemory, SnapshotBound};
use earlbot_core::types::ConversationTurn;
use earlbot_providers::traits::{CompletionRequest, CompletionService};

/// Sends the persona prompt, recent history and the user's text to the
/// completion service and records the exchange.
pub struct DirectChatSkill {
    service: Arc<dyn CompletionService>,
    window: usize,
}

impl DirectChatSkill {
    /// `window` bounds how many prior turns accompany each request.
    pub fn new(service: Arc<dyn CompletionService>, window: usize) -> Self {
        Self { service, window }
    }

    /// Answer `user_text`.
    ///
    /// Memory gains the user turn and then the assistant turn only when the
    /// completion succeeds with non-blank text.
    pub async fn respond(
        &self,
        user_text: &str,
        memory: &mut ConversationMemory,
        system_prompt: &str,
    ) -> Result<String, ServiceError> {
        let request = CompletionRequest::new(system_prompt, user_text)
            .with_history(memory.snapshot(SnapshotBound::Turns(self.window)));

        debug!(history = request.prior_turns.len(), "direct chat request");
        let reply = self.service.complete(&request).await?;
        if reply.trim().is_empty() {
            return Err(ServiceError::Malformed("empty completion".into()));
        }

        memory.append(ConversationTurn::user(user_text));
        memory.append(ConversationTurn::assistant(&reply));
        Ok(reply)
    }
}
