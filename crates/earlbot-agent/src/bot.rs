//! The bot — consumes inbound messages, routes them, runs skills, and
//! publishes replies.
//!
//! Messages are handled one at a time. Every failure becomes either an
//! apology reply or a log line; nothing escapes the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use earlbot_core::bus::{InboundMessage, MessageBus, OutboundMessage, Visibility};
use earlbot_core::config::Config;
use earlbot_core::error::{ConfigError, PlanError, ServiceError};
use earlbot_core::session::SessionStore;
use earlbot_providers::traits::CompletionService;

use crate::prompt::{PromptBuilder, SystemPrompt};
use crate::router::{route, Command};
use crate::skills::{DirectChatSkill, ToolUsingPlanner};
use crate::tools::ToolRegistry;

pub const GREETING: &str = "Hello! What can I do for you?";
pub const RESET_REPLY: &str = "Conversation memory cleared.";
pub const PLAN_FAILED_REPLY: &str = "Sorry, I could not complete that request.";

/// Reply used when the completion service fails.
pub fn service_failure_reply(e: &ServiceError) -> String {
    format!("Sorry, I couldn't reach the language model: {e}")
}

// ─────────────────────────────────────────────
// Bot
// ─────────────────────────────────────────────

pub struct Bot {
    bus: Arc<MessageBus>,
    sessions: Mutex<SessionStore>,
    chat_skill: DirectChatSkill,
    planner: ToolUsingPlanner,
    tools: Arc<ToolRegistry>,
    system_prompt: SystemPrompt,
    request_timeout: Duration,
    model: String,
}

impl Bot {
    /// Build the bot. The persona prompt is rendered here, so a bad
    /// template fails at startup rather than per message.
    pub fn new(
        bus: Arc<MessageBus>,
        service: Arc<dyn CompletionService>,
        tools: Arc<ToolRegistry>,
        config: &Config,
    ) -> Result<Self, ConfigError> {
        let system_prompt =
            PromptBuilder::from_config(&config.persona).build_for(&config.persona)?;
        let window = config.agent.memory_window;

        Ok(Self {
            bus,
            sessions: Mutex::new(SessionStore::new(window)),
            chat_skill: DirectChatSkill::new(Arc::clone(&service), window),
            planner: ToolUsingPlanner::new(Arc::clone(&service), Arc::clone(&tools))
                .with_step_budget(config.agent.step_budget),
            tools,
            system_prompt,
            request_timeout: Duration::from_secs(config.agent.request_timeout_secs),
            model: service.model().to_string(),
        })
    }

    /// Override the per-skill wall-clock limit.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Consume inbound messages until the bus closes.
    pub async fn run(&self) {
        info!(model = %self.model, tools = self.tools.len(), "bot started, waiting for messages");
        while let Some(msg) = self.bus.consume_inbound().await {
            if let Some(reply) = self.handle_message(&msg).await {
                if let Err(e) = self.bus.publish_outbound(reply).await {
                    error!(error = %e, "failed to publish outbound message");
                }
            }
        }
        info!("inbound channel closed, bot exiting");
    }

    /// Route one message and produce its reply, if any.
    pub async fn handle_message(&self, msg: &InboundMessage) -> Option<OutboundMessage> {
        info!(
            author = msg.author(),
            text = %msg.content,
            channel = %msg.channel,
            chat_id = %msg.chat_id,
            "message received"
        );

        let routed = route(&msg.content);
        let session_key = msg.session_key();

        let content = match routed.command {
            Command::Unrecognized => {
                debug!(session_key = %session_key, "not a command, ignoring");
                return None;
            }
            Command::StaticGreeting => GREETING.to_string(),
            Command::Help => self.help_text(),
            Command::Reset => {
                self.sessions.lock().await.clear(&session_key);
                RESET_REPLY.to_string()
            }
            Command::DirectChat => self.direct_chat(&session_key, &routed.text).await,
            Command::ToolPlan => self.plan(&session_key, &routed.text).await,
        };

        Some(OutboundMessage::reply_to(msg, content, routed.visibility))
    }

    /// Handle a line typed into the local REPL.
    pub async fn process_direct(&self, text: &str) -> Option<OutboundMessage> {
        let msg = InboundMessage::new("cli", "user", "direct", text);
        self.handle_message(&msg).await
    }

    async fn direct_chat(&self, session_key: &str, text: &str) -> String {
        let mut sessions = self.sessions.lock().await;
        let memory = sessions.memory_mut(session_key);

        let result = tokio::time::timeout(
            self.request_timeout,
            self.chat_skill.respond(text, memory, &self.system_prompt),
        )
        .await
        .unwrap_or(Err(ServiceError::Timeout(self.request_timeout)));

        match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session_key, error = %e, "direct chat failed");
                service_failure_reply(&e)
            }
        }
    }

    async fn plan(&self, session_key: &str, text: &str) -> String {
        let mut sessions = self.sessions.lock().await;
        let memory = sessions.memory_mut(session_key);

        let result = tokio::time::timeout(
            self.request_timeout,
            self.planner.run(text, memory, &self.system_prompt),
        )
        .await
        .unwrap_or(Err(PlanError::Service(ServiceError::Timeout(
            self.request_timeout,
        ))));

        match result {
            Ok(outcome) => {
                debug!(session_key, steps = outcome.steps.len(), "plan complete");
                outcome.answer
            }
            Err(PlanError::Service(e)) => {
                warn!(session_key, error = %e, "planner could not reach the model");
                service_failure_reply(&e)
            }
            Err(e) => {
                warn!(session_key, error = %e, "planner aborted");
                PLAN_FAILED_REPLY.to_string()
            }
        }
    }

    /// The command list, naming every registered tool in order.
    pub fn help_text(&self) -> String {
        format!(
            "$EarlGPT for Founder Chat\n$Plug for Founder With Plugins:\n[{}]\n$Reset to clear this conversation",
            self.tools.list_names().join(", ")
        )
    }

    /// Tool registry shared with the planner.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
