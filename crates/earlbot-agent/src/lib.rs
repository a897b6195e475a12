//! Earlbot Agent — command routing, skills, tools and the bot loop.
//!
//! - **router**: maps message text to a command and reply visibility
//! - **prompt**: renders the persona system prompt
//! - **skills**: direct chat and the tool-using planner
//! - **tools**: Tool trait, registry, and the built-in lookup tools
//! - **bot**: consumes the bus and publishes replies

pub mod bot;
pub mod prompt;
pub mod router;
pub mod skills;
pub mod tools;

#[cfg(test)]
mod testing;

pub use bot::Bot;
pub use prompt::{PromptBuilder, SystemPrompt, DEFAULT_PERSONA_TEMPLATE};
pub use router::{route, Command, Routed};
pub use skills::{DirectChatSkill, PlanOutcome, ToolUsingPlanner};
pub use tools::{build_registry, Tool, ToolRegistry};
