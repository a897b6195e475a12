//! Response strategies selectable by command.
//!
//! - [`direct_chat`]: a single completion with conversation memory
//! - [`planner`]: the tool-using ReAct loop
//! - [`parser`]: turns ReAct-formatted output into actions

pub mod direct_chat;
pub mod parser;
pub mod planner;

pub use direct_chat::DirectChatSkill;
pub use parser::{parse_agent_output, AgentAction};
pub use planner::{AgentStep, PlanOutcome, ToolUsingPlanner, DEFAULT_STEP_BUDGET};
