//! Tool-using planner — a ReAct (Thought / Action / Observation) loop.
//!
//! Each run is an explicit state machine:
//!
//! ```text
//! Thinking → { Acting → Observing → Thinking }* → Done | Aborted
//! ```
//!
//! Thinking asks the model for its next move, Acting runs the chosen tool,
//! Observing records the step. The step budget is the only cancellation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use earlbot_core::error::PlanError;
use earlbot_core::session::ConversationMemory;
use earlbot_core::types::ConversationTurn;
use earlbot_providers::traits::{CompletionRequest, CompletionService};

use super::parser::{parse_agent_output, AgentAction};
use crate::tools::{Tool, ToolRegistry};

/// Default maximum Thought/Action/Observation cycles per run.
pub const DEFAULT_STEP_BUDGET: usize = 15;

/// Stops generation before the model writes its own observation.
pub const OBSERVATION_STOP: &str = "\nObservation:";

const SUFFIX: &str = "Begin! Remember to use a tool only if you need to.";

const FORMAT_INSTRUCTIONS: &str = "Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question";

// ─────────────────────────────────────────────
// Run records
// ─────────────────────────────────────────────

/// One completed Thought → Action → Observation cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentStep {
    pub thought: String,
    pub tool: String,
    pub input: String,
    pub observation: String,
}

/// Result of a run that reached `Done`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanOutcome {
    pub answer: String,
    pub steps: Vec<AgentStep>,
}

enum PlannerState {
    Thinking,
    Acting {
        thought: String,
        tool: String,
        input: String,
    },
    Observing(AgentStep),
    Done(String),
    Aborted(PlanError),
}

// ─────────────────────────────────────────────
// Planner
// ─────────────────────────────────────────────

pub struct ToolUsingPlanner {
    service: Arc<dyn CompletionService>,
    tools: Arc<ToolRegistry>,
    step_budget: usize,
}

impl ToolUsingPlanner {
    pub fn new(service: Arc<dyn CompletionService>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            service,
            tools,
            step_budget: DEFAULT_STEP_BUDGET,
        }
    }

    pub fn with_step_budget(mut self, budget: usize) -> Self {
        self.step_budget = budget;
        self
    }

    /// System instruction for planner requests: the persona, one line per
    /// tool, then the format instructions.
    pub fn preamble(&self, system_prompt: &str) -> String {
        let tool_lines: Vec<String> = self
            .tools
            .descriptions()
            .into_iter()
            .map(|(name, description)| format!("{name}: {description}"))
            .collect();
        let format = FORMAT_INSTRUCTIONS.replace("{tool_names}", &self.tools.list_names().join(", "));

        format!(
            "{}\n\n{}\n\n{}",
            system_prompt.trim_end(),
            tool_lines.join("\n"),
            format
        )
    }

    /// User text for one Thinking step: suffix, question, scratchpad.
    fn render_prompt(question: &str, steps: &[AgentStep]) -> String {
        let mut prompt = format!("{SUFFIX}\n\nQuestion: {question}\nThought:");
        for step in steps {
            prompt.push_str(&format!(
                " {}\nAction: {}\nAction Input: {}\nObservation: {}\nThought:",
                step.thought, step.tool, step.input, step.observation
            ));
        }
        prompt
    }

    /// Run the loop for `question`.
    ///
    /// On success one assistant turn (the final answer) is appended to
    /// `memory`. On any abort memory is left untouched.
    pub async fn run(
        &self,
        question: &str,
        memory: &mut ConversationMemory,
        system_prompt: &str,
    ) -> Result<PlanOutcome, PlanError> {
        let preamble = self.preamble(system_prompt);
        let mut steps: Vec<AgentStep> = Vec::new();
        let mut state = PlannerState::Thinking;

        loop {
            state = match state {
                PlannerState::Thinking => {
                    if steps.len() >= self.step_budget {
                        PlannerState::Aborted(PlanError::BudgetExceeded(self.step_budget))
                    } else {
                        self.think(&preamble, question, &steps).await
                    }
                }
                PlannerState::Acting {
                    thought,
                    tool,
                    input,
                } => match self.tools.lookup(&tool) {
                    None => PlannerState::Aborted(PlanError::UnknownTool(tool)),
                    Some(handle) => {
                        let observation = Self::act(handle.as_ref(), &input).await;
                        PlannerState::Observing(AgentStep {
                            thought,
                            tool,
                            input,
                            observation,
                        })
                    }
                },
                PlannerState::Observing(step) => {
                    debug!(
                        step = steps.len() + 1,
                        tool = %step.tool,
                        observation_chars = step.observation.len(),
                        "planner observed"
                    );
                    steps.push(step);
                    PlannerState::Thinking
                }
                PlannerState::Done(answer) => {
                    info!(steps = steps.len(), "planner finished");
                    memory.append(ConversationTurn::assistant(&answer));
                    return Ok(PlanOutcome { answer, steps });
                }
                PlannerState::Aborted(err) => {
                    warn!(steps = steps.len(), error = %err, "planner aborted");
                    return Err(err);
                }
            };
        }
    }

    async fn think(&self, preamble: &str, question: &str, steps: &[AgentStep]) -> PlannerState {
        let request = CompletionRequest::new(preamble, Self::render_prompt(question, steps))
            .with_stop(OBSERVATION_STOP);

        let output = match self.service.complete(&request).await {
            Ok(output) => output,
            Err(e) => return PlannerState::Aborted(e.into()),
        };

        match parse_agent_output(&output) {
            Ok(AgentAction::Finish(answer)) => PlannerState::Done(answer),
            Ok(AgentAction::UseTool {
                thought,
                tool,
                input,
            }) => {
                debug!(step = steps.len() + 1, tool = %tool, input = %input, "planner chose tool");
                PlannerState::Acting {
                    thought,
                    tool,
                    input,
                }
            }
            Err(e) => PlannerState::Aborted(e),
        }
    }

    /// Run a tool. Failures become the observation text.
    async fn act(tool: &dyn Tool, input: &str) -> String {
        match tool.invoke(input).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = tool.name(), error = %e, "tool failed during planning");
                format!("tool failed: {e}")
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
