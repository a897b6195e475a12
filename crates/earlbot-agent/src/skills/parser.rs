//! Parser for ReAct-formatted model output.

use std::sync::OnceLock;

use regex::Regex;

use earlbot_core::error::PlanError;

/// Marker that ends a planner run.
pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";

/// What the model asked for in one Thinking step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentAction {
    /// The model produced its answer.
    Finish(String),
    /// The model wants a tool run on `input`.
    UseTool {
        thought: String,
        tool: String,
        input: String,
    },
}

fn action_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*:[ \t]*(.*?)\s*\n\s*Action\s*\d*\s*Input\s*\d*\s*:\s*(.*)")
            .expect("action pattern is valid")
    })
}

/// Parse one completion.
///
/// A `Final Answer:` anywhere wins; the answer is the text after the last
/// marker and must not be blank. Otherwise an `Action:` line followed by an `Action Input:` line
/// selects a tool. Anything else is a [`PlanError::Parse`] carrying the raw
/// output.
pub fn parse_agent_output(text: &str) -> Result<AgentAction, PlanError> {
    if let Some(idx) = text.rfind(FINAL_ANSWER_MARKER) {
        let answer = text[idx + FINAL_ANSWER_MARKER.len()..].trim();
        if answer.is_empty() {
            return Err(PlanError::Parse {
                output: text.to_string(),
            });
        }
        return Ok(AgentAction::Finish(answer.to_string()));
    }

    let caps = action_re().captures(text).ok_or_else(|| PlanError::Parse {
        output: text.to_string(),
    })?;

    let start = caps.get(0).map_or(0, |m| m.start());
    let thought = text[..start].trim();
    let thought = thought.strip_prefix("Thought:").unwrap_or(thought).trim();

    let tool = caps[1].trim();
    if tool.is_empty() {
        return Err(PlanError::Parse {
            output: text.to_string(),
        });
    }

    // The model sometimes keeps going and invents its own observation.
    let raw_input = caps[2]
        .split("Observation:")
        .next()
        .unwrap_or_default();
    let input = raw_input.trim().trim_matches('"').trim();

    Ok(AgentAction::UseTool {
        thought: thought.to_string(),
        tool: tool.to_string(),
        input: input.to_string(),
    })
}
