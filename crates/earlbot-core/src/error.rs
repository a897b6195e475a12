//! Error taxonomy for Earlbot.
//!
//! Each boundary has its own error type. None of them is allowed to take the
//! event loop down: the bot converts every per-message failure into either a
//! user-visible reply or a log line.

use std::time::Duration;

use thiserror::Error;

// ─────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────

/// Missing or invalid startup configuration. Fatal: the process does not start.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required configuration value: {0}")]
    Missing(&'static str),

    #[error("invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("persona template placeholder {{{0}}} has no value")]
    MissingPlaceholder(String),

    #[error("persona template uses unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),
}

// ─────────────────────────────────────────────
// Chat transport
// ─────────────────────────────────────────────

/// Chat send/receive failure. Logged; the message is dropped.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    #[error("chat platform returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("message rejected: {0}")]
    Rejected(String),
}

// ─────────────────────────────────────────────
// Completion service
// ─────────────────────────────────────────────

/// Completion service unavailable or answered with something unusable.
///
/// Surfaced to the user as a failure reply. Never retried by the core.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("rate limited by the completion service")]
    RateLimited,

    #[error("completion service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed completion response: {0}")]
    Malformed(String),
}

// ─────────────────────────────────────────────
// Tools
// ─────────────────────────────────────────────

/// A single tool invocation failed. The planner turns this into an observation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ToolError {
    #[error("{0}")]
    Failed(String),

    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no tool named '{0}'")]
    Unknown(String),
}

/// Tool registration failure (startup only).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("a tool named '{0}' is already registered")]
    DuplicateTool(String),
}

// ─────────────────────────────────────────────
// Planner
// ─────────────────────────────────────────────

/// Reasons a planner run ends in the `Aborted` state.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlanError {
    #[error("could not parse model output: {output}")]
    Parse { output: String },

    #[error("model chose unknown tool '{0}'")]
    UnknownTool(String),

    #[error("step budget of {0} exhausted without a final answer")]
    BudgetExceeded(usize),

    #[error(transparent)]
    Service(#[from] ServiceError),
}
