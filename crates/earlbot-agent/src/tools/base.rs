//! Tool trait — the interface every planner tool implements, plus the HTTP
//! plumbing the built-in tools share.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use earlbot_core::error::ToolError;

/// User-Agent header sent by the HTTP tools.
pub(crate) const USER_AGENT: &str = concat!("earlbot/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout for the HTTP tools.
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

// ─────────────────────────────────────────────
// Tool trait
// ─────────────────────────────────────────────

/// A named capability the planner may invoke.
///
/// The planner renders `name()` and `description()` into its prompt
/// verbatim, so the description should tell the model what input to send.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the model uses in `Action:` lines (e.g. `"Wikipedia"`).
    fn name(&self) -> &str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &str;

    /// Run the tool on the model's `Action Input`.
    async fn invoke(&self, input: &str) -> Result<String, ToolError>;
}

// ─────────────────────────────────────────────
// HTTP helpers
// ─────────────────────────────────────────────

/// Build the shared HTTP client used by a tool.
pub(crate) fn http_client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(HTTP_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .unwrap_or_default()
}

/// Map a transport failure to a tool error naming the service.
pub(crate) fn request_failed(service: &str, e: reqwest::Error) -> ToolError {
    if e.is_timeout() {
        ToolError::Failed(format!("{service} request timed out"))
    } else {
        ToolError::Failed(format!("{service} request failed: {e}"))
    }
}

/// Reject empty input before any request is made.
pub(crate) fn require_input(input: &str) -> Result<&str, ToolError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(ToolError::InvalidInput("input is empty".into()))
    } else {
        Ok(trimmed)
    }
}
