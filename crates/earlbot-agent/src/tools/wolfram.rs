//! `Wolfram Alpha` tool — the Short Answers API.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use earlbot_core::error::ToolError;

use super::base::{http_client, request_failed, require_input, Tool};

const DEFAULT_API_URL: &str = "https://api.wolframalpha.com/v1/result";

/// Computational answers from Wolfram|Alpha.
pub struct WolframAlphaTool {
    app_id: String,
    client: Client,
    api_url: String,
}

impl WolframAlphaTool {
    /// Create the tool. An empty app id is reported at invocation time.
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            client: http_client(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

#[async_trait]
impl Tool for WolframAlphaTool {
    fn name(&self) -> &str {
        "Wolfram Alpha"
    }

    fn description(&self) -> &str {
        "A wrapper around Wolfram Alpha. Useful for when you need to answer questions about \
         Math, Science, Technology, Culture, Society and Everyday Life. \
         Input should be a search query."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        if self.app_id.trim().is_empty() {
            return Err(ToolError::NotConfigured("Wolfram Alpha app id".into()));
        }
        let query = require_input(input)?;
        debug!(query, "querying wolfram alpha");

        let resp = self
            .client
            .get(&self.api_url)
            .query(&[("appid", self.app_id.as_str()), ("i", query)])
            .send()
            .await
            .map_err(|e| request_failed("Wolfram Alpha", e))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ToolError::Failed(format!("failed to read Wolfram Alpha response: {e}")))?;

        if status.is_success() {
            return Ok(body.trim().to_string());
        }
        match status.as_u16() {
            // The input was understood but has no short answer.
            501 => Ok("Wolfram Alpha wasn't able to answer it".to_string()),
            403 => Err(ToolError::Failed(format!(
                "Wolfram Alpha rejected the app id: {}",
                body.trim()
            ))),
            code => Err(ToolError::Failed(format!(
                "Wolfram Alpha returned HTTP {code}"
            ))),
        }
    }
}
