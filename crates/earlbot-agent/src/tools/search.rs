//! `Search` tool — Google results through SerpAPI.
//!
//! Returns the single most direct snippet rather than a result list: the
//! answer box first, then the knowledge graph, then the top organic result.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use earlbot_core::error::ToolError;

use super::base::{http_client, request_failed, require_input, Tool};

const DEFAULT_API_URL: &str = "https://serpapi.com/search";

const NO_RESULT: &str = "No good search result found";

/// Web search via SerpAPI.
pub struct SerpApiSearchTool {
    api_key: String,
    client: Client,
    api_url: String,
}

impl SerpApiSearchTool {
    /// Create the tool. An empty key is reported at invocation time.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
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
impl Tool for SerpApiSearchTool {
    fn name(&self) -> &str {
        "Search"
    }

    fn description(&self) -> &str {
        "A search engine. Useful for when you need to answer questions about current events. \
         Input should be a search query."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        if self.api_key.trim().is_empty() {
            return Err(ToolError::NotConfigured("SerpAPI key".into()));
        }
        let query = require_input(input)?;
        debug!(query, "searching with serpapi");

        let resp = self
            .client
            .get(&self.api_url)
            .query(&[
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("engine", "google"),
                ("google_domain", "google.com"),
                ("gl", "us"),
                ("hl", "en"),
            ])
            .send()
            .await
            .map_err(|e| request_failed("SerpAPI", e))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| request_failed("SerpAPI", e))?;
        let parsed = serde_json::from_str::<Value>(&text);

        if let Some(err) = parsed.as_ref().ok().and_then(|body| body["error"].as_str()) {
            return Err(ToolError::Failed(format!("Got error from SerpAPI: {err}")));
        }
        if !status.is_success() {
            return Err(ToolError::Failed(format!(
                "SerpAPI returned HTTP {}",
                status.as_u16()
            )));
        }
        let body = parsed
            .map_err(|e| ToolError::Failed(format!("failed to parse SerpAPI response: {e}")))?;

        Ok(best_snippet(&body).unwrap_or(NO_RESULT).to_string())
    }
}

/// Pick the most direct answer from a SerpAPI result.
fn best_snippet(body: &Value) -> Option<&str> {
    let answer_box = &body["answer_box"];
    answer_box["answer"]
        .as_str()
        .or_else(|| answer_box["snippet"].as_str())
        .or_else(|| answer_box["snippet_highlighted_words"][0].as_str())
        .or_else(|| body["knowledge_graph"]["description"].as_str())
        .or_else(|| body["organic_results"][0]["snippet"].as_str())
}
