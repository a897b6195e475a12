//! `Wikipedia` tool — MediaWiki search with plain-text intro extracts.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use earlbot_core::error::ToolError;
use earlbot_core::utils::truncate_string;

use super::base::{http_client, request_failed, require_input, Tool};

const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";

/// Pages summarized per query.
const TOP_K_RESULTS: usize = 3;

/// Output cap, in characters.
const MAX_OUTPUT_CHARS: usize = 4000;

/// Searches Wikipedia and returns page summaries.
pub struct WikipediaTool {
    client: Client,
    api_url: String,
}

impl WikipediaTool {
    pub fn new() -> Self {
        Self {
            client: http_client(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Point at another MediaWiki `api.php` endpoint.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

impl Default for WikipediaTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        "Wikipedia"
    }

    fn description(&self) -> &str {
        "A wrapper around Wikipedia. Useful for when you need to answer general questions about \
         people, places, companies, facts, historical events, or other subjects. \
         Input should be a search query."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let query = require_input(input)?;
        debug!(query, "searching wikipedia");

        let limit = TOP_K_RESULTS.to_string();
        let resp = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrlimit", limit.as_str()),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Wikipedia", e))?;

        if !resp.status().is_success() {
            return Err(ToolError::Failed(format!(
                "Wikipedia returned HTTP {}",
                resp.status().as_u16()
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ToolError::Failed(format!("failed to parse Wikipedia response: {e}")))?;

        Ok(format_pages(&body))
    }
}

/// Render the `query.pages` array in search-rank order.
fn format_pages(body: &Value) -> String {
    let mut pages: Vec<&Value> = body["query"]["pages"]
        .as_array()
        .map(|a| a.iter().collect())
        .unwrap_or_default();
    pages.sort_by_key(|p| p["index"].as_u64().unwrap_or(u64::MAX));

    let summaries: Vec<String> = pages
        .iter()
        .filter_map(|p| {
            let title = p["title"].as_str()?;
            let extract = p["extract"].as_str().unwrap_or("").trim();
            Some(format!("Page: {title}\nSummary: {extract}"))
        })
        .collect();

    if summaries.is_empty() {
        return "No good Wikipedia Search Result was found".to_string();
    }
    truncate_string(&summaries.join("\n\n"), MAX_OUTPUT_CHARS)
}
