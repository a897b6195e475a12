//! `requests` tool — HTTP GET a URL and return its readable text.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use earlbot_core::error::ToolError;
use earlbot_core::utils::truncate_string;

use super::base::{http_client, request_failed, require_input, Tool};

/// Fetches a web page for the planner.
pub struct RequestsGetTool {
    client: Client,
    max_chars: usize,
}

impl RequestsGetTool {
    /// Create the tool, capping returned text at `max_chars` characters.
    pub fn new(max_chars: usize) -> Self {
        Self {
            client: http_client(),
            max_chars: max_chars.max(100),
        }
    }
}

#[async_trait]
impl Tool for RequestsGetTool {
    fn name(&self) -> &str {
        "requests"
    }

    fn description(&self) -> &str {
        "A portal to the internet. Use this when you need to get specific content from a site. \
         Input should be a specific url, and the output will be all the text on that page."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let url = require_input(input)?;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::InvalidInput(format!(
                "'{url}' is not a URL; it must start with http:// or https://"
            )));
        }

        debug!(url, "fetching web page");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_failed("GET", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ToolError::Failed(format!(
                "GET {url} returned HTTP {}",
                status.as_u16()
            )));
        }

        let is_html = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("html"));

        let body = resp
            .text()
            .await
            .map_err(|e| ToolError::Failed(format!("failed to read response body: {e}")))?;

        let text = if is_html || body.trim_start().starts_with('<') {
            html_to_text(&body)
        } else {
            body
        };

        Ok(truncate_string(&text, self.max_chars))
    }
}

// ─────────────────────────────────────────────
// HTML helpers
// ─────────────────────────────────────────────

/// Tags whose end starts a new line of text.
const BLOCK_TAGS: &[&str] = &[
    "br", "p", "div", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "title",
];

/// Reduce an HTML document to readable text.
///
/// Drops tags, `<script>` and `<style>` bodies, decodes the common entities,
/// and collapses whitespace into single spaces and single newlines.
fn html_to_text(html: &str) -> String {
    let mut raw = String::with_capacity(html.len() / 2);
    let mut chars = html.chars();
    let mut skipping: Option<&str> = None;

    while let Some(ch) = chars.next() {
        if ch != '<' {
            if skipping.is_none() {
                raw.push(ch);
            }
            continue;
        }

        let tag: String = chars.by_ref().take_while(|&c| c != '>').collect();
        let name: String = tag
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        let closing = tag.starts_with('/');

        match skipping {
            Some(open) if closing && name == open => skipping = None,
            Some(_) => {}
            None if !closing && (name == "script" || name == "style") => {
                skipping = Some(if name == "script" { "script" } else { "style" });
            }
            None if BLOCK_TAGS.contains(&name.as_str()) => raw.push('\n'),
            None => raw.push(' '),
        }
    }

    let decoded = raw
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_html_basic() {
        let text = html_to_text("<html><body><h1>Title</h1><p>Hello <b>world</b></p></body></html>");
        assert_eq!(text, "Title\nHello world");
    }

    #[test]
    fn test_html_drops_script_and_style() {
        let html = "<style>body { color: red; }</style><p>Before</p>\
                    <script type=\"text/javascript\">alert('<p>x</p>');</script><p>After</p>";
        let text = html_to_text(html);
        assert_eq!(text, "Before\nAfter");
    }

    #[test]
    fn test_html_entities() {
        assert_eq!(html_to_text("<p>A &amp; B &lt; C &gt; D</p>"), "A & B < C > D");
        assert_eq!(html_to_text("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_html_line_breaks() {
        assert_eq!(html_to_text("Line1<br>Line2<br/>Line3"), "Line1\nLine2\nLine3");
    }

    #[tokio::test]
    async fn test_rejects_non_url() {
        let err = RequestsGetTool::new(1000).invoke("not-a-url").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/about"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_string("<h1>Lifehouse Labs</h1><p>Creative agency.</p>"),
            )
            .mount(&server)
            .await;

        let tool = RequestsGetTool::new(1000);
        let out = tool.invoke(&format!("{}/about", server.uri())).await.unwrap();
        assert_eq!(out, "Lifehouse Labs\nCreative agency.");
    }

    #[tokio::test]
    async fn test_fetch_plain_text_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a".repeat(500)))
            .mount(&server)
            .await;

        let out = RequestsGetTool::new(120).invoke(&server.uri()).await.unwrap();
        assert_eq!(out.chars().count(), 120);
        assert!(out.ends_with("..."));
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = RequestsGetTool::new(1000).invoke(&server.uri()).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 404"));
    }
}
