//! HTTP completion client for OpenAI-compatible APIs.
//!
//! Talks directly to any `/chat/completions` endpoint via `reqwest` and maps
//! every failure onto [`ServiceError`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use earlbot_core::config::schema::ProviderConfig;
use earlbot_core::error::ServiceError;
use earlbot_core::types::{ChatCompletionRequest, ChatCompletionResponse};

use crate::traits::{CompletionRequest, CompletionService, LlmRequestConfig};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// A completion service that talks to any OpenAI-compatible HTTP API.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.openai.com/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    model: String,
    sampling: LlmRequestConfig,
    timeout: Duration,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl HttpProvider {
    /// Create a provider from the `provider` config section.
    pub fn new(config: &ProviderConfig) -> Result<Self, ServiceError> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    /// Same as [`new`](Self::new) with a custom HTTP timeout.
    pub fn with_timeout(config: &ProviderConfig, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpProvider {
            client,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            sampling: LlmRequestConfig {
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            },
            timeout,
        })
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_timeout() {
            ServiceError::Timeout(self.timeout)
        } else {
            ServiceError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl CompletionService for HttpProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ServiceError> {
        let messages = request.to_messages();

        debug!(
            model = %self.model,
            messages = messages.len(),
            stop = request.stop.len(),
            "Calling LLM"
        );

        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: Some(self.sampling.max_tokens),
            temperature: Some(self.sampling.temperature),
            stop: request.stop.clone(),
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "HTTP request failed");
                self.map_transport_error(e)
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            error!(model = %self.model, "Completion service rate limited the request");
            return Err(ServiceError::RateLimited);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(model = %self.model, status = %status, body = %body, "API error");
            return Err(ServiceError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let chat_resp = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "Failed to parse LLM response");
                if e.is_timeout() {
                    ServiceError::Timeout(self.timeout)
                } else {
                    ServiceError::Malformed(e.to_string())
                }
            })?;

        if let Some(usage) = &chat_resp.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "LLM usage"
            );
        }

        let text = chat_resp
            .into_text()
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ServiceError::Malformed("response has no message content".into()))?;

        debug!(model = %self.model, chars = text.len(), "LLM response received");
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use earlbot_core::types::ConversationTurn;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_config(api_key: &str, api_base: &str) -> ProviderConfig {
        ProviderConfig {
            api_key: api_key.to_string(),
            api_base: api_base.to_string(),
            ..Default::default()
        }
    }

    fn ok_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-test",
            "choices": [{
                "message": { "content": content },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 10,
                "completion_tokens": 5,
                "total_tokens": 15
            }
        })
    }

    // ── Unit tests ──

    #[test]
    fn test_completions_url_trailing_slash() {
        let provider =
            HttpProvider::new(&make_config("key", "https://api.openai.com/v1/")).unwrap();
        assert_eq!(
            provider.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_completions_url_no_trailing_slash() {
        let provider = HttpProvider::new(&make_config("key", "https://api.openai.com/v1")).unwrap();
        assert_eq!(
            provider.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_model_from_config() {
        let provider = HttpProvider::new(&ProviderConfig::default()).unwrap();
        assert_eq!(provider.model(), "gpt-3.5-turbo");
    }

    // ── Integration tests with mock server ──

    #[tokio::test]
    async fn test_complete_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("Hello! I'm Earl.")))
            .mount(&mock_server)
            .await;

        let provider = HttpProvider::new(&make_config("test-key-123", &mock_server.uri())).unwrap();
        let text = provider
            .complete(&CompletionRequest::new("You are Earl.AI.", "Hello"))
            .await
            .unwrap();

        assert_eq!(text, "Hello! I'm Earl.");
    }

    #[tokio::test]
    async fn test_complete_sends_correct_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 1024,
                "temperature": 0.6,
                "stop": ["\nObservation:"],
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "earlier" },
                    { "role": "assistant", "content": "answer" },
                    { "role": "user", "content": "now" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("ok")))
            .mount(&mock_server)
            .await;

        let provider = HttpProvider::new(&make_config("key", &mock_server.uri())).unwrap();
        let history = vec![
            ConversationTurn::user("earlier"),
            ConversationTurn::assistant("answer"),
        ];
        let request = CompletionRequest::new("sys", "now")
            .with_history(&history)
            .with_stop("\nObservation:");

        // If the body matcher fails, wiremock returns 404 → Http error
        assert_eq!(provider.complete(&request).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_complete_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "Rate limit exceeded", "type": "rate_limit_error" }
            })))
            .mount(&mock_server)
            .await;

        let provider = HttpProvider::new(&make_config("key", &mock_server.uri())).unwrap();
        let err = provider
            .complete(&CompletionRequest::new("s", "Hello"))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::RateLimited);
    }

    #[tokio::test]
    async fn test_complete_http_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&mock_server)
            .await;

        let provider = HttpProvider::new(&make_config("key", &mock_server.uri())).unwrap();
        let err = provider
            .complete(&CompletionRequest::new("s", "Hello"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::Http {
                status: 500,
                body: "upstream exploded".into()
            }
        );
    }

    #[tokio::test]
    async fn test_complete_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&mock_server)
            .await;

        let provider = HttpProvider::new(&make_config("key", &mock_server.uri())).unwrap();
        let err = provider
            .complete(&CompletionRequest::new("s", "Hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_complete_missing_content() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-empty",
                "choices": [{ "message": { "content": null }, "finish_reason": "stop" }],
                "usage": null
            })))
            .mount(&mock_server)
            .await;

        let provider = HttpProvider::new(&make_config("key", &mock_server.uri())).unwrap();
        let err = provider
            .complete(&CompletionRequest::new("s", "Hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_complete_blank_content() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("  \n ")))
            .mount(&mock_server)
            .await;

        let provider = HttpProvider::new(&make_config("key", &mock_server.uri())).unwrap();
        let err = provider
            .complete(&CompletionRequest::new("s", "Hello"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::Malformed("response has no message content".into())
        );
    }

    #[tokio::test]
    async fn test_complete_network_error() {
        // Point to a port that's not listening
        let provider = HttpProvider::new(&make_config("key", "http://127.0.0.1:1")).unwrap();
        let err = provider
            .complete(&CompletionRequest::new("s", "Hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Network(_)));
    }

    #[tokio::test]
    async fn test_complete_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ok_body("late"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let provider = HttpProvider::with_timeout(
            &make_config("key", &mock_server.uri()),
            Duration::from_millis(50),
        )
        .unwrap();
        let err = provider
            .complete(&CompletionRequest::new("s", "Hello"))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Timeout(Duration::from_millis(50)));
    }
}
