//! Core types for Earlbot.
//!
//! Two families live here:
//! - conversation turns kept in per-session memory ([`ConversationTurn`]);
//! - the OpenAI chat completions wire format used by the completion client
//!   ([`Message`], [`ChatCompletionRequest`], [`ChatCompletionResponse`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Conversation turns
// ─────────────────────────────────────────────

/// Who produced a conversation turn.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of a session's conversation log.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// A turn written by the user, stamped now.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// A turn written by the bot, stamped now.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Rough token estimate (one token per four characters, rounded up).
    pub fn estimated_tokens(&self) -> usize {
        self.text.chars().count().div_ceil(4)
    }

    /// Convert to the wire format.
    pub fn to_message(&self) -> Message {
        match self.role {
            Role::User => Message::user(&self.text),
            Role::Assistant => Message::assistant(&self.text),
        }
    }
}

// ─────────────────────────────────────────────
// Messages (OpenAI chat completions format)
// ─────────────────────────────────────────────

/// A chat message in the OpenAI format. Each variant maps to a `role` value.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role")]
pub enum Message {
    #[serde(rename = "system")]
    System { content: String },

    #[serde(rename = "user")]
    User { content: String },

    #[serde(rename = "assistant")]
    Assistant { content: String },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────
// Chat completion request / response
// ─────────────────────────────────────────────

/// Request body for an OpenAI-compatible chat completion API.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

/// Raw chat completion response. Used internally for deserialization.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: Option<String>,
    pub choices: Vec<ChatChoice>,
    pub usage: Option<UsageInfo>,
}

/// A single choice in a chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: AssistantMessage,
    pub finish_reason: Option<String>,
}

/// The assistant message within a chat completion choice.
#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    pub content: Option<String>,
}

/// Token usage statistics from the LLM.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UsageInfo {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if the model produced any.
    pub fn into_text(self) -> Option<String> {
        self.choices.into_iter().next().and_then(|c| c.message.content)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_turn_constructors() {
        let user = ConversationTurn::user("hi");
        let bot = ConversationTurn::assistant("hello");
        assert_eq!(user.role, Role::User);
        assert_eq!(bot.role, Role::Assistant);
        assert!(user.timestamp <= bot.timestamp);
    }

    #[test]
    fn test_estimated_tokens_rounds_up() {
        assert_eq!(ConversationTurn::user("").estimated_tokens(), 0);
        assert_eq!(ConversationTurn::user("abc").estimated_tokens(), 1);
        assert_eq!(ConversationTurn::user("abcd").estimated_tokens(), 1);
        assert_eq!(ConversationTurn::user("abcde").estimated_tokens(), 2);
    }

    #[test]
    fn test_turn_to_message() {
        assert_eq!(ConversationTurn::user("q").to_message(), Message::user("q"));
        assert_eq!(
            ConversationTurn::assistant("a").to_message(),
            Message::assistant("a")
        );
    }

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_value(Message::system("You are Earl.AI.")).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "You are Earl.AI.");

        let json = serde_json::to_value(Message::assistant("Sure.")).unwrap();
        assert_eq!(json["role"], "assistant");
    }

    #[test]
    fn test_chat_request_omits_empty_fields() {
        let request = ChatCompletionRequest {
            model: "gpt-3.5-turbo".into(),
            messages: vec![Message::user("Hello")],
            max_tokens: None,
            temperature: Some(0.6),
            stop: Vec::new(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["temperature"], 0.6);
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("stop").is_none());
    }

    #[test]
    fn test_chat_request_with_stop() {
        let request = ChatCompletionRequest {
            model: "gpt-3.5-turbo".into(),
            messages: vec![],
            max_tokens: Some(256),
            temperature: None,
            stop: vec!["\nObservation:".into()],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stop"][0], "\nObservation:");
        assert_eq!(json["max_tokens"], 256);
    }

    #[test]
    fn test_response_into_text() {
        let resp: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{ "message": { "content": "Hi!" }, "finish_reason": "stop" }],
            "usage": { "prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4 }
        }))
        .unwrap();
        assert_eq!(resp.usage.as_ref().unwrap().total_tokens, 4);
        assert_eq!(resp.into_text().as_deref(), Some("Hi!"));
    }

    #[test]
    fn test_response_without_choices() {
        let resp: ChatCompletionResponse =
            serde_json::from_value(json!({ "id": null, "choices": [], "usage": null })).unwrap();
        assert!(resp.into_text().is_none());
    }
}
