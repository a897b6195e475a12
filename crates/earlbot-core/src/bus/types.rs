//! Bus event types — messages flowing between channels and the bot.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// An inbound chat message. Immutable once received.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    /// Channel name (e.g. "discord", "cli").
    pub channel: String,
    /// Author identifier within the channel.
    pub sender_id: String,
    /// Chat/conversation identifier.
    pub chat_id: String,
    /// Raw text content of the message.
    pub content: String,
    /// When the message was received.
    pub timestamp: DateTime<Utc>,
    /// Channel-specific metadata (e.g. message_id, username).
    pub metadata: HashMap<String, String>,
}

impl InboundMessage {
    /// Create a new inbound message with minimal required fields.
    pub fn new(
        channel: impl Into<String>,
        sender_id: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        InboundMessage {
            channel: channel.into(),
            sender_id: sender_id.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Session key combining channel and chat_id (e.g. "discord:123456").
    ///
    /// Conversation memory is partitioned by this key.
    pub fn session_key(&self) -> String {
        format!("{}:{}", self.channel, self.chat_id)
    }

    /// Human-readable author name, falling back to the sender id.
    pub fn author(&self) -> &str {
        self.metadata
            .get("username")
            .map(String::as_str)
            .unwrap_or(&self.sender_id)
    }
}

/// Where a reply is delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    /// Direct message to the author.
    Private,
    /// Posted in the channel the message came from.
    Broadcast,
}

/// An outbound reply from the bot to a channel.
#[derive(Clone, Debug)]
pub struct OutboundMessage {
    /// Target channel name.
    pub channel: String,
    /// Chat/conversation the reply belongs to.
    pub chat_id: String,
    /// Author of the message being answered (private replies go here).
    pub recipient_id: String,
    /// Text content to send.
    pub content: String,
    /// Private (DM to `recipient_id`) or broadcast (post in `chat_id`).
    pub visibility: Visibility,
    /// Channel-specific metadata.
    pub metadata: HashMap<String, String>,
}

impl OutboundMessage {
    /// Create a broadcast message for a chat.
    pub fn new(
        channel: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        OutboundMessage {
            channel: channel.into(),
            chat_id: chat_id.into(),
            recipient_id: String::new(),
            content: content.into(),
            visibility: Visibility::Broadcast,
            metadata: HashMap::new(),
        }
    }

    /// Build a reply to `inbound` with the given visibility.
    pub fn reply_to(
        inbound: &InboundMessage,
        content: impl Into<String>,
        visibility: Visibility,
    ) -> Self {
        let mut msg = Self::new(&inbound.channel, &inbound.chat_id, content);
        msg.recipient_id = inbound.sender_id.clone();
        msg.visibility = visibility;
        if let Some(id) = inbound.metadata.get("message_id") {
            msg.metadata.insert("reply_to".into(), id.clone());
        }
        msg
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_message_creation() {
        let msg = InboundMessage::new("discord", "user_42", "chan_99", "$earlgpt");

        assert_eq!(msg.channel, "discord");
        assert_eq!(msg.sender_id, "user_42");
        assert_eq!(msg.chat_id, "chan_99");
        assert_eq!(msg.content, "$earlgpt");
        assert!(msg.metadata.is_empty());
    }

    #[test]
    fn test_session_key() {
        let msg = InboundMessage::new("discord", "user_1", "channel_abc", "test");
        assert_eq!(msg.session_key(), "discord:channel_abc");
    }

    #[test]
    fn test_author_prefers_username() {
        let mut msg = InboundMessage::new("discord", "user_1", "c", "hi");
        assert_eq!(msg.author(), "user_1");
        msg.metadata.insert("username".into(), "amps".into());
        assert_eq!(msg.author(), "amps");
    }

    #[test]
    fn test_outbound_defaults_to_broadcast() {
        let msg = OutboundMessage::new("discord", "chan_99", "Here's your answer!");
        assert_eq!(msg.visibility, Visibility::Broadcast);
        assert!(!msg.is_private());
        assert!(msg.recipient_id.is_empty());
    }

    #[test]
    fn test_reply_to_carries_author_and_reference() {
        let mut inbound = InboundMessage::new("discord", "user_7", "chan_1", "!lora");
        inbound.metadata.insert("message_id".into(), "m-1".into());

        let reply = OutboundMessage::reply_to(&inbound, "Hello!", Visibility::Private);
        assert_eq!(reply.channel, "discord");
        assert_eq!(reply.chat_id, "chan_1");
        assert_eq!(reply.recipient_id, "user_7");
        assert!(reply.is_private());
        assert_eq!(reply.metadata.get("reply_to").unwrap(), "m-1");
    }
}
