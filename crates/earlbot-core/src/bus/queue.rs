//! Async message bus between chat channels and the bot.
//!
//! Uses tokio::sync::mpsc bounded channels.

use super::types::{InboundMessage, OutboundMessage};
use tokio::sync::mpsc;

/// The message bus connecting channels ↔ bot.
///
/// - Channels publish to `inbound` (user messages arriving)
/// - The bot consumes from `inbound`, one message at a time, and publishes replies to `outbound`
/// - The channel manager consumes from `outbound` and routes to the correct channel
pub struct MessageBus {
    inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
    outbound_tx: mpsc::Sender<OutboundMessage>,
    outbound_rx: tokio::sync::Mutex<mpsc::Receiver<OutboundMessage>>,
}

impl MessageBus {
    /// Create a new message bus with the given buffer capacity.
    pub fn new(buffer_size: usize) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(buffer_size);
        let (outbound_tx, outbound_rx) = mpsc::channel(buffer_size);

        MessageBus {
            inbound_tx,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            outbound_tx,
            outbound_rx: tokio::sync::Mutex::new(outbound_rx),
        }
    }

    /// Publish a message from a channel to the bot (inbound).
    pub async fn publish_inbound(
        &self,
        msg: InboundMessage,
    ) -> Result<(), mpsc::error::SendError<InboundMessage>> {
        self.inbound_tx.send(msg).await
    }

    /// Consume the next inbound message (waits until available).
    ///
    /// Returns `None` once the inbound side is closed and drained.
    pub async fn consume_inbound(&self) -> Option<InboundMessage> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await
    }

    /// Stop accepting inbound messages. Already queued messages are still delivered.
    pub async fn close_inbound(&self) {
        self.inbound_rx.lock().await.close();
    }

    /// Publish a reply from the bot to a channel (outbound).
    pub async fn publish_outbound(
        &self,
        msg: OutboundMessage,
    ) -> Result<(), mpsc::error::SendError<OutboundMessage>> {
        self.outbound_tx.send(msg).await
    }

    /// Consume the next outbound message (waits until available).
    pub async fn consume_outbound(&self) -> Option<OutboundMessage> {
        let mut rx = self.outbound_rx.lock().await;
        rx.recv().await
    }

    /// Take the next outbound message if one is already queued.
    pub async fn try_consume_outbound(&self) -> Option<OutboundMessage> {
        let mut rx = self.outbound_rx.lock().await;
        rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::types::Visibility;

    #[tokio::test]
    async fn test_inbound_message_flow() {
        let bus = MessageBus::new(10);

        let msg = InboundMessage::new("discord", "user_1", "chan_1", "help");
        bus.publish_inbound(msg).await.unwrap();

        let received = bus.consume_inbound().await.unwrap();
        assert_eq!(received.channel, "discord");
        assert_eq!(received.content, "help");
    }

    #[tokio::test]
    async fn test_inbound_order_preserved() {
        let bus = MessageBus::new(10);

        for i in 1..=3 {
            let msg = InboundMessage::new("cli", "local", "default", format!("msg-{i}"));
            bus.publish_inbound(msg).await.unwrap();
        }

        for i in 1..=3 {
            let m = bus.consume_inbound().await.unwrap();
            assert_eq!(m.content, format!("msg-{i}"));
        }
    }

    #[tokio::test]
    async fn test_close_inbound_drains_then_ends() {
        let bus = MessageBus::new(10);
        bus.publish_inbound(InboundMessage::new("cli", "u", "c", "last"))
            .await
            .unwrap();
        bus.close_inbound().await;

        assert_eq!(bus.consume_inbound().await.unwrap().content, "last");
        assert!(bus.consume_inbound().await.is_none());
        assert!(bus
            .publish_inbound(InboundMessage::new("cli", "u", "c", "late"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_outbound_round_trip() {
        let bus = std::sync::Arc::new(MessageBus::new(10));

        let inbound = InboundMessage::new("discord", "user_42", "chan_99", "!lora");
        bus.publish_inbound(inbound).await.unwrap();
        let received = bus.consume_inbound().await.unwrap();

        let reply = OutboundMessage::reply_to(&received, "Hello!", Visibility::Private);
        bus.publish_outbound(reply).await.unwrap();

        let outbound = bus.consume_outbound().await.unwrap();
        assert_eq!(outbound.chat_id, "chan_99");
        assert_eq!(outbound.recipient_id, "user_42");
        assert!(outbound.is_private());
    }

    #[tokio::test]
    async fn test_try_consume_outbound_empty() {
        let bus = MessageBus::new(4);
        assert!(bus.try_consume_outbound().await.is_none());
        bus.publish_outbound(OutboundMessage::new("cli", "c", "x"))
            .await
            .unwrap();
        assert!(bus.try_consume_outbound().await.is_some());
    }
}
