//! Channel trait — the interface every chat platform adapter implements.
//!
//! An adapter publishes `InboundMessage`s on the bus while `start()` runs
//! and delivers replies through `send()`. Private replies go to the
//! author's direct-message conversation; broadcast replies go to the chat
//! the message came from.

use async_trait::async_trait;
use earlbot_core::bus::OutboundMessage;
use earlbot_core::error::TransportError;

#[async_trait]
pub trait Channel: Send + Sync {
    /// Unique channel name (e.g. "discord").
    ///
    /// Must match `InboundMessage.channel` for messages this adapter
    /// publishes, so replies are dispatched back to it.
    fn name(&self) -> &str;

    /// Listen for incoming messages until `stop()` is called.
    async fn start(&self) -> Result<(), TransportError>;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), TransportError>;

    /// Deliver one reply.
    async fn send(&self, msg: &OutboundMessage) -> Result<(), TransportError>;
}
