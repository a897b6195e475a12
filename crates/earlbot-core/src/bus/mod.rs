//! Message bus — bounded queues connecting channels and the bot.

pub mod queue;
pub mod types;

pub use queue::MessageBus;
pub use types::{InboundMessage, OutboundMessage, Visibility};
