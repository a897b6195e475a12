//! Earlbot Channels — chat platform adapters.
//!
//! - **base**: the `Channel` trait every adapter implements
//! - **manager**: `ChannelManager`, lifecycle and outbound dispatch
//! - **discord**: Discord gateway + REST adapter (feature `discord`)

pub mod base;
pub mod manager;

#[cfg(feature = "discord")]
pub mod discord;

pub use base::Channel;
pub use manager::ChannelManager;

#[cfg(feature = "discord")]
pub use discord::DiscordChannel;
