//! Channel Manager — channel lifecycle and outbound dispatch.
//!
//! Registered channels are started as background tasks. A dispatcher task
//! drains the bus outbound queue and hands each reply to the channel named
//! in `OutboundMessage.channel`. Delivery failures are logged and the
//! message is dropped; the dispatcher keeps running.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use earlbot_core::bus::MessageBus;

use crate::base::Channel;

// ─────────────────────────────────────────────
// ChannelManager
// ─────────────────────────────────────────────

pub struct ChannelManager {
    channels: HashMap<String, Arc<dyn Channel>>,
    bus: Arc<MessageBus>,
    shutdown: Arc<Notify>,
}

impl ChannelManager {
    pub fn new(bus: Arc<MessageBus>) -> Self {
        Self {
            channels: HashMap::new(),
            bus,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Register a channel. Replaces any channel with the same name.
    pub fn register(&mut self, channel: Arc<dyn Channel>) {
        let name = channel.name().to_string();
        info!(channel = %name, "registered channel");
        self.channels.insert(name, channel);
    }

    /// Registered channel names, sorted.
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Start every channel and the outbound dispatcher, then wait for
    /// `stop_all()`.
    pub async fn start_all(&self) {
        if self.channels.is_empty() {
            warn!("no channels registered, nothing to start");
            return;
        }

        info!(channels = ?self.channel_names(), "starting {} channel(s)", self.channels.len());

        for (name, channel) in &self.channels {
            let channel = Arc::clone(channel);
            let name = name.clone();
            tokio::spawn(async move {
                info!(channel = %name, "channel starting");
                if let Err(e) = channel.start().await {
                    error!(channel = %name, error = %e, "channel stopped with error");
                } else {
                    info!(channel = %name, "channel stopped");
                }
            });
        }

        let bus = Arc::clone(&self.bus);
        let channels = self.channels.clone();
        let shutdown = Arc::clone(&self.shutdown);
        tokio::spawn(async move {
            Self::dispatch_outbound(bus, channels, shutdown).await;
        });

        self.shutdown.notified().await;
        info!("channel manager shutting down");
    }

    /// Stop the dispatcher and every channel.
    pub async fn stop_all(&self) {
        info!("stopping all channels");
        self.shutdown.notify_waiters();

        for (name, channel) in &self.channels {
            debug!(channel = %name, "stopping channel");
            if let Err(e) = channel.stop().await {
                error!(channel = %name, error = %e, "channel stop failed");
            }
        }
    }

    async fn dispatch_outbound(
        bus: Arc<MessageBus>,
        channels: HashMap<String, Arc<dyn Channel>>,
        shutdown: Arc<Notify>,
    ) {
        info!("outbound dispatcher started");

        loop {
            tokio::select! {
                msg = bus.consume_outbound() => {
                    let Some(outbound) = msg else {
                        info!("outbound bus closed, dispatcher exiting");
                        break;
                    };

                    debug!(
                        channel = %outbound.channel,
                        chat_id = %outbound.chat_id,
                        private = outbound.is_private(),
                        content_len = outbound.content.len(),
                        "dispatching outbound message"
                    );

                    match channels.get(&outbound.channel) {
                        Some(channel) => {
                            if let Err(e) = channel.send(&outbound).await {
                                error!(
                                    channel = %outbound.channel,
                                    chat_id = %outbound.chat_id,
                                    error = %e,
                                    "failed to deliver reply, dropping it"
                                );
                            }
                        }
                        None => warn!(
                            channel = %outbound.channel,
                            "no channel registered for outbound message"
                        ),
                    }
                }
                _ = shutdown.notified() => {
                    info!("dispatcher received shutdown signal");
                    break;
                }
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
