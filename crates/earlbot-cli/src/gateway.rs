//! Gateway command — the bot loop plus the Discord channel.
//!
//! Startup:
//! 1. Load and validate config (token and API key required)
//! 2. Create the message bus, bot and channel manager
//! 3. `tokio::select!` of bot loop, channel manager and Ctrl+C

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use earlbot_channels::ChannelManager;
use earlbot_core::bus::MessageBus;
use earlbot_core::config::{load_config, Config};

use crate::{build_bot, helpers, BUS_CAPACITY};

pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    helpers::print_banner("gateway");

    let config = load_config(config_path.as_deref());
    config
        .validate_for_gateway()
        .context("gateway configuration incomplete")?;

    let bus = Arc::new(MessageBus::new(BUS_CAPACITY));
    let bot = build_bot(&config, Arc::clone(&bus))?;
    let channel_manager = register_channels(&config, Arc::clone(&bus));

    info!(
        model = %bot.model(),
        tools = ?bot.tools().list_names(),
        channels = ?channel_manager.channel_names(),
        "gateway starting"
    );

    println!("  Model:     {}", bot.model());
    println!("  Tools:     {}", bot.tools().list_names().join(", "));
    println!("  Channels:  {}", channel_manager.channel_names().join(", "));
    println!();
    println!("  Ctrl+C to stop");
    println!();

    tokio::select! {
        _ = bot.run() => {
            info!("bot loop exited");
        }
        _ = channel_manager.start_all() => {
            info!("channel manager exited");
        }
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "failed to listen for Ctrl+C");
            }
            println!();
            println!("  Shutting down...");
            info!("received Ctrl+C, shutting down");
            channel_manager.stop_all().await;
        }
    }

    println!("  Gateway stopped. Goodbye!");
    Ok(())
}

/// Channel manager with every configured channel registered.
fn register_channels(config: &Config, bus: Arc<MessageBus>) -> ChannelManager {
    #[allow(unused_mut)]
    let mut manager = ChannelManager::new(Arc::clone(&bus));

    #[cfg(feature = "discord")]
    {
        let discord = &config.channels.discord;
        if !discord.token.is_empty() {
            use earlbot_channels::DiscordChannel;
            manager.register(Arc::new(DiscordChannel::new(discord, bus)));
        }
    }
    #[cfg(not(feature = "discord"))]
    let _ = (config, bus);

    manager
}

#[cfg(all(test, feature = "discord"))]
mod tests {
    use super::*;

    #[test]
    fn test_no_token_no_channels() {
        let manager = register_channels(&Config::default(), Arc::new(MessageBus::new(4)));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_discord_registered_with_token() {
        let mut config = Config::default();
        config.channels.discord.token = "abc".into();
        let manager = register_channels(&config, Arc::new(MessageBus::new(4)));
        assert_eq!(manager.channel_names(), vec!["discord"]);
    }
}
