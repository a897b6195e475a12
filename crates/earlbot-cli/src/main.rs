//! Earlbot CLI — entry point.
//!
//! # Commands
//!
//! - `earlbot gateway [--logs]` — run the bot on Discord until Ctrl+C
//! - `earlbot chat [-m MESSAGE] [--logs]` — route one line or a REPL locally
//! - `earlbot status` — show configuration and key status
//! - `earlbot onboard` — write the default config file

mod gateway;
mod helpers;
mod onboard;
mod repl;
mod status;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use earlbot_agent::{build_registry, Bot};
use earlbot_core::bus::MessageBus;
use earlbot_core::config::{load_config, Config};
use earlbot_core::utils::expand_home;
use earlbot_providers::HttpProvider;

/// Bus queue depth.
const BUS_CAPACITY: usize = 100;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Earlbot — an AI co-founder for your Discord server
#[derive(Parser)]
#[command(name = "earlbot", version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.earlbot/config.json)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and answer commands until Ctrl+C
    Gateway {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Route commands locally (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and key status
    Status,

    /// Write the default configuration file
    Onboard,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref().map(expand_home);

    match cli.command {
        Commands::Gateway { logs } => {
            init_logging(logs);
            gateway::run(config_path).await
        }
        Commands::Chat { message, logs } => {
            init_logging(logs);
            run_chat(config_path, message).await
        }
        Commands::Status => status::run(config_path),
        Commands::Onboard => onboard::run(config_path),
    }
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

async fn run_chat(config_path: Option<PathBuf>, message: Option<String>) -> Result<()> {
    let config = load_config(config_path.as_deref());
    if !config.provider.is_configured() {
        helpers::print_warning(
            "no API key configured; $earlgpt and $plug will fail (set OPENAI_API_KEY)",
        );
    }

    let bus = Arc::new(MessageBus::new(BUS_CAPACITY));
    let bot = build_bot(&config, bus)?;

    match message {
        Some(text) => {
            info!("processing single message");
            match bot.process_direct(&text).await {
                Some(reply) => helpers::print_reply(&reply),
                None => helpers::print_no_reply(),
            }
        }
        None => repl::run(&bot).await?,
    }

    Ok(())
}

/// Build the bot and its collaborators from configuration.
pub fn build_bot(config: &Config, bus: Arc<MessageBus>) -> Result<Bot> {
    config.validate().context("invalid configuration")?;

    let timeout = Duration::from_secs(config.agent.request_timeout_secs);
    let service = HttpProvider::with_timeout(&config.provider, timeout)
        .context("failed to create completion client")?;
    let tools = build_registry(&config.tools).context("failed to register tools")?;

    Bot::new(bus, Arc::new(service), Arc::new(tools), config)
        .context("failed to render persona prompt")
}

/// Install the tracing subscriber. `RUST_LOG` wins when set.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("earlbot=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_chat_message() {
        let cli = Cli::parse_from(["earlbot", "chat", "-m", "help", "--logs"]);
        match cli.command {
            Commands::Chat { message, logs } => {
                assert_eq!(message.as_deref(), Some("help"));
                assert!(logs);
            }
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn test_parse_global_config() {
        let cli = Cli::parse_from(["earlbot", "gateway", "--config", "/tmp/earl.json"]);
        assert_eq!(cli.config.as_deref(), Some("/tmp/earl.json"));
        assert!(matches!(cli.command, Commands::Gateway { logs: false }));
    }

    #[test]
    fn test_build_bot_registers_tools_in_order() {
        let bot = build_bot(&Config::default(), Arc::new(MessageBus::new(4))).unwrap();
        assert_eq!(
            bot.tools().list_names(),
            vec!["Wikipedia", "Search", "requests", "Wolfram Alpha"]
        );
        assert_eq!(bot.model(), "gpt-3.5-turbo");
    }

    #[test]
    fn test_build_bot_rejects_invalid_config() {
        let mut config = Config::default();
        config.tools.enabled.push("calculator".into());
        assert!(build_bot(&config, Arc::new(MessageBus::new(4))).is_err());
    }
}
