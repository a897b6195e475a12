//! `earlbot status` — configuration and key status.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use earlbot_core::config::{get_config_path, load_config, KNOWN_TOOL_IDS};

use crate::helpers::key_status;

pub fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref());
    let path = config_path.unwrap_or_else(get_config_path);

    println!();
    println!("{}", "Earlbot Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        path.display(),
        if path.exists() {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".red().to_string()
        }
    );
    println!("  {:<18} {}", "Model:".bold(), config.provider.model);
    println!("  {:<18} {}", "API base:".bold(), config.provider.api_base);
    println!("  {:<18} {}", "API key:".bold(), key_status(&config.provider.api_key));
    println!(
        "  {:<18} {}",
        "Discord token:".bold(),
        key_status(&config.channels.discord.token)
    );

    println!();
    println!(
        "  {:<18} ${} | {}",
        "Persona:".bold(),
        config.persona.budget,
        config.persona.current_task.dimmed()
    );
    println!(
        "  {:<18} steps: {} | memory: {} turns | timeout: {}s",
        "Agent:".bold(),
        config.agent.step_budget,
        config.agent.memory_window,
        config.agent.request_timeout_secs
    );

    println!();
    println!("  {}", "Tools:".bold());
    for id in KNOWN_TOOL_IDS {
        let status = if !config.tools.is_enabled(id) {
            format!("{}", "· disabled".dimmed())
        } else {
            match *id {
                "serpapi" => key_status(&config.tools.serpapi_api_key),
                "wolfram-alpha" => key_status(&config.tools.wolfram_app_id),
                _ => format!("{}", "✓ enabled".green()),
            }
        };
        println!("    {:<20} {}", id, status);
    }

    if let Err(e) = config.validate() {
        println!();
        println!("  {} {e}", "✗".red());
    }

    println!();
    Ok(())
}
