//! `earlbot onboard` — write the default configuration file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use earlbot_core::config::{get_config_path, save_config, Config};
use earlbot_core::utils::get_data_path;

pub fn run(config_path: Option<PathBuf>) -> Result<()> {
    println!();
    println!("{}", "Earlbot Setup".cyan().bold());
    println!();

    let path = config_path.unwrap_or_else(get_config_path);
    if write_default_config(&path)? {
        println!("  {} created config at {}", "✓".green(), path.display());
    } else {
        println!("  {} config already exists at {}", "✓".green(), path.display());
    }

    let history_dir = get_data_path().join("history");
    std::fs::create_dir_all(&history_dir)
        .with_context(|| format!("failed to create {}", history_dir.display()))?;

    println!();
    println!("  Next steps:");
    println!("    1. Put your OpenAI key in {} or OPENAI_API_KEY", path.display());
    println!("    2. Add the Discord bot token (or set DISCORD_TOKEN)");
    println!("    3. Run `earlbot chat` to try it locally, `earlbot gateway` to go live");
    println!();

    Ok(())
}

/// Write the default config unless a file already exists. Returns whether
/// a file was written.
fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}
