//! Config loader — reads `~/.earlbot/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.earlbot/config.json`
//! 3. Well-known service variables (`OPENAI_API_KEY`, `DISCORD_TOKEN`,
//!    `SERPAPI_API_KEY`, `WOLFRAM_ALPHA_APPID`)
//! 4. `EARLBOT_<SECTION>__<FIELD>` variables (override everything above)

use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Read a non-empty env var.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Read and parse an env var, ignoring (with a warning) values that don't parse.
fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    let raw = env_value(name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = name, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `EARLBOT_<SECTION>__<FIELD>` (double underscore as delimiter).
fn apply_env_overrides(mut config: Config) -> Config {
    // Service-standard names first, so EARLBOT_* wins when both are set.
    if let Some(val) = env_value("OPENAI_API_KEY") {
        config.provider.api_key = val;
    }
    if let Some(val) = env_value("DISCORD_TOKEN") {
        config.channels.discord.token = val;
    }
    if let Some(val) = env_value("SERPAPI_API_KEY") {
        config.tools.serpapi_api_key = val;
    }
    if let Some(val) = env_value("WOLFRAM_ALPHA_APPID") {
        config.tools.wolfram_app_id = val;
    }

    // Provider
    if let Some(val) = env_value("EARLBOT_PROVIDER__API_KEY") {
        config.provider.api_key = val;
    }
    if let Some(val) = env_value("EARLBOT_PROVIDER__API_BASE") {
        config.provider.api_base = val;
    }
    if let Some(val) = env_value("EARLBOT_PROVIDER__MODEL") {
        config.provider.model = val;
    }
    if let Some(t) = env_parsed("EARLBOT_PROVIDER__TEMPERATURE") {
        config.provider.temperature = t;
    }

    // Persona
    if let Some(b) = env_parsed("EARLBOT_PERSONA__BUDGET") {
        config.persona.budget = b;
    }
    if let Some(val) = env_value("EARLBOT_PERSONA__CURRENT_TASK") {
        config.persona.current_task = val;
    }

    // Agent
    if let Some(n) = env_parsed("EARLBOT_AGENT__STEP_BUDGET") {
        config.agent.step_budget = n;
    }
    if let Some(n) = env_parsed("EARLBOT_AGENT__MEMORY_WINDOW") {
        config.agent.memory_window = n;
    }

    // Channels
    if let Some(val) = env_value("EARLBOT_CHANNELS__DISCORD__TOKEN") {
        config.channels.discord.token = val;
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
