//! Configuration schema.
//!
//! Hierarchy: `Config` → `ProviderConfig`, `PersonaConfig`, `AgentConfig`,
//! `ChannelsConfig`, `ToolsConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tool ids accepted in `tools.enabled`, in registration order.
pub const KNOWN_TOOL_IDS: &[&str] = &["wikipedia", "serpapi", "requests", "wolfram-alpha"];

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.earlbot/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub persona: PersonaConfig,
    pub agent: AgentConfig,
    pub channels: ChannelsConfig,
    pub tools: ToolsConfig,
}

impl Config {
    /// Check internal consistency of the loaded values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.memory_window == 0 {
            return Err(ConfigError::Invalid {
                field: "agent.memoryWindow",
                reason: "must be at least 1".into(),
            });
        }
        if self.agent.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "agent.requestTimeoutSecs",
                reason: "must be at least 1".into(),
            });
        }
        if let Some(unknown) = self
            .tools
            .enabled
            .iter()
            .find(|id| !KNOWN_TOOL_IDS.contains(&id.as_str()))
        {
            return Err(ConfigError::Invalid {
                field: "tools.enabled",
                reason: format!(
                    "unknown tool '{unknown}' (expected one of: {})",
                    KNOWN_TOOL_IDS.join(", ")
                ),
            });
        }
        Ok(())
    }

    /// [`validate`](Self::validate) plus the secrets the Discord gateway needs.
    pub fn validate_for_gateway(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.channels.discord.token.trim().is_empty() {
            return Err(ConfigError::Missing("channels.discord.token"));
        }
        if !self.provider.is_configured() {
            return Err(ConfigError::Missing("provider.apiKey"));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────

/// OpenAI-compatible completion endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for bearer authentication.
    pub api_key: String,
    /// Base URL; `/chat/completions` is appended.
    pub api_base: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.6,
            max_tokens: 1024,
        }
    }
}

impl ProviderConfig {
    /// Whether an API key is set.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

// ─────────────────────────────────────────────
// Persona
// ─────────────────────────────────────────────

/// Dynamic state injected into the persona preamble.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonaConfig {
    /// Total budget mentioned to the model, in dollars.
    pub budget: u64,
    /// What the founder is working on right now.
    pub current_task: String,
    /// Replacement preamble template. `None` uses the built-in one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            budget: 1000,
            current_task:
                "Attract our initial customers by creating a small yet profitable project."
                    .to_string(),
            template: None,
        }
    }
}

// ─────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    /// Maximum Thought/Action/Observation cycles per planner run.
    pub step_budget: usize,
    /// Conversation turns retained per session.
    pub memory_window: usize,
    /// Wall-clock limit for one skill invocation.
    pub request_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            step_budget: 15,
            memory_window: 20,
            request_timeout_secs: 120,
        }
    }
}

// ─────────────────────────────────────────────
// Channels
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelsConfig {
    pub discord: DiscordConfig,
}

/// Discord bot settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscordConfig {
    /// Bot token.
    pub token: String,
    /// User ids allowed to talk to the bot. Empty allows everyone.
    pub allowed_users: Vec<String>,
}

impl DiscordConfig {
    pub fn is_allowed(&self, user_id: &str) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.iter().any(|u| u == user_id)
    }
}

// ─────────────────────────────────────────────
// Tools
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolsConfig {
    /// Tool ids to register (see [`KNOWN_TOOL_IDS`]).
    pub enabled: Vec<String>,
    /// SerpAPI key for the `Search` tool.
    pub serpapi_api_key: String,
    /// Wolfram|Alpha app id.
    pub wolfram_app_id: String,
    /// Maximum characters returned by the `requests` tool.
    pub fetch_max_chars: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: KNOWN_TOOL_IDS.iter().map(|s| s.to_string()).collect(),
            serpapi_api_key: String::new(),
            wolfram_app_id: String::new(),
            fetch_max_chars: 8000,
        }
    }
}

impl ToolsConfig {
    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled.iter().any(|e| e == id)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.provider.model, "gpt-3.5-turbo");
        assert_eq!(config.provider.temperature, 0.6);
        assert_eq!(config.persona.budget, 1000);
        assert_eq!(config.agent.step_budget, 15);
        assert_eq!(config.agent.memory_window, 20);
        assert_eq!(config.tools.enabled.len(), 4);
        assert!(config.persona.template.is_none());
    }

    #[test]
    fn test_deserialize_partial_camel_case() {
        let json = r#"{
            "provider": { "apiKey": "sk-1", "maxTokens": 256 },
            "agent": { "stepBudget": 3 },
            "channels": { "discord": { "token": "t", "allowedUsers": ["42"] } }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.provider.api_key, "sk-1");
        assert_eq!(config.provider.max_tokens, 256);
        assert_eq!(config.provider.model, "gpt-3.5-turbo");
        assert_eq!(config.agent.step_budget, 3);
        assert_eq!(config.agent.memory_window, 20);
        assert_eq!(config.channels.discord.allowed_users, vec!["42"]);
    }

    #[test]
    fn test_serialize_uses_camel_case() {
        let value = serde_json::to_value(Config::default()).unwrap();
        assert!(value["agent"].get("memoryWindow").is_some());
        assert!(value["tools"].get("fetchMaxChars").is_some());
        assert!(value["persona"].get("currentTask").is_some());
        assert!(value["persona"].get("template").is_none());
    }

    #[test]
    fn test_validate_default_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_memory_window() {
        let mut config = Config::default();
        config.agent.memory_window = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "agent.memoryWindow", .. })
        ));
    }

    #[test]
    fn test_validate_unknown_tool() {
        let mut config = Config::default();
        config.tools.enabled.push("calculator".into());
        match config.validate() {
            Err(ConfigError::Invalid { field, reason }) => {
                assert_eq!(field, "tools.enabled");
                assert!(reason.contains("calculator"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_validate_for_gateway_requires_secrets() {
        let mut config = Config::default();
        assert_eq!(
            config.validate_for_gateway(),
            Err(ConfigError::Missing("channels.discord.token"))
        );

        config.channels.discord.token = "discord-token".into();
        assert_eq!(
            config.validate_for_gateway(),
            Err(ConfigError::Missing("provider.apiKey"))
        );

        config.provider.api_key = "sk-test".into();
        assert!(config.validate_for_gateway().is_ok());
    }

    #[test]
    fn test_discord_allow_list() {
        let mut discord = DiscordConfig::default();
        assert!(discord.is_allowed("anyone"));
        discord.allowed_users = vec!["1".into()];
        assert!(discord.is_allowed("1"));
        assert!(!discord.is_allowed("2"));
    }

    #[test]
    fn test_tools_is_enabled() {
        let mut tools = ToolsConfig::default();
        assert!(tools.is_enabled("serpapi"));
        tools.enabled = vec!["wikipedia".into()];
        assert!(!tools.is_enabled("serpapi"));
    }
}
