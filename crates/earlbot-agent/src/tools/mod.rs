//! Tools available to the planner.

pub mod base;
pub mod registry;
pub mod requests;
pub mod search;
pub mod wikipedia;
pub mod wolfram;

use std::sync::Arc;

use earlbot_core::config::schema::ToolsConfig;
use earlbot_core::config::KNOWN_TOOL_IDS;
use earlbot_core::error::RegistryError;

pub use base::Tool;
pub use registry::ToolRegistry;
pub use requests::RequestsGetTool;
pub use search::SerpApiSearchTool;
pub use wikipedia::WikipediaTool;
pub use wolfram::WolframAlphaTool;

/// Build the registry from config.
///
/// Tools are registered in the fixed order of [`KNOWN_TOOL_IDS`], whatever
/// order `tools.enabled` lists them in. Unknown ids are skipped here;
/// `Config::validate` reports them.
pub fn build_registry(config: &ToolsConfig) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    for id in KNOWN_TOOL_IDS.iter().filter(|id| config.is_enabled(id)) {
        let tool: Arc<dyn Tool> = match *id {
            "wikipedia" => Arc::new(WikipediaTool::new()),
            "serpapi" => Arc::new(SerpApiSearchTool::new(&config.serpapi_api_key)),
            "requests" => Arc::new(RequestsGetTool::new(config.fetch_max_chars)),
            "wolfram-alpha" => Arc::new(WolframAlphaTool::new(&config.wolfram_app_id)),
            _ => continue,
        };
        registry.register(tool)?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_order() {
        let registry = build_registry(&ToolsConfig::default()).unwrap();
        assert_eq!(
            registry.list_names(),
            vec!["Wikipedia", "Search", "requests", "Wolfram Alpha"]
        );
    }

    #[test]
    fn test_enabled_subset_keeps_canonical_order() {
        let config = ToolsConfig {
            enabled: vec!["wolfram-alpha".into(), "wikipedia".into()],
            ..Default::default()
        };
        let registry = build_registry(&config).unwrap();
        assert_eq!(registry.list_names(), vec!["Wikipedia", "Wolfram Alpha"]);
    }

    #[test]
    fn test_nothing_enabled() {
        let config = ToolsConfig {
            enabled: vec![],
            ..Default::default()
        };
        assert!(build_registry(&config).unwrap().is_empty());
    }
}
