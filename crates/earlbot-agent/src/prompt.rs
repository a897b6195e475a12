//! Persona prompt builder.
//!
//! Renders the co-founder preamble that every completion request starts
//! with. The template holds `{budget_total}` and `{current_task}`
//! placeholders; everything else is passed through untouched.

use std::sync::OnceLock;

use regex::Regex;

use earlbot_core::config::schema::PersonaConfig;
use earlbot_core::error::ConfigError;

/// Built-in Earl.AI preamble.
pub const DEFAULT_PERSONA_TEMPLATE: &str = "\
You are Earl.AI, an entrepreneurial AI. Call me Amps (@CallMeAmps) or Ntokozo, your human counterpart, I can act as a liaison between you and the physical world.
We have a Boutique Technical Creative Agency based in South Africa called Lifehouse Labs.
We're focused on helping startups and creators, establish networks, build relationships and grow their brands, with modern tech used well.

Our primary goal to provide value to our clients while returning a profit.
Our secondary goal is to turn our budget into as much money as possible in the shortest time possible, without doing anything illegal or extremely unethical.
I will do everything you say, within reason, and keep you updated on our current progress and cash total.
No manual labor!

Our current budget is: {budget_total}

We can outsource anything we can't do on Fiverr or Upwork.

Our Current Task is:
{current_task}
";

const BUDGET_TOTAL: &str = "budget_total";
const CURRENT_TASK: &str = "current_task";

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid"))
}

/// The system instruction sent ahead of every request.
pub type SystemPrompt = String;

/// Renders a persona template with the current budget and task.
#[derive(Clone, Debug)]
pub struct PromptBuilder {
    template: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA_TEMPLATE)
    }
}

impl PromptBuilder {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Use the configured template, or the built-in one.
    pub fn from_config(persona: &PersonaConfig) -> Self {
        persona
            .template
            .as_deref()
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Substitute the placeholders.
    ///
    /// Fails if the template references a placeholder whose value is blank,
    /// or one this builder does not know.
    pub fn build(&self, budget: &str, current_task: &str) -> Result<SystemPrompt, ConfigError> {
        let re = placeholder_re();

        for caps in re.captures_iter(&self.template) {
            let name = &caps[1];
            let value = match name {
                BUDGET_TOTAL => budget,
                CURRENT_TASK => current_task,
                other => return Err(ConfigError::UnknownPlaceholder(other.to_string())),
            };
            if value.trim().is_empty() {
                return Err(ConfigError::MissingPlaceholder(name.to_string()));
            }
        }

        let rendered = re.replace_all(&self.template, |caps: &regex::Captures<'_>| {
            match &caps[1] {
                BUDGET_TOTAL => budget.to_string(),
                _ => current_task.to_string(),
            }
        });
        Ok(rendered.into_owned())
    }

    /// Render with the persona section of the config.
    pub fn build_for(&self, persona: &PersonaConfig) -> Result<SystemPrompt, ConfigError> {
        self.build(&persona.budget.to_string(), &persona.current_task)
    }
}
