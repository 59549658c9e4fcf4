use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ollama,
    External,
    /// Forward compatibility: unrecognized provider types parse but never
    /// match a supported transport.
    #[serde(other)]
    Unknown,
}

/// One model provider entry from `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    pub base_url: String,
    #[serde(default)]
    pub chat_model: Option<String>,
    #[serde(default)]
    pub agent_model: Option<String>,
    #[serde(default)]
    pub image_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Provider {
    /// True when any of this provider's model slots names `model_name`.
    #[must_use]
    pub fn serves_model(&self, model_name: &str) -> bool {
        [&self.chat_model, &self.agent_model, &self.image_model]
            .into_iter()
            .any(|slot| slot.as_deref() == Some(model_name))
    }
}

/// Root document of `config.json`. Missing fields fall back to defaults so
/// partial configs stay loadable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_providers")]
    pub providers: Vec<Provider>,
    #[serde(default = "default_chat_model")]
    pub default_chat_model: String,
    #[serde(default = "default_agent_model")]
    pub default_agent_model: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            default_chat_model: default_chat_model(),
            default_agent_model: default_agent_model(),
        }
    }
}

impl AgentConfig {
    /// Resolves a model name to the first enabled provider serving it.
    ///
    /// Linear scan by design: provider lists are small and ordered by
    /// operator preference.
    #[must_use]
    pub fn get_provider(&self, model_name: &str) -> Option<&Provider> {
        self.providers
            .iter()
            .filter(|provider| provider.enabled)
            .find(|provider| provider.serves_model(model_name))
    }
}

fn default_chat_model() -> String {
    "deepseek-r1:7b".to_string()
}

fn default_agent_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_providers() -> Vec<Provider> {
    vec![Provider {
        name: "Ollama Local".to_string(),
        enabled: true,
        kind: ProviderKind::Ollama,
        base_url: "http://localhost:11434".to_string(),
        chat_model: Some(default_chat_model()),
        agent_model: Some(default_agent_model()),
        image_model: Some("llava-phi3:latest".to_string()),
        api_key: None,
    }]
}
