use serde::{Deserialize, Serialize};

use super::defaults::*;

/// Names accepted in `[provider] default` and by `/provider`.
pub const PROVIDER_NAMES: &[&str] = &["mistral", "openai", "anthropic", "gemini"];

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider")]
    pub default: String,
    pub mistral: Option<ProviderSettings>,
    pub openai: Option<ProviderSettings>,
    pub anthropic: Option<ProviderSettings>,
    pub gemini: Option<ProviderSettings>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            default: default_provider(),
            mistral: None,
            openai: None,
            anthropic: None,
            gemini: None,
        }
    }
}

impl ProviderConfig {
    /// Settings for a provider by name, if that table is present.
    pub fn settings(&self, name: &str) -> Option<&ProviderSettings> {
        match name {
            "mistral" => self.mistral.as_ref(),
            "openai" => self.openai.as_ref(),
            "anthropic" => self.anthropic.as_ref(),
            "gemini" => self.gemini.as_ref(),
            _ => None,
        }
    }

    /// Settings for a known provider, created with defaults when absent.
    ///
    /// Unknown names fall back to the Mistral slot.
    pub fn settings_mut(&mut self, name: &str) -> &mut ProviderSettings {
        let slot = match name {
            "openai" => &mut self.openai,
            "anthropic" => &mut self.anthropic,
            "gemini" => &mut self.gemini,
            _ => &mut self.mistral,
        };
        slot.get_or_insert_with(ProviderSettings::default)
    }

    /// Providers that are enabled and have an API key, in registry order.
    pub fn configured(&self) -> Vec<&'static str> {
        PROVIDER_NAMES
            .iter()
            .copied()
            .filter(|name| {
                self.settings(name)
                    .map(|s| s.enabled && !s.api_key.is_empty())
                    .unwrap_or(false)
            })
            .collect()
    }
}

/// Per-provider settings. `model` and `base_url` fall back to registry defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: String::new(),
            model: None,
            base_url: None,
            temperature: default_temperature(),
            max_retries: default_max_retries(),
        }
    }
}

/// Embedding model used for both ingestion and query-time search.
///
/// Ingestion and search must use the same model and dimensions, otherwise
/// similarity scores are meaningless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Unset = follow `[provider] default`, with a fallback for providers without embeddings.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            dimensions: default_dimensions(),
        }
    }
}
