//! Provider registry: default models and endpoints, and construction from config.

use crate::anthropic::AnthropicProvider;
use crate::embeddings::{GeminiEmbedder, OpenAiEmbedder};
use crate::gemini::GeminiProvider;
use crate::openai::OpenAiProvider;
use crate::retry::RetryingProvider;
use std::sync::Arc;
use tracing::info;
use unibot_core::{
    config::{Config, ProviderConfig, ProviderSettings},
    error::UnibotError,
    traits::{Embedder, Provider},
};

/// Static description of a supported provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderSpec {
    pub name: &'static str,
    pub display_name: &'static str,
    pub base_url: &'static str,
    pub chat_model: &'static str,
    /// `None` when the provider has no embeddings API.
    pub embedding_model: Option<&'static str>,
}

pub const SUPPORTED_PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "mistral",
        display_name: "Mistral AI",
        base_url: "https://api.mistral.ai/v1",
        chat_model: "mistral-large-latest",
        embedding_model: Some("mistral-embed"),
    },
    ProviderSpec {
        name: "openai",
        display_name: "OpenAI",
        base_url: "https://api.openai.com/v1",
        chat_model: "gpt-4o",
        embedding_model: Some("text-embedding-3-small"),
    },
    ProviderSpec {
        name: "anthropic",
        display_name: "Anthropic",
        base_url: "https://api.anthropic.com/v1",
        chat_model: "claude-sonnet-4-20250514",
        embedding_model: None,
    },
    ProviderSpec {
        name: "gemini",
        display_name: "Google Gemini",
        base_url: "https://generativelanguage.googleapis.com/v1beta",
        chat_model: "gemini-2.0-flash",
        embedding_model: Some("gemini-embedding-001"),
    },
];

/// Look up a provider by name (case-insensitive).
pub fn spec(name: &str) -> Option<&'static ProviderSpec> {
    let name = name.trim().to_lowercase();
    SUPPORTED_PROVIDERS.iter().find(|s| s.name == name)
}

/// Settings for `name`, rejecting disabled or keyless providers.
fn usable_settings<'a>(
    name: &str,
    providers: &'a ProviderConfig,
) -> Result<&'a ProviderSettings, UnibotError> {
    let settings = providers
        .settings(name)
        .ok_or_else(|| UnibotError::Config(format!("provider '{name}' is not configured")))?;
    if !settings.enabled {
        return Err(UnibotError::Config(format!("provider '{name}' is disabled")));
    }
    if settings.api_key.is_empty() {
        return Err(UnibotError::Config(format!(
            "provider '{name}' has no API key"
        )));
    }
    Ok(settings)
}

/// Build a chat provider by name, wrapped with retries for transient failures.
pub fn build_provider(
    name: &str,
    providers: &ProviderConfig,
) -> Result<Arc<dyn Provider>, UnibotError> {
    let spec = spec(name)
        .ok_or_else(|| UnibotError::Config(format!("unsupported provider: {name}")))?;
    let settings = usable_settings(spec.name, providers)?;

    let base_url = settings
        .base_url
        .clone()
        .unwrap_or_else(|| spec.base_url.to_string());
    let model = settings
        .model
        .clone()
        .unwrap_or_else(|| spec.chat_model.to_string());
    let api_key = settings.api_key.clone();
    let temperature = settings.temperature;

    let inner: Box<dyn Provider> = match spec.name {
        "anthropic" => Box::new(AnthropicProvider::from_config(
            base_url,
            api_key,
            model,
            temperature,
        )),
        "gemini" => Box::new(GeminiProvider::from_config(
            base_url,
            api_key,
            model,
            temperature,
        )),
        other => Box::new(OpenAiProvider::from_config(
            other,
            base_url,
            api_key,
            model,
            temperature,
        )),
    };

    info!("Provider ready: {} ({})", spec.display_name, inner.model());
    Ok(Arc::new(RetryingProvider::new(inner, settings.max_retries)))
}

/// Pick the provider used for embeddings.
///
/// An explicit `[embedding] provider` wins. Otherwise the chat default is used,
/// except Anthropic, which falls back to Mistral, then OpenAI.
pub fn resolve_embedding_provider(config: &Config) -> Result<&'static ProviderSpec, UnibotError> {
    if let Some(name) = config.embedding.provider.as_deref() {
        let spec = spec(name)
            .ok_or_else(|| UnibotError::Config(format!("unsupported provider: {name}")))?;
        if spec.embedding_model.is_none() {
            return Err(UnibotError::Config(format!(
                "{} does not offer embeddings",
                spec.display_name
            )));
        }
        return Ok(spec);
    }

    let default = spec(&config.provider.default).ok_or_else(|| {
        UnibotError::Config(format!(
            "unsupported provider: {}",
            config.provider.default
        ))
    })?;
    if default.embedding_model.is_some() {
        return Ok(default);
    }

    let configured = config.provider.configured();
    ["mistral", "openai"]
        .iter()
        .find(|name| configured.contains(name))
        .and_then(|name| spec(name))
        .ok_or_else(|| {
            UnibotError::Config(
                "Cannot use Anthropic without embeddings from another provider".into(),
            )
        })
}

/// Build the embedder used for ingestion and query-time retrieval.
pub fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>, UnibotError> {
    let spec = resolve_embedding_provider(config)?;
    let settings = usable_settings(spec.name, &config.provider)?;

    let base_url = settings
        .base_url
        .clone()
        .unwrap_or_else(|| spec.base_url.to_string());
    let model = config
        .embedding
        .model
        .clone()
        .or_else(|| spec.embedding_model.map(str::to_string))
        .unwrap_or_default();
    let dimensions = config.embedding.dimensions;

    info!("Embeddings: {} ({model}, {dimensions} dims)", spec.display_name);

    let embedder: Arc<dyn Embedder> = match spec.name {
        "gemini" => Arc::new(GeminiEmbedder::from_config(
            base_url,
            settings.api_key.clone(),
            model,
            dimensions,
            settings.max_retries,
        )),
        other => Arc::new(OpenAiEmbedder::from_config(
            other,
            base_url,
            settings.api_key.clone(),
            model,
            dimensions,
            settings.max_retries,
        )),
    };
    Ok(embedder)
}
