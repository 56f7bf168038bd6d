mod channels;
mod defaults;
mod providers;


pub use channels::*;
pub use providers::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::UnibotError;
use defaults::*;

/// Top-level unibot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for the daily rolling log file. Unset = stdout only.
    #[serde(default)]
    pub log_dir: Option<String>,
    /// Address shown on venue cards when a location has none.
    #[serde(default = "default_address")]
    pub default_address: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            log_dir: None,
            default_address: default_address(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// When true, only senders listed in the channel's `allowed_users` get answers.
    #[serde(default)]
    pub enabled: bool,
    /// Message sent to unauthorized users.
    #[serde(default = "default_deny_message")]
    pub deny_message: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            deny_message: default_deny_message(),
        }
    }
}

/// Postgres connection settings. The database must have the `vector` extension available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
        }
    }
}

/// Supabase project settings, used for the handbook storage bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub service_role_key: String,
    #[serde(default = "default_handbook_bucket")]
    pub handbook_bucket: String,
    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_secs: u64,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_role_key: String::new(),
            handbook_bucket: default_handbook_bucket(),
            signed_url_ttl_secs: default_signed_url_ttl(),
        }
    }
}

impl SupabaseConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.service_role_key.is_empty()
    }
}

/// How many documents each retrieval chain pulls from the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_general_k")]
    pub general_k: i64,
    /// k for the location, locker, servery and faq chains.
    #[serde(default = "default_scoped_k")]
    pub scoped_k: i64,
    #[serde(default = "default_handbook_k")]
    pub handbook_k: i64,
    /// Minimum cosine similarity for the general chain.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            general_k: default_general_k(),
            scoped_k: default_scoped_k(),
            handbook_k: default_handbook_k(),
            score_threshold: default_score_threshold(),
        }
    }
}

/// Query routing switches and list limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Ask the LLM to pick a handler before falling back to keyword rules.
    #[serde(default = "default_true")]
    pub llm_classification: bool,
    /// Reject clearly off-topic questions before they reach the LLM.
    #[serde(default)]
    pub content_filter: bool,
    /// Maximum buttons in a `/find` result keyboard.
    #[serde(default = "default_max_locations")]
    pub max_locations: usize,
    /// Maximum buttons when a free-text feature search matches.
    #[serde(default = "default_max_feature_matches")]
    pub max_feature_matches: usize,
    #[serde(default = "default_max_handbooks")]
    pub max_handbooks: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            llm_classification: true,
            content_filter: false,
            max_locations: default_max_locations(),
            max_feature_matches: default_max_feature_matches(),
            max_handbooks: default_max_handbooks(),
        }
    }
}

/// Vector store population settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_handbook_batch_size")]
    pub handbook_batch_size: usize,
    /// Paragraph chunks shorter than this are dropped when splitting handbooks.
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            batch_size: default_batch_size(),
            handbook_batch_size: default_handbook_batch_size(),
            min_chunk_chars: default_min_chunk_chars(),
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file and apply environment overrides.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, UnibotError> {
    let path = Path::new(path);
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|e| {
            UnibotError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| UnibotError::Config(format!("failed to parse config: {}", e)))?
    } else {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Overlay secrets from the environment. Non-empty variables win over file values.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(token) = get("TELEGRAM_TOKEN").or_else(|| get("TELEGRAM_BOT_TOKEN")) {
        let tg = config
            .channel
            .telegram
            .get_or_insert_with(TelegramConfig::default);
        tg.bot_token = token;
        tg.enabled = true;
    }

    for (name, var) in [
        ("mistral", "MISTRAL_API_KEY"),
        ("openai", "OPENAI_API_KEY"),
        ("anthropic", "ANTHROPIC_API_KEY"),
        ("gemini", "GEMINI_API_KEY"),
    ] {
        if let Some(key) = get(var) {
            config.provider.settings_mut(name).api_key = key;
        }
    }

    if let Some(url) = get("DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(url) = get("SUPABASE_URL") {
        config.supabase.url = url;
    }
    if let Some(key) = get("SUPABASE_SERVICE_ROLE_KEY") {
        config.supabase.service_role_key = key;
    }
    if let Some(provider) = get("UNIBOT_PROVIDER") {
        config.provider.default = provider;
    }
}
