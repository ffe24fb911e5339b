//! Configuration types for Parley.
//!
//! `ParleyConfig` represents the top-level `config.toml`. Every field has a
//! default so an empty or missing file yields a working local setup.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Parley service.
///
/// Loaded from `~/.parley/config.toml`, then overridden by environment
/// variables (see `parley_infra::config`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Turn orchestration and conversation cache policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Number of most recent messages mirrored in the conversation cache.
    #[serde(default = "default_cache_window")]
    pub cache_window: usize,

    /// Lifetime of a cache entry, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Upper bound on a single generator call, in seconds.
    #[serde(default = "default_generate_timeout_secs")]
    pub generate_timeout_secs: u64,

    /// Optional cap on the history handed to the generator.
    ///
    /// Unset means the full durable history is used. This is independent of
    /// `cache_window`.
    #[serde(default)]
    pub max_context_messages: Option<usize>,

    /// Run turns against the same session one at a time.
    #[serde(default = "default_true")]
    pub serialize_turns: bool,
}

fn default_cache_window() -> usize {
    20
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_generate_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl ChatConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            cache_window: default_cache_window(),
            cache_ttl_secs: default_cache_ttl_secs(),
            generate_timeout_secs: default_generate_timeout_secs(),
            max_context_messages: None,
            serialize_turns: true,
        }
    }
}

/// Response generator settings.
///
/// Without an `api_key` the deterministic local generator is used.
#[derive(Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key: None,
        }
    }
}

// Manual Debug so the API key never ends up in logs.
impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Conversation cache backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Valkey/Redis URL. Unset selects the in-process cache.
    #[serde(default)]
    pub redis_url: Option<String>,
}

/// Durable log location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URL. Unset means `{data_dir}/parley.db`.
    #[serde(default)]
    pub url: Option<String>,
}

/// REST API bind address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}
