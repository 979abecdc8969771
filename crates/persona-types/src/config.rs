//! Service configuration types.
//!
//! `ServiceConfig` mirrors `config.toml` in the data directory. Every field
//! has a default so an empty or missing file yields a runnable service.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Top-level configuration for the persona service.
#[derive(Debug, Default, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Language-model backend settings (any OpenAI-compatible endpoint).
#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Usually supplied through `OPENAI_API_KEY` rather than the file.
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Window size used when an agent record carries no explicit value.
    #[serde(default = "crate::agent::default_max_context_turns")]
    pub default_context_turns: u32,
    #[serde(default = "default_prompt_cache_ttl_secs")]
    pub prompt_cache_ttl_secs: u64,
    #[serde(default = "default_prompt_cache_capacity")]
    pub prompt_cache_capacity: usize,
}

fn default_prompt_cache_ttl_secs() -> u64 {
    300
}

fn default_prompt_cache_capacity() -> usize {
    1024
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_context_turns: crate::agent::default_max_context_turns(),
            prompt_cache_ttl_secs: default_prompt_cache_ttl_secs(),
            prompt_cache_capacity: default_prompt_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// Maximum number of jobs running at once.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// How long the simulated trainer takes per job.
    #[serde(default = "default_simulated_duration_ms")]
    pub simulated_duration_ms: u64,
    /// A `processing` job older than this at startup is re-queued.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

fn default_workers() -> usize {
    4
}

fn default_simulated_duration_ms() -> u64 {
    5000
}

fn default_stale_after_secs() -> u64 {
    900
}

fn default_shutdown_grace_secs() -> u64 {
    30
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            simulated_duration_ms: default_simulated_duration_ms(),
            stale_after_secs: default_stale_after_secs(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservabilityConfig {
    /// Export spans through the OpenTelemetry stdout exporter.
    #[serde(default)]
    pub otel: bool,
    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,
}
