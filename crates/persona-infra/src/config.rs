//! Service configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.persona/` by default) and
//! deserializes it into [`ServiceConfig`], falling back to defaults when the
//! file is missing or malformed. A few environment variables override the
//! file so keys never have to be written to disk.

use std::path::{Path, PathBuf};

use persona_types::config::ServiceConfig;
use secrecy::SecretString;

/// Data directory override.
pub const DATA_DIR_ENV: &str = "PERSONA_DATA_DIR";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "PERSONA_LLM_BASE_URL";
pub const MODEL_ENV: &str = "PERSONA_LLM_MODEL";

/// `$PERSONA_DATA_DIR`, else `~/.persona`, else `./.persona`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".persona")
}

/// Load `{data_dir}/config.toml` and apply environment overrides.
pub async fn load_config(data_dir: &Path) -> ServiceConfig {
    let mut config = load_config_file(data_dir).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Parse `{data_dir}/config.toml`.
///
/// - Missing file: [`ServiceConfig::default()`].
/// - Unreadable or malformed file: a warning, then the defaults.
pub async fn load_config_file(data_dir: &Path) -> ServiceConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
    };

    match toml::from_str::<ServiceConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ServiceConfig::default()
        }
    }
}

/// Overlay non-empty environment values onto the `[llm]` section.
pub fn apply_env_overrides(config: &mut ServiceConfig, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = lookup(API_KEY_ENV) {
        config.llm.api_key = Some(SecretString::from(key));
    }
    if let Some(url) = lookup(BASE_URL_ENV) {
        config.llm.base_url = url;
    }
    if let Some(model) = lookup(MODEL_ENV) {
        config.llm.model = model;
    }
}
