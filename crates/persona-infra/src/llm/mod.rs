//! Language-model client implementations.
//!
//! Contains concrete implementations of the [`LanguageModelClient`] trait
//! defined in `persona-core`, plus [`create_client`] which builds the
//! configured client.
//!
//! [`LanguageModelClient`]: persona_core::llm::client::LanguageModelClient

pub mod openai_compat;

use persona_core::llm::box_client::BoxModelClient;
use persona_types::config::LlmConfig;
use persona_types::llm::LlmError;

use self::openai_compat::OpenAiCompatibleClient;

/// Build the model client described by `[llm]`.
///
/// # Errors
///
/// Returns `LlmError::AuthenticationFailed` when no API key is configured.
pub fn create_client(config: &LlmConfig) -> Result<BoxModelClient, LlmError> {
    let api_key = config
        .api_key
        .as_ref()
        .ok_or(LlmError::AuthenticationFailed)?;
    let client = OpenAiCompatibleClient::new(
        api_key,
        &config.base_url,
        &config.model,
        std::time::Duration::from_secs(config.request_timeout_secs),
    );
    Ok(BoxModelClient::new(client))
}
