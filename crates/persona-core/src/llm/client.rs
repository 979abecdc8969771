//! LanguageModelClient trait definition.

use persona_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for language-model backends.
///
/// The engine treats the model as a black box: one request in, one reply
/// out. Implementations live in persona-infra (e.g., `OpenAiCompatibleClient`).
pub trait LanguageModelClient: Send + Sync {
    /// Backend name used in logs and metrics (e.g., "openai").
    fn name(&self) -> &str;

    /// Model used when a request does not name one.
    fn default_model(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
