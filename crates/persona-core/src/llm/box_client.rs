//! BoxModelClient -- object-safe dynamic dispatch wrapper for LanguageModelClient.
//!
//! 1. Define an object-safe `LanguageModelClientDyn` trait with boxed futures
//! 2. Blanket-impl `LanguageModelClientDyn` for all `T: LanguageModelClient`
//! 3. `BoxModelClient` wraps `Box<dyn LanguageModelClientDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use persona_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::client::LanguageModelClient;

/// Object-safe version of [`LanguageModelClient`] with boxed futures.
pub trait LanguageModelClientDyn: Send + Sync {
    fn name(&self) -> &str;

    fn default_model(&self) -> &str;

    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;
}

impl<T: LanguageModelClient> LanguageModelClientDyn for T {
    fn name(&self) -> &str {
        LanguageModelClient::name(self)
    }

    fn default_model(&self) -> &str {
        LanguageModelClient::default_model(self)
    }

    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.complete(request))
    }
}

/// Type-erased model client for runtime backend selection.
///
/// Since `LanguageModelClient` uses RPITIT, it cannot be used as a trait
/// object directly. `BoxModelClient` provides equivalent methods that
/// delegate to the inner `LanguageModelClientDyn` trait object.
pub struct BoxModelClient {
    inner: Box<dyn LanguageModelClientDyn + Send + Sync>,
}

impl BoxModelClient {
    pub fn new<T: LanguageModelClient + 'static>(client: T) -> Self {
        Self {
            inner: Box::new(client),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn default_model(&self) -> &str {
        self.inner.default_model()
    }

    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        self.inner.complete_boxed(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_types::llm::{Message, Usage};

    struct EchoClient;

    impl LanguageModelClient for EchoClient {
        fn name(&self) -> &str {
            "echo"
        }

        fn default_model(&self) -> &str {
            "echo-1"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            let last = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(CompletionResponse {
                id: "resp-1".to_string(),
                content: last,
                model: request.model.clone().unwrap_or_else(|| "echo-1".to_string()),
                usage: Some(Usage {
                    input_tokens: 1,
                    output_tokens: 1,
                }),
            })
        }
    }

    #[tokio::test]
    async fn test_box_client_delegates() {
        let client = BoxModelClient::new(EchoClient);
        assert_eq!(client.name(), "echo");
        assert_eq!(client.default_model(), "echo-1");

        let request = CompletionRequest {
            model: None,
            messages: vec![Message::system("sys"), Message::user("ping")],
            max_tokens: 10,
            temperature: 0.0,
        };
        let resp = client.complete(&request).await.unwrap();
        assert_eq!(resp.content, "ping");
        assert_eq!(resp.tokens_used(), Some(2));
    }
}
