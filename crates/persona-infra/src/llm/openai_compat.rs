//! OpenAI-compatible chat completion client.
//!
//! Any endpoint that speaks the `/chat/completions` protocol works through
//! the configured base URL. Uses [`async_openai`] for the request/response
//! types and transport.

use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use secrecy::{ExposeSecret, SecretString};

use persona_core::llm::client::LanguageModelClient;
use persona_types::llm::{CompletionRequest, CompletionResponse, LlmError, Message, MessageRole, Usage};

/// Client for an OpenAI-compatible API.
///
/// # API Key Security
///
/// Does NOT derive Debug: the `async_openai::Client` holds the API key.
pub struct OpenAiCompatibleClient {
    client: Client<OpenAIConfig>,
    name: String,
    model: String,
    timeout: Duration,
}

impl OpenAiCompatibleClient {
    pub fn new(api_key: &SecretString, base_url: &str, model: &str, timeout: Duration) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.expose_secret())
            .with_api_base(base_url.trim_end_matches('/'));

        Self {
            client: Client::with_config(config),
            name: provider_name(base_url),
            model: model.to_string(),
            timeout,
        }
    }

    fn build_request(&self, request: &CompletionRequest) -> CreateChatCompletionRequest {
        let messages = request.messages.iter().map(to_openai_message).collect();

        let model = request
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.model)
            .to_string();

        CreateChatCompletionRequest {
            model,
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: Some(request.temperature as f32),
            ..Default::default()
        }
    }
}

/// Short backend name for logs: `openai` for the official API, otherwise the
/// endpoint host.
fn provider_name(base_url: &str) -> String {
    let host = base_url
        .split("://")
        .nth(1)
        .unwrap_or(base_url)
        .split(['/', ':'])
        .next()
        .unwrap_or_default();
    match host {
        "api.openai.com" | "" => "openai".to_string(),
        other => other.to_string(),
    }
}

fn to_openai_message(msg: &Message) -> ChatCompletionRequestMessage {
    match msg.role {
        MessageRole::System => {
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(msg.content.clone()),
                name: None,
            })
        }
        MessageRole::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
            name: None,
        }),
        MessageRole::Assistant => {
            #[allow(deprecated)]
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                    msg.content.clone(),
                )),
                refusal: None,
                name: None,
                audio: None,
                tool_calls: None,
                function_call: None,
            })
        }
    }
}

impl LanguageModelClient for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let oai_request = self.build_request(request);

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(oai_request))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout.as_secs()))?
            .map_err(map_openai_error)?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| LlmError::Deserialization("response has no message content".to_string()))?;

        let usage = response.usage.map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        Ok(CompletionResponse {
            id: response.id,
            content,
            model: response.model,
            usage,
        })
    }
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "invalid_api_key"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
                || api_err.message.contains("Invalid API key")
            {
                LlmError::AuthenticationFailed
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                LlmError::RateLimited {
                    retry_after_ms: None,
                }
            } else if code == "context_length_exceeded"
                || api_err.message.contains("maximum context length")
            {
                LlmError::ContextLengthExceeded {
                    max: 0,
                    requested: 0,
                }
            } else if code == "server_error" || error_type == "overloaded_error" {
                LlmError::Overloaded(api_err.message.clone())
            } else if error_type == "invalid_request_error" {
                LlmError::InvalidRequest(api_err.message.clone())
            } else {
                LlmError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(401) | Some(403) => LlmError::AuthenticationFailed,
            Some(429) => LlmError::RateLimited {
                retry_after_ms: None,
            },
            Some(500..=599) => LlmError::Overloaded(err.to_string()),
            Some(_) => LlmError::Provider {
                message: err.to_string(),
            },
            None => LlmError::Transport(err.to_string()),
        },
        OpenAIError::JSONDeserialize(_, content) => {
            LlmError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::error::{ApiError, OpenAIError};

    fn client() -> OpenAiCompatibleClient {
        OpenAiCompatibleClient::new(
            &SecretString::from("sk-test".to_string()),
            "https://api.openai.com/v1",
            "gpt-3.5-turbo",
            Duration::from_secs(30),
        )
    }

    fn api_error(message: &str, error_type: Option<&str>, code: Option<&str>) -> OpenAIError {
        OpenAIError::ApiError(ApiError {
            message: message.to_string(),
            r#type: error_type.map(str::to_string),
            param: None,
            code: code.map(str::to_string),
        })
    }

    #[test]
    fn test_provider_name_from_base_url() {
        assert_eq!(provider_name("https://api.openai.com/v1"), "openai");
        assert_eq!(provider_name("http://localhost:11434/v1"), "localhost");
        assert_eq!(
            provider_name("https://api.mistral.ai/v1"),
            "api.mistral.ai"
        );
    }

    #[test]
    fn test_build_request_keeps_message_order() {
        let request = CompletionRequest {
            model: None,
            messages: vec![
                Message::system("You are Luna"),
                Message::user("Hello"),
                Message::assistant("Hi there!"),
                Message::user("How are you?"),
            ],
            max_tokens: 1000,
            temperature: 0.7,
        };

        let oai_req = client().build_request(&request);
        assert_eq!(oai_req.model, "gpt-3.5-turbo");
        assert_eq!(oai_req.messages.len(), 4);
        assert!(matches!(
            oai_req.messages[0],
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(
            oai_req.messages[3],
            ChatCompletionRequestMessage::User(_)
        ));
        assert_eq!(oai_req.max_completion_tokens, Some(1000));
        assert_eq!(oai_req.temperature, Some(0.7));
    }

    #[test]
    fn test_build_request_model_override() {
        let request = CompletionRequest {
            model: Some("gpt-4o".to_string()),
            messages: vec![Message::user("Hello")],
            max_tokens: 10,
            temperature: 0.0,
        };
        assert_eq!(client().build_request(&request).model, "gpt-4o");
    }

    #[test]
    fn test_map_auth_error() {
        let err = map_openai_error(api_error(
            "Incorrect API key provided",
            Some("invalid_request_error"),
            Some("invalid_api_key"),
        ));
        assert!(matches!(err, LlmError::AuthenticationFailed));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_map_rate_limit_is_retryable() {
        let err = map_openai_error(api_error(
            "Rate limit reached",
            Some("requests"),
            Some("rate_limit_exceeded"),
        ));
        assert!(matches!(err, LlmError::RateLimited { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_map_context_length() {
        let err = map_openai_error(api_error(
            "This model's maximum context length is 4097 tokens",
            Some("invalid_request_error"),
            Some("context_length_exceeded"),
        ));
        assert!(matches!(err, LlmError::ContextLengthExceeded { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_map_server_error_is_retryable() {
        let err = map_openai_error(api_error("The server had an error", None, Some("server_error")));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_map_invalid_argument() {
        let err = map_openai_error(OpenAIError::InvalidArgument("bad arg".to_string()));
        assert!(matches!(err, LlmError::InvalidRequest(_)));
    }
}
