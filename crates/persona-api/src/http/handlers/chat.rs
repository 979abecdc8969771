//! Chat handler for the REST API.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

use persona_types::conversation::{ChatReply, ChatRequest};

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

/// POST /api/v1/chat - Send one message to an agent and get its reply.
///
/// Omitting `conversation_id` starts a new conversation; the minted id is
/// returned in the reply and linked under `_links.conversation`.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<ApiResponse<ChatReply>, AppError> {
    let clock = RequestClock::start();
    let Json(request) = payload?;

    let reply = state.chat.chat(request).await?;
    let conversation = format!("/api/v1/conversations/{}", reply.conversation_id);

    Ok(clock.success(reply).with_link("conversation", &conversation))
}

#[cfg(test)]
mod tests {
    use super::*;

    use persona_types::agent::AgentId;
    use persona_types::conversation::ConversationId;
    use persona_types::error::EngineError;
    use persona_types::llm::LlmError;

    use crate::state::test_support::{CannedModel, agent_config, state_with_model, test_state};

    fn request(message: &str, conversation_id: Option<&str>) -> ChatRequest {
        ChatRequest {
            agent_id: AgentId::new("luna"),
            user_id: "user-1".to_string(),
            message: message.to_string(),
            conversation_id: conversation_id.map(ConversationId::new),
            context: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn test_chat_replies_and_persists() {
        let (state, _dir) = test_state().await;
        state
            .agent_service
            .create_agent(agent_config("luna"))
            .await
            .unwrap();

        let resp = chat(State(state.clone()), Ok(Json(request("hi there", None))))
            .await
            .unwrap();
        let reply = resp.data.unwrap();
        assert_eq!(reply.message, "Hello from Luna");
        assert_eq!(reply.tokens_used, Some(20));
        assert_eq!(reply.metadata["agent_id"], "luna");

        let log = state.chat.conversation(&reply.conversation_id).await.unwrap();
        assert_eq!(log.messages.len(), 2);
        assert_eq!(log.messages[0].content, "hi there");
        assert_eq!(log.messages[1].content, "Hello from Luna");
    }

    #[tokio::test]
    async fn test_chat_unknown_agent() {
        let (state, _dir) = test_state().await;
        let err = chat(State(state), Ok(Json(request("hi", None))))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Engine(EngineError::AgentNotFound(_))));
    }

    #[tokio::test]
    async fn test_model_failure_persists_nothing() {
        let (state, _dir) = state_with_model(CannedModel {
            reply: String::new(),
            error: Some(|| LlmError::Timeout(60)),
        })
        .await;
        state
            .agent_service
            .create_agent(agent_config("luna"))
            .await
            .unwrap();

        let err = chat(State(state.clone()), Ok(Json(request("hi", Some("conv-1")))))
            .await
            .unwrap_err();
        match err {
            AppError::Engine(e) => assert!(e.is_retryable()),
            other => panic!("unexpected error: {other:?}"),
        }

        let log = state
            .chat
            .conversation(&ConversationId::new("conv-1"))
            .await
            .unwrap();
        assert!(log.messages.is_empty());
    }
}
