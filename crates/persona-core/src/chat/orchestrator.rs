//! Chat orchestration: one user message in, one agent reply out.
//!
//! Each call resolves the agent through the [`PromptCache`], loads a bounded
//! window of recent turns, makes exactly one model call, and persists the
//! user/assistant pair as a single atomic batch.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::{Map, Value, json};
use tracing::{error, info, warn};

use persona_types::conversation::{
    ChatReply, ChatRequest, ConversationId, ConversationLog, ConversationTurn, TurnBatch,
};
use persona_types::error::EngineError;
use persona_types::llm::{CompletionRequest, Message, MessageRole};

use crate::agent::cache::PromptCache;
use crate::llm::box_client::BoxModelClient;
use crate::metrics::{CHAT_DURATION_SECONDS, CONVERSATIONS_TOTAL, MetricsSink};
use crate::repository::agent::AgentRepository;
use crate::repository::conversation::ConversationRepository;

/// Coordinates agent lookup, context windowing, the model call and persistence.
///
/// Generic over the repositories so persona-core never depends on
/// persona-infra.
pub struct ChatOrchestrator<A: AgentRepository, C: ConversationRepository> {
    agents: Arc<A>,
    conversations: Arc<C>,
    model: Arc<BoxModelClient>,
    cache: Arc<PromptCache>,
    metrics: Arc<dyn MetricsSink>,
    /// Window size for agents whose record carries no usable value.
    default_context_turns: u32,
}

impl<A: AgentRepository, C: ConversationRepository> ChatOrchestrator<A, C> {
    pub fn new(
        agents: Arc<A>,
        conversations: Arc<C>,
        model: Arc<BoxModelClient>,
        cache: Arc<PromptCache>,
        metrics: Arc<dyn MetricsSink>,
        default_context_turns: u32,
    ) -> Self {
        Self {
            agents,
            conversations,
            model,
            cache,
            metrics,
            default_context_turns: default_context_turns.max(1),
        }
    }

    /// Answer one user message.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatReply, EngineError> {
        if request.message.trim().is_empty() {
            return Err(EngineError::InvalidInput("message cannot be empty".to_string()));
        }
        if request.user_id.trim().is_empty() {
            return Err(EngineError::InvalidInput("user_id cannot be empty".to_string()));
        }

        let started = Instant::now();

        let agent = self
            .cache
            .get_or_load(self.agents.as_ref(), &request.agent_id)
            .await
            .map_err(EngineError::storage)?
            .ok_or_else(|| EngineError::AgentNotFound(request.agent_id.to_string()))?;
        let config = &agent.record.config;

        let conversation_id = request.conversation_id.clone().unwrap_or_else(|| {
            ConversationId::mint(&request.user_id, &request.agent_id, Utc::now())
        });

        let window_size = if config.max_context_turns > 0 {
            config.max_context_turns
        } else {
            self.default_context_turns
        };
        let window = self
            .conversations
            .read_window(&conversation_id, window_size)
            .await
            .map_err(EngineError::storage)?;

        let mut messages = Vec::with_capacity(window.len() + 2);
        messages.push(Message::system(agent.system_prompt.as_str()));
        messages.extend(window.iter().map(ConversationTurn::to_message));
        messages.push(Message::user(request.message.as_str()));

        let completion = CompletionRequest {
            model: None,
            messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        };
        let response = self.model.complete(&completion).await.map_err(|e| {
            warn!(
                agent_id = %request.agent_id,
                conversation_id = %conversation_id,
                retryable = e.is_retryable(),
                error = %e,
                "model call failed"
            );
            EngineError::model(e)
        })?;
        let tokens_used = response.tokens_used();

        let user_turn = ConversationTurn::new(MessageRole::User, request.message.as_str(), Utc::now())
            .with_metadata("user_id", request.user_id.as_str())
            .with_metadata("context", Value::Object(request.context.clone()));
        let assistant_turn =
            ConversationTurn::new(MessageRole::Assistant, response.content.as_str(), Utc::now())
                .with_metadata("agent_id", request.agent_id.as_str())
                .with_metadata("model", response.model.as_str())
                .with_metadata("tokens_used", json!(tokens_used));
        let batch = TurnBatch {
            conversation_id: conversation_id.clone(),
            agent_id: request.agent_id.clone(),
            user_id: request.user_id.clone(),
            turns: vec![user_turn, assistant_turn],
        };

        let persisted = self
            .conversations
            .append_turns(&batch)
            .await
            .map_err(EngineError::storage)?;
        if persisted != batch.turns.len() {
            error!(
                conversation_id = %conversation_id,
                expected = batch.turns.len(),
                persisted,
                "conversation store persisted an unexpected number of turns"
            );
            return Err(EngineError::InternalInconsistency(format!(
                "expected {} turns persisted, store reported {persisted}",
                batch.turns.len()
            )));
        }

        self.metrics.increment_counter(CONVERSATIONS_TOTAL, &[]);
        self.metrics
            .observe_duration(CHAT_DURATION_SECONDS, started.elapsed().as_secs_f64());

        info!(
            agent_id = %request.agent_id,
            conversation_id = %conversation_id,
            context_turns = window.len(),
            tokens_used = ?tokens_used,
            "chat exchange completed"
        );

        let mut metadata = Map::new();
        metadata.insert("agent_id".to_string(), json!(request.agent_id));
        metadata.insert("model".to_string(), json!(response.model));
        metadata.insert("tokens_used".to_string(), json!(tokens_used));

        Ok(ChatReply {
            message: response.content,
            conversation_id,
            tokens_used,
            timestamp: Utc::now(),
            metadata,
        })
    }

    /// Every stored turn of a conversation; unknown ids yield an empty log.
    pub async fn conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<ConversationLog, EngineError> {
        let messages = self
            .conversations
            .read_all(conversation_id)
            .await
            .map_err(EngineError::storage)?;
        Ok(ConversationLog {
            conversation_id: conversation_id.clone(),
            messages,
        })
    }
}
