//! Agent management service.
//!
//! Validates submitted configs, compiles the system prompt once at creation
//! time, and stores it alongside the config in the agent record.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use persona_types::agent::{AgentAnalytics, AgentConfig, AgentId, AgentRecord, AgentStatus};
use persona_types::error::{EngineError, RepositoryError};

use crate::agent::prompt::PromptCompiler;
use crate::repository::agent::AgentRepository;
use crate::repository::conversation::ConversationRepository;

/// Cap on `recent_conversations` in analytics.
const RECENT_LIMIT: u64 = 10;

/// Service for the agent lifecycle and per-agent analytics.
///
/// Generic over repository traits -- persona-core never depends on
/// persona-infra.
pub struct AgentService<A: AgentRepository, C: ConversationRepository> {
    agents: Arc<A>,
    conversations: Arc<C>,
}

impl<A: AgentRepository, C: ConversationRepository> AgentService<A, C> {
    pub fn new(agents: Arc<A>, conversations: Arc<C>) -> Self {
        Self {
            agents,
            conversations,
        }
    }

    /// Validate and persist a new agent.
    ///
    /// A duplicate `agent_id` is an `AgentConflict`; nothing is overwritten.
    pub async fn create_agent(&self, config: AgentConfig) -> Result<AgentRecord, EngineError> {
        config.validate().map_err(EngineError::InvalidInput)?;

        let now = Utc::now();
        let record = AgentRecord {
            system_prompt: PromptCompiler::compile(&config),
            config,
            status: AgentStatus::Active,
            created_at: now,
            updated_at: now,
            last_trained_at: None,
            training_status: None,
        };

        self.agents.create(&record).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => EngineError::AgentConflict(record.id().to_string()),
            other => EngineError::storage(other),
        })?;

        info!(
            agent_id = %record.id(),
            creator_id = %record.config.creator_id,
            "agent created"
        );
        Ok(record)
    }

    pub async fn get_agent(&self, id: &AgentId) -> Result<AgentRecord, EngineError> {
        self.agents
            .get(id)
            .await
            .map_err(EngineError::storage)?
            .ok_or_else(|| EngineError::AgentNotFound(id.to_string()))
    }

    /// Exchange counts for an agent. The agent need not exist; unknown ids
    /// report zeros.
    pub async fn analytics(&self, id: &AgentId) -> Result<AgentAnalytics, EngineError> {
        let total = self
            .conversations
            .count_exchanges(id)
            .await
            .map_err(EngineError::storage)?;

        Ok(AgentAnalytics {
            agent_id: id.clone(),
            total_conversations: total,
            recent_conversations: total.min(RECENT_LIMIT),
            status: "active".to_string(),
        })
    }
}
