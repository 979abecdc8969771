//! Agent repository trait definition.

use chrono::{DateTime, Utc};
use persona_types::agent::{AgentId, AgentRecord};
use persona_types::error::RepositoryError;

/// Repository trait for agent persistence.
///
/// Implementations live in persona-infra (e.g., SqliteAgentRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait AgentRepository: Send + Sync {
    /// Insert a new agent. A duplicate id yields `RepositoryError::Conflict`.
    fn create(
        &self,
        record: &AgentRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get an agent by its id.
    fn get(
        &self,
        id: &AgentId,
    ) -> impl std::future::Future<Output = Result<Option<AgentRecord>, RepositoryError>> + Send;

    /// Record a completed training run on the agent.
    ///
    /// Returns `RepositoryError::NotFound` if the agent no longer exists.
    fn update_last_trained(
        &self,
        id: &AgentId,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
