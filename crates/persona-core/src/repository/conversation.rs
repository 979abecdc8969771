//! Conversation repository trait definition.

use persona_types::agent::AgentId;
use persona_types::conversation::{ConversationId, ConversationTurn, TurnBatch};
use persona_types::error::RepositoryError;

/// Repository trait for the append-only conversation log.
///
/// Turns within one conversation are totally ordered by a per-conversation
/// sequence number the store assigns on append.
pub trait ConversationRepository: Send + Sync {
    /// Append every turn in the batch atomically, after any existing turns.
    ///
    /// Returns the number of turns persisted. Concurrent batches on the same
    /// conversation are serialized; a batch is never interleaved with another.
    fn append_turns(
        &self,
        batch: &TurnBatch,
    ) -> impl std::future::Future<Output = Result<usize, RepositoryError>> + Send;

    /// The `limit` most recent turns, oldest first.
    fn read_window(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationTurn>, RepositoryError>> + Send;

    /// Every turn in append order. Unknown ids yield an empty list.
    fn read_all(
        &self,
        conversation_id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationTurn>, RepositoryError>> + Send;

    /// Number of stored exchanges (one user turn each) across all of this
    /// agent's conversations.
    fn count_exchanges(
        &self,
        agent_id: &AgentId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
