//! SQLite conversation repository implementation.
//!
//! Turns are appended inside one transaction on the single-connection writer
//! pool. Each turn gets `seq = MAX(seq) + 1` for its conversation, and the
//! `(conversation_id, seq)` primary key rejects any interleaving that slips
//! past the writer.

use chrono::Utc;
use persona_core::repository::conversation::ConversationRepository;
use persona_types::agent::AgentId;
use persona_types::conversation::{ConversationId, ConversationTurn, TurnBatch};
use persona_types::error::RepositoryError;
use persona_types::llm::MessageRole;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, map_sqlx_error, parse_datetime};

/// SQLite-backed implementation of `ConversationRepository`.
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct TurnRow {
    role: String,
    content: String,
    timestamp: String,
    metadata: String,
}

impl TurnRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            timestamp: row.try_get("timestamp")?,
            metadata: row.try_get("metadata")?,
        })
    }

    fn into_turn(self) -> Result<ConversationTurn, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let metadata = serde_json::from_str(&self.metadata)
            .map_err(|e| RepositoryError::Query(format!("invalid metadata JSON: {e}")))?;

        Ok(ConversationTurn {
            role,
            content: self.content,
            timestamp: parse_datetime(&self.timestamp)?,
            metadata,
        })
    }
}

fn rows_into_turns(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<ConversationTurn>, RepositoryError> {
    rows.iter()
        .map(|row| {
            TurnRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_turn()
        })
        .collect()
}

impl ConversationRepository for SqliteConversationRepository {
    async fn append_turns(&self, batch: &TurnBatch) -> Result<usize, RepositoryError> {
        if batch.turns.is_empty() {
            return Ok(0);
        }
        let conversation_id = batch.conversation_id.as_str();
        let now = format_datetime(&Utc::now());

        let mut tx = self.pool.writer.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            "INSERT INTO conversations (conversation_id, agent_id, user_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (conversation_id) DO UPDATE SET updated_at = excluded.updated_at",
        )
        .bind(conversation_id)
        .bind(batch.agent_id.as_str())
        .bind(&batch.user_id)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let (last_seq,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(seq), 0) FROM conversation_turns WHERE conversation_id = ?",
        )
        .bind(conversation_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let mut persisted = 0usize;
        for (offset, turn) in batch.turns.iter().enumerate() {
            let metadata = serde_json::to_string(&turn.metadata)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let seq = last_seq + 1 + offset as i64;

            let result = sqlx::query(
                "INSERT INTO conversation_turns (conversation_id, seq, role, content, timestamp, metadata)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(conversation_id)
            .bind(seq)
            .bind(turn.role.to_string())
            .bind(&turn.content)
            .bind(format_datetime(&turn.timestamp))
            .bind(&metadata)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepositoryError::Conflict(format!(
                        "turn {seq} already exists in conversation {conversation_id}"
                    ))
                } else {
                    map_sqlx_error(e)
                }
            })?;
            persisted += result.rows_affected() as usize;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(persisted)
    }

    async fn read_window(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM (
                 SELECT * FROM conversation_turns WHERE conversation_id = ? ORDER BY seq DESC LIMIT ?
             ) ORDER BY seq ASC",
        )
        .bind(conversation_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        rows_into_turns(&rows)
    }

    async fn read_all(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        let rows =
            sqlx::query("SELECT * FROM conversation_turns WHERE conversation_id = ? ORDER BY seq ASC")
                .bind(conversation_id.as_str())
                .fetch_all(&self.pool.reader)
                .await
                .map_err(map_sqlx_error)?;

        rows_into_turns(&rows)
    }

    async fn count_exchanges(&self, agent_id: &AgentId) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM conversation_turns t
             JOIN conversations c ON c.conversation_id = t.conversation_id
             WHERE c.agent_id = ? AND t.role = 'user'",
        )
        .bind(agent_id.as_str())
        .fetch_one(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        Ok(count.max(0) as u64)
    }
}
