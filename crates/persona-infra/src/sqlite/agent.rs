//! SQLite agent repository implementation.
//!
//! Implements `AgentRepository` from `persona-core`. Personality and
//! capabilities are stored as JSON columns; everything else is flat.

use chrono::{DateTime, Utc};
use persona_core::repository::agent::AgentRepository;
use persona_types::agent::{AgentConfig, AgentId, AgentRecord, AgentStatus};
use persona_types::error::RepositoryError;
use persona_types::training::JobStatus;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, map_sqlx_error, parse_datetime};

/// SQLite-backed implementation of `AgentRepository`.
pub struct SqliteAgentRepository {
    pool: DatabasePool,
}

impl SqliteAgentRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to `AgentRecord`.
struct AgentRow {
    agent_id: String,
    name: String,
    creator_id: String,
    personality: String,
    capabilities: String,
    temperature: f64,
    max_tokens: i64,
    max_context_turns: i64,
    version: i64,
    system_prompt: String,
    status: String,
    created_at: String,
    updated_at: String,
    last_trained_at: Option<String>,
    training_status: Option<String>,
}

impl AgentRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            agent_id: row.try_get("agent_id")?,
            name: row.try_get("name")?,
            creator_id: row.try_get("creator_id")?,
            personality: row.try_get("personality")?,
            capabilities: row.try_get("capabilities")?,
            temperature: row.try_get("temperature")?,
            max_tokens: row.try_get("max_tokens")?,
            max_context_turns: row.try_get("max_context_turns")?,
            version: row.try_get("version")?,
            system_prompt: row.try_get("system_prompt")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            last_trained_at: row.try_get("last_trained_at")?,
            training_status: row.try_get("training_status")?,
        })
    }

    fn into_record(self) -> Result<AgentRecord, RepositoryError> {
        let personality = serde_json::from_str(&self.personality)
            .map_err(|e| RepositoryError::Query(format!("invalid personality JSON: {e}")))?;
        let capabilities = serde_json::from_str(&self.capabilities)
            .map_err(|e| RepositoryError::Query(format!("invalid capabilities JSON: {e}")))?;
        let status: AgentStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let training_status = self
            .training_status
            .as_deref()
            .map(|s| s.parse::<JobStatus>().map_err(RepositoryError::Query))
            .transpose()?;

        Ok(AgentRecord {
            config: AgentConfig {
                agent_id: AgentId::new(self.agent_id),
                name: self.name,
                creator_id: self.creator_id,
                personality,
                capabilities,
                temperature: self.temperature,
                max_tokens: to_u32(self.max_tokens, "max_tokens")?,
                max_context_turns: to_u32(self.max_context_turns, "max_context_turns")?,
                version: to_u32(self.version, "version")?,
            },
            system_prompt: self.system_prompt,
            status,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            last_trained_at: self
                .last_trained_at
                .as_deref()
                .map(parse_datetime)
                .transpose()?,
            training_status,
        })
    }
}

fn to_u32(value: i64, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::Query(format!("{column} out of range: {value}")))
}

impl AgentRepository for SqliteAgentRepository {
    async fn create(&self, record: &AgentRecord) -> Result<(), RepositoryError> {
        let config = &record.config;
        let personality = serde_json::to_string(&config.personality)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let capabilities = serde_json::to_string(&config.capabilities)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO agents (agent_id, name, creator_id, personality, capabilities, temperature, max_tokens, max_context_turns, version, system_prompt, status, created_at, updated_at, last_trained_at, training_status)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(config.agent_id.as_str())
        .bind(&config.name)
        .bind(&config.creator_id)
        .bind(&personality)
        .bind(&capabilities)
        .bind(config.temperature)
        .bind(i64::from(config.max_tokens))
        .bind(i64::from(config.max_context_turns))
        .bind(i64::from(config.version))
        .bind(&record.system_prompt)
        .bind(record.status.to_string())
        .bind(format_datetime(&record.created_at))
        .bind(format_datetime(&record.updated_at))
        .bind(record.last_trained_at.as_ref().map(format_datetime))
        .bind(record.training_status.map(|s| s.to_string()))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "agent '{}' already exists",
                config.agent_id
            ))),
            Err(e) => Err(map_sqlx_error(e)),
        }
    }

    async fn get(&self, id: &AgentId) -> Result<Option<AgentRecord>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM agents WHERE agent_id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => {
                let agent_row =
                    AgentRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(agent_row.into_record()?))
            }
            None => Ok(None),
        }
    }

    async fn update_last_trained(
        &self,
        id: &AgentId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let at = format_datetime(&at);
        let result = sqlx::query(
            "UPDATE agents SET last_trained_at = ?, training_status = ?, updated_at = ? WHERE agent_id = ?",
        )
        .bind(&at)
        .bind(JobStatus::Completed.to_string())
        .bind(&at)
        .bind(id.as_str())
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sqlite::pool::test_pool;
    use persona_types::agent::{Capabilities, Personality};

    pub(crate) fn make_record(id: &str) -> AgentRecord {
        let now = Utc::now();
        AgentRecord {
            config: AgentConfig {
                agent_id: AgentId::new(id),
                name: "Luna".to_string(),
                creator_id: "creator-1".to_string(),
                personality: Personality {
                    tone: "warm".to_string(),
                    expertise: vec!["astronomy".to_string(), "poetry".to_string()],
                    response_style: "concise".to_string(),
                    language_style: "casual".to_string(),
                    template_id: Some("tpl-1".to_string()),
                },
                capabilities: Capabilities {
                    data_analysis: true,
                    custom_capabilities: vec!["Tell bedtime stories".to_string()],
                    ..Capabilities::default()
                },
                temperature: 0.4,
                max_tokens: 512,
                max_context_turns: 6,
                version: 1,
            },
            system_prompt: "You are Luna".to_string(),
            status: AgentStatus::Active,
            created_at: now,
            updated_at: now,
            last_trained_at: None,
            training_status: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = SqliteAgentRepository::new(test_pool().await);
        let record = make_record("luna");

        repo.create(&record).await.unwrap();
        let found = repo.get(&AgentId::new("luna")).await.unwrap().unwrap();

        assert_eq!(found.config, record.config);
        assert_eq!(found.system_prompt, "You are Luna");
        assert_eq!(found.status, AgentStatus::Active);
        assert!(found.last_trained_at.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let repo = SqliteAgentRepository::new(test_pool().await);
        assert!(repo.get(&AgentId::new("ghost")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let repo = SqliteAgentRepository::new(test_pool().await);
        repo.create(&make_record("luna")).await.unwrap();

        let err = repo.create(&make_record("luna")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_last_trained() {
        let repo = SqliteAgentRepository::new(test_pool().await);
        repo.create(&make_record("luna")).await.unwrap();

        let at = Utc::now();
        repo.update_last_trained(&AgentId::new("luna"), at).await.unwrap();

        let found = repo.get(&AgentId::new("luna")).await.unwrap().unwrap();
        assert_eq!(
            found.last_trained_at.unwrap().timestamp_millis(),
            at.timestamp_millis()
        );
        assert_eq!(found.training_status, Some(JobStatus::Completed));
    }

    #[tokio::test]
    async fn test_update_last_trained_missing_agent() {
        let repo = SqliteAgentRepository::new(test_pool().await);
        let err = repo
            .update_last_trained(&AgentId::new("ghost"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
