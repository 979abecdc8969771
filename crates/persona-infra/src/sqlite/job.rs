//! SQLite training job repository implementation.
//!
//! Status changes are single `UPDATE ... WHERE job_id = ? AND status = ?`
//! statements, so a transition applies at most once no matter how many
//! runners race on the same job.

use persona_core::repository::job::JobRepository;
use persona_types::agent::AgentId;
use persona_types::error::RepositoryError;
use persona_types::training::{JobId, JobStatus, JobTransition, TrainingJob, TrainingMode};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, map_sqlx_error, parse_datetime};

/// SQLite-backed implementation of `JobRepository`.
pub struct SqliteJobRepository {
    pool: DatabasePool,
}

impl SqliteJobRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct JobRow {
    job_id: String,
    agent_id: String,
    payload: String,
    mode: String,
    status: String,
    created_at: String,
    started_at: Option<String>,
    completed_at: Option<String>,
    failed_at: Option<String>,
    error: Option<String>,
}

impl JobRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            job_id: row.try_get("job_id")?,
            agent_id: row.try_get("agent_id")?,
            payload: row.try_get("payload")?,
            mode: row.try_get("mode")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            started_at: row.try_get("started_at")?,
            completed_at: row.try_get("completed_at")?,
            failed_at: row.try_get("failed_at")?,
            error: row.try_get("error")?,
        })
    }

    fn into_job(self) -> Result<TrainingJob, RepositoryError> {
        let payload = serde_json::from_str(&self.payload)
            .map_err(|e| RepositoryError::Query(format!("invalid payload JSON: {e}")))?;
        let mode: TrainingMode = self.mode.parse().map_err(RepositoryError::Query)?;
        let status: JobStatus = self.status.parse().map_err(RepositoryError::Query)?;
        let optional = |s: Option<String>| s.as_deref().map(parse_datetime).transpose();

        Ok(TrainingJob {
            job_id: JobId::new(self.job_id),
            agent_id: AgentId::new(self.agent_id),
            payload,
            mode,
            status,
            created_at: parse_datetime(&self.created_at)?,
            started_at: optional(self.started_at)?,
            completed_at: optional(self.completed_at)?,
            failed_at: optional(self.failed_at)?,
            error: self.error,
        })
    }
}

impl JobRepository for SqliteJobRepository {
    async fn create(&self, job: &TrainingJob) -> Result<(), RepositoryError> {
        let payload = serde_json::to_string(&job.payload)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO training_jobs (job_id, agent_id, payload, mode, status, created_at, started_at, completed_at, failed_at, error)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(job.job_id.as_str())
        .bind(job.agent_id.as_str())
        .bind(&payload)
        .bind(job.mode.to_string())
        .bind(job.status.to_string())
        .bind(format_datetime(&job.created_at))
        .bind(job.started_at.as_ref().map(format_datetime))
        .bind(job.completed_at.as_ref().map(format_datetime))
        .bind(job.failed_at.as_ref().map(format_datetime))
        .bind(&job.error)
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "job '{}' already exists",
                job.job_id
            ))),
            Err(e) => Err(map_sqlx_error(e)),
        }
    }

    async fn get(&self, id: &JobId) -> Result<Option<TrainingJob>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM training_jobs WHERE job_id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => {
                let job_row =
                    JobRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(job_row.into_job()?))
            }
            None => Ok(None),
        }
    }

    async fn transition(
        &self,
        id: &JobId,
        transition: &JobTransition,
    ) -> Result<bool, RepositoryError> {
        let to = transition.to_status().to_string();
        let from = transition.from_status().to_string();

        let query = match transition {
            JobTransition::Start { at } => sqlx::query(
                "UPDATE training_jobs SET status = ?, started_at = ? WHERE job_id = ? AND status = ?",
            )
            .bind(to)
            .bind(format_datetime(at)),
            JobTransition::Complete { at } => sqlx::query(
                "UPDATE training_jobs SET status = ?, completed_at = ? WHERE job_id = ? AND status = ?",
            )
            .bind(to)
            .bind(format_datetime(at)),
            JobTransition::Fail { at, error } => sqlx::query(
                "UPDATE training_jobs SET status = ?, failed_at = ?, error = ? WHERE job_id = ? AND status = ?",
            )
            .bind(to)
            .bind(format_datetime(at))
            .bind(error.clone()),
            JobTransition::Requeue { started_before } => sqlx::query(
                "UPDATE training_jobs SET status = ?, started_at = NULL
                 WHERE started_at IS NOT NULL AND started_at < ? AND job_id = ? AND status = ?",
            )
            .bind(to)
            .bind(format_datetime(started_before)),
        };

        let result = query
            .bind(id.as_str())
            .bind(from)
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<TrainingJob>, RepositoryError> {
        let rows =
            sqlx::query("SELECT * FROM training_jobs WHERE status = ? ORDER BY created_at ASC")
                .bind(status.to_string())
                .fetch_all(&self.pool.reader)
                .await
                .map_err(map_sqlx_error)?;

        let mut jobs = Vec::with_capacity(rows.len());
        for row in &rows {
            let job_row =
                JobRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            jobs.push(job_row.into_job()?);
        }
        Ok(jobs)
    }
}
