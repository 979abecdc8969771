//! Training job manager: request validation, job creation and scheduling.
//!
//! `enqueue` writes a `queued` job and hands its id to the executor without
//! waiting; everything after that happens in [`TrainingRunner`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use persona_types::agent::AgentId;
use persona_types::error::{EngineError, RepositoryError};
use persona_types::training::{JobId, JobStatus, JobTransition, TrainingJob, TrainingMode};

use crate::metrics::{MetricsSink, TRAINING_JOBS_TOTAL};
use crate::repository::agent::AgentRepository;
use crate::repository::job::JobRepository;

use super::executor::TrainingExecutor;
use super::runner::TrainingRunner;
use super::trainer::BoxTrainer;

/// What the startup recovery sweep did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    /// `queued` jobs left by a previous process, re-submitted.
    pub rescheduled: usize,
    /// Stale `processing` jobs moved back to `queued` and re-submitted.
    pub requeued: usize,
}

pub struct TrainingJobManager<A: AgentRepository + 'static, J: JobRepository + 'static> {
    agents: Arc<A>,
    jobs: Arc<J>,
    executor: TrainingExecutor,
    metrics: Arc<dyn MetricsSink>,
}

impl<A: AgentRepository + 'static, J: JobRepository + 'static> TrainingJobManager<A, J> {
    /// Build the manager and start its executor with `workers` slots.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        agents: Arc<A>,
        jobs: Arc<J>,
        trainer: BoxTrainer,
        metrics: Arc<dyn MetricsSink>,
        workers: usize,
    ) -> Self {
        let runner = Arc::new(TrainingRunner::new(
            Arc::clone(&agents),
            Arc::clone(&jobs),
            Arc::new(trainer),
            Arc::clone(&metrics),
        ));
        let executor = TrainingExecutor::start(runner, workers);
        Self {
            agents,
            jobs,
            executor,
            metrics,
        }
    }

    /// Validate, persist a `queued` job, and schedule it.
    pub async fn enqueue(
        &self,
        agent_id: &AgentId,
        payload: Vec<serde_json::Value>,
        mode: &str,
    ) -> Result<TrainingJob, EngineError> {
        if payload.is_empty() {
            return Err(EngineError::InvalidTrainingRequest(
                "training_data cannot be empty".to_string(),
            ));
        }
        let mode: TrainingMode = mode
            .parse()
            .map_err(EngineError::InvalidTrainingRequest)?;

        let agent = self.agents.get(agent_id).await.map_err(EngineError::storage)?;
        if agent.is_none() {
            return Err(EngineError::AgentNotFound(agent_id.to_string()));
        }

        let job = TrainingJob::queued(agent_id.clone(), payload, mode, Utc::now());
        self.jobs.create(&job).await.map_err(|e| match e {
            RepositoryError::Conflict(msg) => {
                EngineError::InternalInconsistency(format!("job id collision: {msg}"))
            }
            other => EngineError::storage(other),
        })?;
        self.metrics
            .increment_counter(TRAINING_JOBS_TOTAL, &[("status", "queued".to_string())]);

        if let Err(e) = self.executor.submit(job.job_id.clone()) {
            // The job is durable in `queued`; the next startup sweep runs it.
            warn!(job_id = %job.job_id, error = %e, "training job queued but not scheduled");
        }

        info!(
            job_id = %job.job_id,
            agent_id = %agent_id,
            mode = %mode,
            records = job.payload.len(),
            "training job queued"
        );
        Ok(job)
    }

    /// Current state of a job as last written.
    pub async fn status(&self, job_id: &JobId) -> Result<TrainingJob, EngineError> {
        self.jobs
            .get(job_id)
            .await
            .map_err(EngineError::storage)?
            .ok_or_else(|| EngineError::JobNotFound(job_id.to_string()))
    }

    /// Re-schedule work left behind by a previous process.
    ///
    /// `queued` jobs are submitted again. `processing` jobs whose `started_at`
    /// is older than `stale_after` are moved back to `queued` first.
    pub async fn recover(&self, stale_after: Duration) -> Result<RecoveryReport, EngineError> {
        let mut report = RecoveryReport::default();

        let queued = self
            .jobs
            .list_by_status(JobStatus::Queued)
            .await
            .map_err(EngineError::storage)?;
        for job in queued {
            if self.executor.submit(job.job_id).is_ok() {
                report.rescheduled += 1;
            }
        }

        let stale = chrono::Duration::from_std(stale_after).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now()
            .checked_sub_signed(stale)
            .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);
        let processing = self
            .jobs
            .list_by_status(JobStatus::Processing)
            .await
            .map_err(EngineError::storage)?;
        for job in processing {
            let requeue = JobTransition::Requeue {
                started_before: cutoff,
            };
            let applied = self
                .jobs
                .transition(&job.job_id, &requeue)
                .await
                .map_err(EngineError::storage)?;
            if applied {
                warn!(job_id = %job.job_id, "re-queued stale training job");
                if self.executor.submit(job.job_id).is_ok() {
                    report.requeued += 1;
                }
            }
        }

        if report.rescheduled > 0 || report.requeued > 0 {
            info!(
                rescheduled = report.rescheduled,
                requeued = report.requeued,
                "training recovery sweep finished"
            );
        }
        Ok(report)
    }

    pub fn in_flight(&self) -> usize {
        self.executor.in_flight()
    }

    /// Stop intake and drain running jobs within `grace`.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.executor.shutdown(grace).await
    }
}
