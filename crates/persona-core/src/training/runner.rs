//! Background execution of a single training job.
//!
//! Every status change goes through a compare-and-set on the job record, so a
//! job scheduled twice runs once and a terminal job is never touched again.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use persona_types::error::EngineError;
use persona_types::training::{JobId, JobTransition, TrainingJob};

use crate::metrics::{MetricsSink, TRAINING_JOBS_TOTAL, TRAINING_JOB_DURATION_SECONDS};
use crate::repository::agent::AgentRepository;
use crate::repository::job::JobRepository;

use super::executor::JobHandler;
use super::trainer::BoxTrainer;

/// How a run ended. Returned for tests and logging; callers never need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The job was not `queued` when the run began.
    Skipped,
    Completed,
    Failed,
    /// Writing the `failed` status itself failed; the job is left `processing`.
    Stuck,
}

pub struct TrainingRunner<A: AgentRepository, J: JobRepository> {
    agents: Arc<A>,
    jobs: Arc<J>,
    trainer: Arc<BoxTrainer>,
    metrics: Arc<dyn MetricsSink>,
}

impl<A: AgentRepository, J: JobRepository> TrainingRunner<A, J> {
    pub fn new(
        agents: Arc<A>,
        jobs: Arc<J>,
        trainer: Arc<BoxTrainer>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            agents,
            jobs,
            trainer,
            metrics,
        }
    }

    pub async fn run(&self, job_id: &JobId) -> RunOutcome {
        match self
            .jobs
            .transition(job_id, &JobTransition::Start { at: Utc::now() })
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                debug!(job_id = %job_id, "job not queued, skipping");
                return RunOutcome::Skipped;
            }
            Err(e) => {
                // Still queued; only the startup recovery sweep reschedules it.
                warn!(
                    job_id = %job_id,
                    error = %e,
                    "could not start training job, it stays queued until the next startup"
                );
                return RunOutcome::Skipped;
            }
        }

        let started = Instant::now();
        info!(job_id = %job_id, trainer = self.trainer.name(), "training job started");

        let outcome = match self.execute(job_id).await {
            Ok(()) => RunOutcome::Completed,
            Err(reason) => self.fail(job_id, reason).await,
        };

        if outcome != RunOutcome::Stuck {
            self.metrics.observe_duration(
                TRAINING_JOB_DURATION_SECONDS,
                started.elapsed().as_secs_f64(),
            );
        }
        outcome
    }

    /// Everything between `processing` and `completed`. Any error string
    /// returned here is recorded on the job as the failure reason.
    async fn execute(&self, job_id: &JobId) -> Result<(), String> {
        let job: TrainingJob = self
            .jobs
            .get(job_id)
            .await
            .map_err(|e| format!("failed to load job: {e}"))?
            .ok_or_else(|| "job record disappeared".to_string())?;

        self.trainer
            .train(&job)
            .await
            .map_err(|e| EngineError::trainer(e).to_string())?;

        // The agent marker follows the job record, never the other way round.
        match self
            .jobs
            .transition(job_id, &JobTransition::Complete { at: Utc::now() })
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                return Err("job left processing before completion was recorded".to_string());
            }
            Err(e) => return Err(format!("failed to record completion: {e}")),
        }

        self.metrics
            .increment_counter(TRAINING_JOBS_TOTAL, &[("status", "completed".to_string())]);
        info!(job_id = %job_id, agent_id = %job.agent_id, "training job completed");

        if let Err(e) = self
            .agents
            .update_last_trained(&job.agent_id, Utc::now())
            .await
        {
            warn!(
                job_id = %job_id,
                agent_id = %job.agent_id,
                error = %e,
                "training job completed but the agent record was not updated"
            );
        }
        Ok(())
    }

    async fn fail(&self, job_id: &JobId, reason: String) -> RunOutcome {
        let transition = JobTransition::Fail {
            at: Utc::now(),
            error: reason.clone(),
        };
        match self.jobs.transition(job_id, &transition).await {
            Ok(true) => {
                self.metrics
                    .increment_counter(TRAINING_JOBS_TOTAL, &[("status", "failed".to_string())]);
                warn!(job_id = %job_id, error = %reason, "training job failed");
                RunOutcome::Failed
            }
            Ok(false) => {
                error!(
                    job_id = %job_id,
                    error = %reason,
                    "training job failed but was no longer processing"
                );
                RunOutcome::Stuck
            }
            Err(e) => {
                error!(
                    job_id = %job_id,
                    error = %reason,
                    write_error = %e,
                    "training job stuck: could not record failure"
                );
                RunOutcome::Stuck
            }
        }
    }
}

impl<A, J> JobHandler for TrainingRunner<A, J>
where
    A: AgentRepository + 'static,
    J: JobRepository + 'static,
{
    async fn handle(&self, job_id: JobId) {
        self.run(&job_id).await;
    }
}
