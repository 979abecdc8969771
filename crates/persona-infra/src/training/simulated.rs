//! Stand-in trainer that validates the payload and waits.
//!
//! No model weights are touched. Used as the default backend until a real
//! fine-tuning service is wired in.

use std::time::Duration;

use persona_core::training::trainer::Trainer;
use persona_types::error::TrainerError;
use persona_types::training::TrainingJob;
use tracing::debug;

pub struct SimulatedTrainer {
    duration: Duration,
}

impl SimulatedTrainer {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Trainer for SimulatedTrainer {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn train(&self, job: &TrainingJob) -> Result<(), TrainerError> {
        if let Some(index) = job.payload.iter().position(|record| !record.is_object()) {
            return Err(TrainerError::InvalidRecord {
                index,
                reason: "training records must be JSON objects".to_string(),
            });
        }

        debug!(
            job_id = %job.job_id,
            mode = %job.mode,
            records = job.payload.len(),
            duration_ms = self.duration.as_millis() as u64,
            "simulating training run"
        );
        tokio::time::sleep(self.duration).await;
        Ok(())
    }
}
