//! Trainer trait and its object-safe wrapper.
//!
//! A trainer consumes a job's payload and updates whatever backs the agent's
//! learned state. The engine only cares whether it succeeded.

use std::future::Future;
use std::pin::Pin;

use persona_types::error::TrainerError;
use persona_types::training::TrainingJob;

/// Trait for training backends. Implementations live in persona-infra.
pub trait Trainer: Send + Sync {
    fn name(&self) -> &str;

    /// Run one training job to completion. May take arbitrarily long.
    fn train(
        &self,
        job: &TrainingJob,
    ) -> impl Future<Output = Result<(), TrainerError>> + Send;
}

/// Object-safe version of [`Trainer`] with boxed futures.
pub trait TrainerDyn: Send + Sync {
    fn name(&self) -> &str;

    fn train_boxed<'a>(
        &'a self,
        job: &'a TrainingJob,
    ) -> Pin<Box<dyn Future<Output = Result<(), TrainerError>> + Send + 'a>>;
}

impl<T: Trainer> TrainerDyn for T {
    fn name(&self) -> &str {
        Trainer::name(self)
    }

    fn train_boxed<'a>(
        &'a self,
        job: &'a TrainingJob,
    ) -> Pin<Box<dyn Future<Output = Result<(), TrainerError>> + Send + 'a>> {
        Box::pin(self.train(job))
    }
}

/// Type-erased trainer for runtime backend selection.
pub struct BoxTrainer {
    inner: Box<dyn TrainerDyn + Send + Sync>,
}

impl BoxTrainer {
    pub fn new<T: Trainer + 'static>(trainer: T) -> Self {
        Self {
            inner: Box::new(trainer),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn train(&self, job: &TrainingJob) -> Result<(), TrainerError> {
        self.inner.train_boxed(job).await
    }
}
