//! Training job repository trait definition.

use persona_types::error::RepositoryError;
use persona_types::training::{JobId, JobStatus, JobTransition, TrainingJob};

/// Repository trait for training job persistence.
pub trait JobRepository: Send + Sync {
    /// Insert a new job (always in `Queued`).
    fn create(
        &self,
        job: &TrainingJob,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a job by id.
    fn get(
        &self,
        id: &JobId,
    ) -> impl std::future::Future<Output = Result<Option<TrainingJob>, RepositoryError>> + Send;

    /// Atomically apply `transition` if the job is currently in
    /// `transition.from_status()`.
    ///
    /// Returns `Ok(false)` when the precondition does not hold (including
    /// when the job does not exist); nothing is written in that case.
    fn transition(
        &self,
        id: &JobId,
        transition: &JobTransition,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Jobs in the given status, oldest first.
    fn list_by_status(
        &self,
        status: JobStatus,
    ) -> impl std::future::Future<Output = Result<Vec<TrainingJob>, RepositoryError>> + Send;
}
