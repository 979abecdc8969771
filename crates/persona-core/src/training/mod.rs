//! Asynchronous training jobs.
//!
//! [`manager::TrainingJobManager`] accepts requests and persists `queued`
//! jobs; [`executor::TrainingExecutor`] runs them on a bounded worker pool
//! through [`runner::TrainingRunner`], which drives the job state machine and
//! delegates the actual work to a [`trainer::Trainer`].

pub mod executor;
pub mod manager;
pub mod runner;
pub mod trainer;
