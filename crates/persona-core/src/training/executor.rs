//! Channel-fed worker pool for background training jobs.
//!
//! Job ids arrive on an unbounded channel. A single dispatcher task pulls
//! them, waits for a worker permit, and spawns the job onto a `JoinSet`.
//! In-flight jobs are tracked by id so a job submitted twice while running is
//! dispatched once.
//!
//! Shutdown stops intake, lets running jobs finish within a grace period, and
//! aborts whatever is left. Aborted jobs stay `processing` in storage and are
//! picked up by the next startup recovery sweep.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::{Mutex, Semaphore, mpsc};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use persona_types::training::JobId;

/// Something that can run one job to completion.
///
/// Handlers own their error reporting; the executor only sees completion.
pub trait JobHandler: Send + Sync + 'static {
    fn handle(&self, job_id: JobId) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("training executor is shutting down")]
    ShuttingDown,
}

pub struct TrainingExecutor {
    sender: mpsc::UnboundedSender<JobId>,
    in_flight: Arc<DashMap<JobId, Instant>>,
    cancel: CancellationToken,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl TrainingExecutor {
    /// Spawn the dispatcher. Must be called from within a Tokio runtime.
    ///
    /// `workers` bounds how many jobs run at once (minimum 1).
    pub fn start<H: JobHandler>(handler: Arc<H>, workers: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let in_flight = Arc::new(DashMap::new());
        let cancel = CancellationToken::new();
        let semaphore = Arc::new(Semaphore::new(workers.max(1)));

        let dispatcher = tokio::spawn(dispatch(
            handler,
            receiver,
            semaphore,
            Arc::clone(&in_flight),
            cancel.clone(),
        ));

        Self {
            sender,
            in_flight,
            cancel,
            dispatcher: Mutex::new(Some(dispatcher)),
        }
    }

    /// Queue a job for execution. Never blocks.
    pub fn submit(&self, job_id: JobId) -> Result<(), ExecutorError> {
        if self.cancel.is_cancelled() {
            return Err(ExecutorError::ShuttingDown);
        }
        self.sender
            .send(job_id)
            .map_err(|_| ExecutorError::ShuttingDown)
    }

    /// Number of jobs currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_running(&self, job_id: &JobId) -> bool {
        self.in_flight.contains_key(job_id)
    }

    /// Stop accepting jobs and wait up to `grace` for running ones.
    ///
    /// Returns `true` if everything drained in time. Safe to call twice.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.cancel.cancel();
        let Some(mut handle) = self.dispatcher.lock().await.take() else {
            return true;
        };

        match tokio::time::timeout(grace, &mut handle).await {
            Ok(_) => {
                info!("training executor drained");
                true
            }
            Err(_) => {
                let abandoned: Vec<String> = self
                    .in_flight
                    .iter()
                    .map(|entry| entry.key().to_string())
                    .collect();
                warn!(
                    abandoned = abandoned.len(),
                    jobs = ?abandoned,
                    "training executor grace period elapsed, aborting running jobs"
                );
                handle.abort();
                false
            }
        }
    }
}

/// Removes a job from the in-flight map when its task ends, panics included.
struct InFlightGuard {
    in_flight: Arc<DashMap<JobId, Instant>>,
    job_id: JobId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.remove(&self.job_id);
    }
}

async fn dispatch<H: JobHandler>(
    handler: Arc<H>,
    mut receiver: mpsc::UnboundedReceiver<JobId>,
    semaphore: Arc<Semaphore>,
    in_flight: Arc<DashMap<JobId, Instant>>,
    cancel: CancellationToken,
) {
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            Some(result) = tasks.join_next(), if !tasks.is_empty() => log_join(result),

            received = receiver.recv() => {
                let Some(job_id) = received else { break };

                if in_flight.contains_key(&job_id) {
                    debug!(job_id = %job_id, "job already running, ignoring duplicate");
                    continue;
                }

                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                };

                in_flight.insert(job_id.clone(), Instant::now());
                let guard = InFlightGuard {
                    in_flight: Arc::clone(&in_flight),
                    job_id: job_id.clone(),
                };
                let handler = Arc::clone(&handler);
                tasks.spawn(async move {
                    let _permit = permit;
                    let _guard = guard;
                    handler.handle(job_id).await;
                });
            }
        }
    }

    receiver.close();
    if !tasks.is_empty() {
        info!(running = tasks.len(), "waiting for running training jobs");
    }
    while let Some(result) = tasks.join_next().await {
        log_join(result);
    }
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!(error = %e, "training job task panicked");
        }
    }
}
