//! Metrics port.
//!
//! The engine records counters and durations through [`MetricsSink`]; the
//! infra crate provides the Prometheus-backed implementation.

/// Chat exchanges completed.
pub const CONVERSATIONS_TOTAL: &str = "conversations_total";
/// Wall time of one chat exchange, model call included.
pub const CHAT_DURATION_SECONDS: &str = "chat_duration_seconds";
/// Training jobs by lifecycle outcome (`status` label).
pub const TRAINING_JOBS_TOTAL: &str = "training_jobs_total";
/// Wall time from `processing` to a terminal state.
pub const TRAINING_JOB_DURATION_SECONDS: &str = "training_job_duration_seconds";
/// HTTP requests by `method` and matched `endpoint`.
pub const REQUESTS_TOTAL: &str = "ai_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "ai_request_duration_seconds";

/// Sink for counters and histograms.
///
/// Object-safe so the engine can hold an `Arc<dyn MetricsSink>`.
pub trait MetricsSink: Send + Sync {
    fn increment_counter(&self, name: &'static str, labels: &[(&'static str, String)]);

    fn observe_duration(&self, name: &'static str, seconds: f64);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn increment_counter(&self, _name: &'static str, _labels: &[(&'static str, String)]) {}

    fn observe_duration(&self, _name: &'static str, _seconds: f64) {}
}
