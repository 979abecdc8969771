//! `MetricsSink` backed by the `metrics` facade and a Prometheus exporter.
//!
//! [`FacadeMetrics`] forwards every observation to whichever `metrics`
//! recorder is active. [`install_prometheus`] installs the process-wide
//! Prometheus recorder and returns the handle `/metrics` renders from.

use metrics::{Label, Unit, counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

use persona_core::metrics::{
    CHAT_DURATION_SECONDS, CONVERSATIONS_TOTAL, MetricsSink, REQUEST_DURATION_SECONDS,
    REQUESTS_TOTAL, TRAINING_JOB_DURATION_SECONDS, TRAINING_JOBS_TOTAL,
};

/// Buckets for request and chat latencies, in seconds.
const LATENCY_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Training jobs run for seconds to hours.
const TRAINING_BUCKETS: &[f64] = &[1.0, 5.0, 15.0, 60.0, 300.0, 900.0, 3600.0];

#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeMetrics;

impl MetricsSink for FacadeMetrics {
    fn increment_counter(&self, name: &'static str, labels: &[(&'static str, String)]) {
        let labels: Vec<Label> = labels
            .iter()
            .map(|(key, value)| Label::new(*key, value.clone()))
            .collect();
        counter!(name, labels).increment(1);
    }

    fn observe_duration(&self, name: &'static str, seconds: f64) {
        histogram!(name).record(seconds);
    }
}

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(TRAINING_JOB_DURATION_SECONDS.to_string()),
            TRAINING_BUCKETS,
        )?
        .set_buckets(LATENCY_BUCKETS)
}

/// Install the global Prometheus recorder. Call once per process.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    let handle = builder()?.install_recorder()?;
    describe_metrics();
    Ok(handle)
}

fn describe_metrics() {
    describe_counter!(CONVERSATIONS_TOTAL, "Chat turns answered");
    describe_histogram!(CHAT_DURATION_SECONDS, Unit::Seconds, "Chat call latency");
    describe_counter!(TRAINING_JOBS_TOTAL, "Training jobs by lifecycle event");
    describe_histogram!(
        TRAINING_JOB_DURATION_SECONDS,
        Unit::Seconds,
        "Training job run time"
    );
    describe_counter!(REQUESTS_TOTAL, "HTTP requests by method and route");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "HTTP request latency"
    );
}
