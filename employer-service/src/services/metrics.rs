//! Metrics for employer-service.
//!
//! Domain counters go through the `metrics` facade; the Prometheus recorder
//! renders them together with the HTTP metrics from service-core.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

use crate::models::Channel;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

const REGISTRATIONS_TOTAL: &str = "employer_registrations_total";
const VERIFICATIONS_TOTAL: &str = "employer_verifications_total";
const NOTIFICATIONS_TOTAL: &str = "employer_notifications_total";
const JOB_POSTINGS_TOTAL: &str = "employer_job_postings_total";

/// Install the global Prometheus recorder. Call once at start-up.
pub fn init_metrics() -> Result<(), anyhow::Error> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {}", e))?;

    METRICS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("metrics handle already initialized"))?;

    metrics::describe_counter!(REGISTRATIONS_TOTAL, "Accounts registered");
    metrics::describe_counter!(
        VERIFICATIONS_TOTAL,
        "Verification attempts by channel and outcome"
    );
    metrics::describe_counter!(
        NOTIFICATIONS_TOTAL,
        "Outbound notifications by kind and outcome"
    );
    metrics::describe_counter!(JOB_POSTINGS_TOTAL, "Job postings created");
    Ok(())
}

/// Metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_registration() {
    metrics::counter!(REGISTRATIONS_TOTAL).increment(1);
}

pub fn record_verification(channel: Channel, outcome: &'static str) {
    metrics::counter!(
        VERIFICATIONS_TOTAL,
        "channel" => channel.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_notification(kind: &'static str, outcome: &'static str) {
    metrics::counter!(NOTIFICATIONS_TOTAL, "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_job_posting() {
    metrics::counter!(JOB_POSTINGS_TOTAL).increment(1);
}
