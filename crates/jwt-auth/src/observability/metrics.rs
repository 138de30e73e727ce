//! Prometheus metrics for jwt-auth

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::Result;
use crate::error::Error;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static START_TIME: OnceLock<Instant> = OnceLock::new();

const METRIC_UPTIME: &str = "jwt_auth_uptime_seconds";
const METRIC_INFO: &str = "jwt_auth_info";

// Authentication metrics
const METRIC_ATTEMPTS: &str = "jwt_auth_attempts_total";
const METRIC_VERIFY_DURATION: &str = "jwt_auth_verify_duration_seconds";

// Key material metrics
const METRIC_KEY_FETCHES: &str = "jwt_auth_key_fetches_total";
const METRIC_KEY_CACHE: &str = "jwt_auth_key_cache_total";

/// Initialize Prometheus metrics recorder.
pub fn init_metrics() -> Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::Config(format!("Failed to install metrics recorder: {e}")))?;

    PROMETHEUS_HANDLE.set(handle).ok();
    START_TIME.set(Instant::now()).ok();

    register_metrics();
    tracing::info!("Prometheus metrics initialized");
    Ok(())
}

fn register_metrics() {
    describe_gauge!(METRIC_UPTIME, "Process uptime in seconds");
    describe_gauge!(METRIC_INFO, "Build information (always 1)");

    describe_counter!(METRIC_ATTEMPTS, "Authentication attempts by outcome");
    describe_histogram!(
        METRIC_VERIFY_DURATION,
        "Time spent obtaining the key and verifying a token"
    );

    describe_counter!(METRIC_KEY_FETCHES, "Verification key fetches by result");
    describe_counter!(METRIC_KEY_CACHE, "Verification key cache lookups by result");

    gauge!(
        METRIC_INFO,
        "version" => env!("CARGO_PKG_VERSION"),
    )
    .set(1.0);
}

/// Render metrics in Prometheus text format.
#[must_use]
pub fn render_metrics() -> String {
    if let Some(start) = START_TIME.get() {
        gauge!(METRIC_UPTIME).set(start.elapsed().as_secs_f64());
    }

    PROMETHEUS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Record the outcome of one authentication attempt.
pub fn record_attempt(outcome: &'static str, duration: Duration) {
    counter!(METRIC_ATTEMPTS, "outcome" => outcome).increment(1);
    histogram!(METRIC_VERIFY_DURATION, "outcome" => outcome).record(duration.as_secs_f64());
}

/// Record a key fetch (`success` or `error`).
pub fn record_key_fetch(result: &'static str) {
    counter!(METRIC_KEY_FETCHES, "result" => result).increment(1);
}

/// Record a key cache lookup (`hit`, `miss` or `error`).
pub fn record_key_cache(result: &'static str) {
    counter!(METRIC_KEY_CACHE, "result" => result).increment(1);
}
