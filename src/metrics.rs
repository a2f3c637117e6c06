/// Metrics and telemetry for the cloudservices bot
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - Command dispatch counts and failures
/// - Command handler latencies
/// - Moderation actions
/// - Interactive input collector outcomes
/// - Background job execution

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // ========== Command Metrics ==========

    /// Commands dispatched by command name
    pub static ref COMMANDS_DISPATCHED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "commands_dispatched_total",
        "Total number of commands dispatched",
        &["command"]
    )
    .unwrap();

    /// Command handler failures by command name
    pub static ref COMMAND_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "command_failures_total",
        "Total number of commands that failed with an unexpected error",
        &["command"]
    )
    .unwrap();

    /// Command handler duration in seconds
    pub static ref COMMAND_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "command_duration_seconds",
        "Command handler latencies in seconds",
        &["command"],
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .unwrap();

    // ========== Moderation Metrics ==========

    /// Moderation actions by kind
    pub static ref MODERATION_ACTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "moderation_actions_total",
        "Total number of moderation actions",
        &["action"]
    )
    .unwrap();

    // ========== Collector Metrics ==========

    /// Input collector outcomes
    pub static ref COLLECTOR_OUTCOMES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "collector_outcomes_total",
        "Total number of interactive prompts by outcome",
        &["outcome"]
    )
    .unwrap();

    // ========== Background Job Metrics ==========

    /// Background job executions
    pub static ref BACKGROUND_JOBS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "background_jobs_total",
        "Total number of background job executions",
        &["job_type", "status"]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Record a dispatched command
pub fn record_command(command: &str, duration: f64, success: bool) {
    COMMANDS_DISPATCHED_TOTAL.with_label_values(&[command]).inc();
    COMMAND_DURATION_SECONDS
        .with_label_values(&[command])
        .observe(duration);
    if !success {
        COMMAND_FAILURES_TOTAL.with_label_values(&[command]).inc();
    }
}

/// Record a moderation action
pub fn record_moderation_action(action: &str) {
    MODERATION_ACTIONS_TOTAL.with_label_values(&[action]).inc();
}

/// Record how an interactive prompt ended
pub fn record_collector_outcome(outcome: &str) {
    COLLECTOR_OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record a background job execution
pub fn record_background_job(job_type: &str, status: &str) {
    BACKGROUND_JOBS_TOTAL
        .with_label_values(&[job_type, status])
        .inc();
}
