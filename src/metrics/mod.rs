//! Metrics collection for observability

pub mod performance;

pub use performance::{OperationStats, PerformanceMonitor, PerformanceSummary};

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, Counter, CounterVec, HistogramVec, Opts, Registry,
};
use std::sync::Arc;
use std::time::Duration;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> =
    Lazy::new(|| Arc::new(Metrics::new().expect("Failed to initialize metrics")));

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Pipeline metrics
    pub runs: CounterVec,
    pub stage_duration: HistogramVec,

    // Agent metrics
    pub agent_calls: CounterVec,
    pub agent_call_duration: HistogramVec,
    pub decode_failures: CounterVec,

    // Text-completion transport
    pub llm_retries: Counter,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let runs = register_counter_vec_with_registry!(
            Opts::new("actualcode_runs_total", "Total orchestration runs"),
            &["status"],
            registry
        )?;

        let stage_duration = register_histogram_vec_with_registry!(
            "actualcode_stage_duration_seconds",
            "Pipeline stage duration in seconds",
            &["stage"],
            registry
        )?;

        let agent_calls = register_counter_vec_with_registry!(
            Opts::new("actualcode_agent_calls_total", "Total agent invocations"),
            &["agent", "status"],
            registry
        )?;

        let agent_call_duration = register_histogram_vec_with_registry!(
            "actualcode_agent_call_duration_seconds",
            "Agent invocation duration in seconds",
            &["agent"],
            registry
        )?;

        let decode_failures = register_counter_vec_with_registry!(
            Opts::new(
                "actualcode_decode_failures_total",
                "Agent responses replaced by default records"
            ),
            &["agent"],
            registry
        )?;

        let llm_retries = register_counter_with_registry!(
            Opts::new("actualcode_llm_retries_total", "Retried text-completion requests"),
            registry
        )?;

        Ok(Self {
            registry,
            runs,
            stage_duration,
            agent_calls,
            agent_call_duration,
            decode_failures,
            llm_retries,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record the outcome of a run
    pub fn record_run(&self, success: bool) {
        let status = if success { "success" } else { "error" };
        self.runs.with_label_values(&[status]).inc();
    }

    /// Record one agent invocation
    pub fn record_agent_call(&self, agent: &str, success: bool, elapsed: Duration) {
        let status = if success { "success" } else { "error" };
        self.agent_calls.with_label_values(&[agent, status]).inc();
        self.agent_call_duration
            .with_label_values(&[agent])
            .observe(elapsed.as_secs_f64());
    }

    pub fn record_decode_failure(&self, agent: &str) {
        self.decode_failures.with_label_values(&[agent]).inc();
    }

    pub fn record_stage(&self, stage: &str, elapsed: Duration) {
        self.stage_duration
            .with_label_values(&[stage])
            .observe(elapsed.as_secs_f64());
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}
