//! Metrics recording implementation using Prometheus.

use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, Counter, CounterVec, Encoder, HistogramVec, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

/// Trait for recording application metrics.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Records a completed session check with its outcome and duration.
    fn record_session_check(&self, outcome: &str, duration_secs: f64);

    /// Records a guard rejection that redirected the visitor to login.
    fn record_guard_redirect(&self);

    /// Records a session lifecycle event observed from the backend.
    fn record_session_event(&self, event: &str);

    /// Records a sign-in attempt with its result.
    fn record_sign_in(&self, result: &str);
}

/// Prometheus metrics collector.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    // Session check metrics
    session_checks_total: CounterVec,
    session_check_duration_seconds: HistogramVec,

    // Guard and lifecycle metrics
    guard_redirects_total: Counter,
    session_events_total: CounterVec,
    sign_ins_total: CounterVec,
}

impl Metrics {
    /// Creates a new metrics instance with a Prometheus registry.
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());

        let session_checks_total = register_counter_vec_with_registry!(
            Opts::new(
                "session_checks_total",
                "Total number of backend session checks"
            ),
            &["outcome"],
            registry.clone()
        )
        .expect("Failed to register session_checks_total");

        let session_check_duration_seconds = register_histogram_vec_with_registry!(
            "session_check_duration_seconds",
            "Backend session check duration in seconds",
            &["outcome"],
            vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0
            ],
            registry.clone()
        )
        .expect("Failed to register session_check_duration_seconds");

        let guard_redirects_total = register_counter_with_registry!(
            Opts::new(
                "guard_redirects_total",
                "Requests for protected pages redirected to login"
            ),
            registry.clone()
        )
        .expect("Failed to register guard_redirects_total");

        let session_events_total = register_counter_vec_with_registry!(
            Opts::new(
                "session_events_total",
                "Session lifecycle events observed from the backend"
            ),
            &["event"],
            registry.clone()
        )
        .expect("Failed to register session_events_total");

        let sign_ins_total = register_counter_vec_with_registry!(
            Opts::new("sign_ins_total", "Sign-in attempts by result"),
            &["result"],
            registry.clone()
        )
        .expect("Failed to register sign_ins_total");

        Metrics {
            registry,
            session_checks_total,
            session_check_duration_seconds,
            guard_redirects_total,
            session_events_total,
            sign_ins_total,
        }
    }

    /// Renders all metrics in Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .expect("Failed to encode metrics");
        String::from_utf8(buffer).expect("Metrics encoding produced invalid UTF-8")
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder for Metrics {
    fn record_session_check(&self, outcome: &str, duration_secs: f64) {
        self.session_checks_total
            .with_label_values(&[outcome])
            .inc();
        self.session_check_duration_seconds
            .with_label_values(&[outcome])
            .observe(duration_secs);
    }

    fn record_guard_redirect(&self) {
        self.guard_redirects_total.inc();
    }

    fn record_session_event(&self, event: &str) {
        self.session_events_total.with_label_values(&[event]).inc();
    }

    fn record_sign_in(&self, result: &str) {
        self.sign_ins_total.with_label_values(&[result]).inc();
    }
}
