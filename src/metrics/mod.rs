//! Metrics collection and exposition for Prometheus.
//!
//! Counts session checks, guard redirects, sign-ins and backend session
//! events; rendered by the `/metrics` route.

mod recorder;

pub use recorder::{Metrics, MetricsRecorder};
