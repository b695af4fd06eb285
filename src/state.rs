//! Shared application state.
//!
//! Contains the state that is shared across all request handlers:
//! the resolved configuration, the session backend, and metrics.

use crate::backend::SessionBackend;
use crate::config::AppConfig;
use crate::metrics::Metrics;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// This state is cloned for each request handler. The configuration is
/// resolved once at startup and read-only from then on, so sharing it
/// behind an `Arc` needs no further coordination.
#[derive(Clone)]
pub struct AppState {
    /// Immutable configuration snapshot resolved at startup.
    pub config: Arc<AppConfig>,
    /// Session backend handling auth checks and data reads.
    pub backend: Arc<dyn SessionBackend>,
    /// Prometheus metrics collector.
    pub metrics: Metrics,
}
