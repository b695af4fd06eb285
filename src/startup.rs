//! Application startup and server initialization.
//!
//! This module handles the creation and configuration of the HTTP server,
//! including selection of the session backend, the session-event audit
//! task, and route setup.

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::backend::{create_backend, SessionEvent};
use crate::config::AppConfig;
use crate::metrics::{Metrics, MetricsRecorder};
use crate::routes;
use crate::state::AppState;

/// Initializes and runs the application server.
///
/// Selects the session backend for the resolved configuration, starts the
/// session-event audit task, and serves the configured routes. Binds to
/// the address derived from the configuration and runs until the server
/// stops.
///
/// # Errors
///
/// Returns an error if the server fails to bind to the specified address
/// or encounters a runtime error during execution.
pub async fn run(config: Arc<AppConfig>) -> Result<(), Box<dyn std::error::Error>> {
    let backend = create_backend(&config);
    let metrics = Metrics::new();

    tokio::spawn(audit_session_events(backend.subscribe(), metrics.clone()));

    info!("Starting server on {}", config.bind_address());

    let state = AppState {
        config: config.clone(),
        backend,
        metrics,
    };

    let app = routes::create_router(state);

    let listener = TcpListener::bind(config.bind_address()).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Consumes the backend's session lifecycle events for the operator-facing
/// audit trail: every sign-in, sign-out and token refresh is logged and
/// counted. Runs until the backend drops its event channel.
pub async fn audit_session_events(
    mut events: broadcast::Receiver<SessionEvent>,
    metrics: Metrics,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                info!(event = event.as_str(), "session event");
                metrics.record_session_event(event.as_str());
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "session event audit fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
