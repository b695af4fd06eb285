use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, watch};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::backend::{BackendError, SessionBackend, SessionCredentials};
use crate::metrics::{Metrics, MetricsRecorder};
use crate::models::AuthUser;

use super::guard::LoginRedirect;
use super::session::{AuthSessionState, CheckOutcome, SessionTracker};

/// How long a single backend check may take before it counts as failed.
const SESSION_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Collapses a completed backend check into an outcome the state machine
/// accepts, and names the outcome for metrics. Ambiguous failures become
/// `NoSession`: a broken backend must read as "signed out", never as a
/// server error on a protected page.
pub fn collapse_check_result(
    result: Result<Option<AuthUser>, BackendError>,
) -> (CheckOutcome, &'static str) {
    match result {
        Ok(Some(user)) => (CheckOutcome::Valid(user), "authenticated"),
        Ok(None) => (CheckOutcome::NoSession, "no_session"),
        Err(err) => {
            match &err {
                // An intentionally unconfigured backend stays quiet at this
                // level; real failures are loud.
                BackendError::NotConfigured(_) => {
                    debug!(error = %err, "session check unavailable, treating as signed out");
                }
                _ => warn!(error = %err, "session check failed, treating as signed out"),
            }
            (CheckOutcome::NoSession, "error")
        }
    }
}

/// Owns the session state for one visitor. Runs check cycles against the
/// backend, publishes every transition (including the drop back to
/// `Unknown` while a re-check runs) and hands out at most one login
/// redirect per resolved cycle.
pub struct AuthStateProvider {
    backend: Arc<dyn SessionBackend>,
    credentials: SessionCredentials,
    tracker: Mutex<SessionTracker>,
    state_tx: watch::Sender<AuthSessionState>,
    navigation_pending: AtomicBool,
    metrics: Option<Metrics>,
}

impl AuthStateProvider {
    pub fn new(backend: Arc<dyn SessionBackend>, credentials: SessionCredentials) -> Self {
        let (state_tx, _) = watch::channel(AuthSessionState::Unknown);
        AuthStateProvider {
            backend,
            credentials,
            tracker: Mutex::new(SessionTracker::new()),
            state_tx,
            navigation_pending: AtomicBool::new(false),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Runs the initial check cycle. The state is only trustworthy after
    /// this completes.
    pub async fn start(&self) {
        self.run_check().await;
    }

    /// Runs a fresh check cycle, superseding whatever was known before.
    pub async fn refresh(&self) {
        self.run_check().await;
    }

    /// Current state. `Unknown` while a check is in flight.
    pub fn state(&self) -> AuthSessionState {
        self.tracker
            .lock()
            .expect("session tracker mutex poisoned")
            .state()
            .clone()
    }

    /// Subscribes to state transitions. Receivers see the `Unknown` dip of
    /// every re-check, not just settled answers.
    pub fn watch(&self) -> watch::Receiver<AuthSessionState> {
        self.state_tx.subscribe()
    }

    /// Abandons any in-flight check; its late answer will be discarded.
    pub fn detach(&self) {
        self.tracker
            .lock()
            .expect("session tracker mutex poisoned")
            .detach();
    }

    /// Claims the one login navigation for the current resolved cycle.
    /// Returns `None` when a navigation was already handed out and no new
    /// cycle has run since, so callers cannot stack up redirects.
    pub fn redirect_to_login(&self) -> Option<LoginRedirect> {
        if self.navigation_pending.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(LoginRedirect::new())
        }
    }

    async fn run_check(&self) {
        // A new cycle re-arms navigation, and watchers see the dip. The
        // re-arm and every publish stay under the tracker lock: watchers
        // observe transitions in the order the tracker applies them, even
        // when cycles overlap.
        let ticket = {
            let mut tracker = self.tracker.lock().expect("session tracker mutex poisoned");
            let ticket = tracker.begin_check();
            self.navigation_pending.store(false, Ordering::SeqCst);
            self.state_tx.send_replace(AuthSessionState::Unknown);
            ticket
        };

        let started = Instant::now();
        let (outcome, outcome_label) = match timeout(
            SESSION_CHECK_TIMEOUT,
            self.backend.current_session(&self.credentials),
        )
        .await
        {
            Ok(result) => collapse_check_result(result),
            Err(_) => {
                warn!("session check timed out, treating as signed out");
                (CheckOutcome::NoSession, "timeout")
            }
        };
        if let Some(metrics) = &self.metrics {
            metrics.record_session_check(outcome_label, started.elapsed().as_secs_f64());
        }

        let mut tracker = self.tracker.lock().expect("session tracker mutex poisoned");
        match tracker.resolve(ticket, outcome) {
            Ok(state) => {
                self.state_tx.send_replace(state.clone());
            }
            Err(err) => {
                // A newer cycle owns the state now; this answer is dead.
                debug!("discarding session check result: {err}");
            }
        }
    }

    /// Spawns a task that re-runs the check whenever the backend reports a
    /// session event. The task holds only a weak reference, so it ends when
    /// the provider is dropped or the backend closes its event channel.
    pub fn spawn_event_refresh(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let mut events = self.backend.subscribe();
        let provider = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let Some(provider) = provider.upgrade() else {
                            break;
                        };
                        debug!(event = event.as_str(), "session event, re-checking");
                        provider.run_check().await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Missed events still mean the session changed.
                        let Some(provider) = provider.upgrade() else {
                            break;
                        };
                        debug!(skipped, "session events lagged, re-checking");
                        provider.run_check().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
