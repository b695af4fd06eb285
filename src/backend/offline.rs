use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::config::ConfigError;
use crate::models::AuthUser;

use super::base::{BackendError, BackendSession, SessionBackend, SessionCredentials, SessionEvent};

/// Stand-in backend for deployments without auth settings. Session checks
/// report the configuration gap as an error (which callers collapse to
/// "signed out") and capability calls fail with the same reason, so the
/// rest of the app never special-cases "not configured".
pub struct OfflineBackend {
    reason: ConfigError,
    events: broadcast::Sender<SessionEvent>,
}

impl OfflineBackend {
    pub fn new(reason: ConfigError) -> Self {
        OfflineBackend {
            reason,
            events: broadcast::channel(1).0,
        }
    }

    fn unavailable(&self) -> BackendError {
        BackendError::NotConfigured(self.reason.clone())
    }
}

#[async_trait]
impl SessionBackend for OfflineBackend {
    fn name(&self) -> &str {
        "offline"
    }

    async fn current_session(
        &self,
        _credentials: &SessionCredentials,
    ) -> Result<Option<AuthUser>, BackendError> {
        Err(self.unavailable())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        // A channel that never fires; subscribers just wait forever.
        self.events.subscribe()
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> Result<BackendSession, BackendError> {
        Err(self.unavailable())
    }

    async fn sign_out(&self, _credentials: &SessionCredentials) -> Result<(), BackendError> {
        Err(self.unavailable())
    }

    async fn query_rows(&self, _table: &str) -> Result<Vec<Value>, BackendError> {
        Err(self.unavailable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> OfflineBackend {
        OfflineBackend::new(ConfigError::AuthBackendUnusable {
            missing: "NEXT_PUBLIC_SUPABASE_URL".to_string(),
        })
    }

    /// Every session check fails with the configuration gap as the reason.
    #[tokio::test]
    async fn session_checks_report_the_missing_configuration() {
        let backend = offline();
        let err = backend
            .current_session(&SessionCredentials::bearer("token"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("NEXT_PUBLIC_SUPABASE_URL"));
    }

    #[tokio::test]
    async fn sign_in_is_unavailable() {
        let backend = offline();
        let err = backend.sign_in("a@b.c", "pw").await.unwrap_err();
        assert!(matches!(err, BackendError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn table_reads_are_unavailable() {
        let backend = offline();
        let err = backend.query_rows("events").await.unwrap_err();
        assert!(matches!(err, BackendError::NotConfigured(_)));
    }
}
