use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::config::{AppConfig, ConfigError};
use crate::models::AuthUser;

use super::offline::OfflineBackend;
use super::supabase::SupabaseBackend;

/// Credentials a visitor presented on a request. Anonymous visitors carry
/// no token; everyone gets the same session check either way.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    access_token: Option<String>,
}

impl SessionCredentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        SessionCredentials {
            access_token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        SessionCredentials::default()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }
}

/// Tokens never appear in logs, even at debug level.
impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Session lifecycle notification fanned out by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

impl SessionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionEvent::SignedIn => "signed_in",
            SessionEvent::SignedOut => "signed_out",
            SessionEvent::TokenRefreshed => "token_refreshed",
        }
    }
}

/// Failures talking to the auth backend. Callers on the request path
/// collapse all of these into "no session", so a backend outage reads as
/// signed out rather than surfacing a server error on a protected page.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    NotConfigured(#[from] ConfigError),
    #[error("backend request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("backend returned unexpected status {status}")]
    UnexpectedStatus { status: u16 },
    #[error("backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("backend response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A session minted by the backend's password grant. Carries the raw access
/// token because it has to go straight into the session cookie.
#[derive(Clone, Deserialize)]
pub struct BackendSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

/// Same rule as for credentials: the tokens stay out of debug output.
impl fmt::Debug for BackendSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSession")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("user", &self.user)
            .finish()
    }
}

/// The SessionBackend trait abstracts the hosted auth/data service.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Fresh session check against the backend. `Ok(Some(user))` is a live
    /// session, `Ok(None)` means the credentials are absent or definitively
    /// rejected, and `Err` is an ambiguous failure the caller decides how
    /// to treat.
    async fn current_session(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<Option<AuthUser>, BackendError>;

    /// Subscribes to session lifecycle events.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    /// Exchanges an email/password pair for a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<BackendSession, BackendError>;

    /// Revokes the session behind the given credentials. Signing out without
    /// a token is a no-op, not an error.
    async fn sign_out(&self, credentials: &SessionCredentials) -> Result<(), BackendError>;

    /// Reads rows from a table for presentational pages. Never part of an
    /// access decision.
    async fn query_rows(&self, table: &str) -> Result<Vec<Value>, BackendError>;
}

/// Creates the concrete backend for the resolved configuration. When the
/// backend is unusable (missing settings, unparseable URL) requests still
/// get answered: the offline backend reports every session check as failed
/// and every capability call as unavailable.
pub fn create_backend(config: &AppConfig) -> Arc<dyn SessionBackend> {
    if let Err(err) = config.require_auth() {
        info!("Auth backend is not configured ({err}). Using offline backend.");
        return Arc::new(OfflineBackend::new(err));
    }

    match SupabaseBackend::new(config) {
        Ok(backend) => {
            info!("Successfully created Supabase backend.");
            Arc::new(backend)
        }
        Err(err) => {
            error!("Failed to create Supabase backend: {err}");
            Arc::new(OfflineBackend::new(err))
        }
    }
}
