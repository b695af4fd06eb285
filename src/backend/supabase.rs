use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;

use crate::config::{AppConfig, ConfigError};
use crate::models::AuthUser;
use crate::utils::log_throttle::LogThrottle;

use super::base::{BackendError, BackendSession, SessionBackend, SessionCredentials, SessionEvent};

const NETWORK_FAILURE_LOG_WINDOW: Duration = Duration::from_secs(30);
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Talks to a hosted Supabase project over plain REST: GoTrue for sessions
/// and PostgREST for table reads.
pub struct SupabaseBackend {
    base_url: String,
    anon_key: SecretString,
    http: reqwest::Client,
    events: broadcast::Sender<SessionEvent>,
    throttle: LogThrottle,
}

impl SupabaseBackend {
    /// Builds the backend from resolved configuration. The URL is parsed
    /// here so a typo downgrades to the offline backend at startup instead
    /// of failing on the first request.
    pub fn new(config: &AppConfig) -> Result<Self, ConfigError> {
        let auth = config.require_auth()?;
        let parsed = Url::parse(&auth.url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        Ok(SupabaseBackend {
            base_url: auth.url.trim_end_matches('/').to_string(),
            anon_key: auth.anon_key,
            http: reqwest::Client::new(),
            events: broadcast::channel(EVENT_CHANNEL_CAPACITY).0,
            throttle: LogThrottle::new(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn publish(&self, event: SessionEvent) {
        // Nobody subscribed yet is fine; the audit watcher attaches at startup.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl SessionBackend for SupabaseBackend {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn current_session(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<Option<AuthUser>, BackendError> {
        let Some(token) = credentials.access_token() else {
            // Nothing presented, so skip the network round trip.
            return Ok(None);
        };

        let url = self.endpoint("/auth/v1/user");
        debug!("Checking session against {}", url);
        let response = self
            .http
            .get(&url)
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| {
                if let Some(suppressed_count) = self
                    .throttle
                    .allow("backend.supabase.unreachable", NETWORK_FAILURE_LOG_WINDOW)
                {
                    warn!(error = %err, suppressed_count, "auth backend unreachable");
                }
                BackendError::from(err)
            })?;

        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            let user: AuthUser = serde_json::from_str(&body)?;
            Ok(Some(user))
        } else if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            // The backend understood the token and said no. That is a
            // definitive "signed out", not a failure.
            Ok(None)
        } else {
            Err(BackendError::UnexpectedStatus {
                status: status.as_u16(),
            })
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<BackendSession, BackendError> {
        let url = self.endpoint("/auth/v1/token?grant_type=password");
        let response = self
            .http
            .post(&url)
            .header("apikey", self.anon_key.expose_secret())
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            let session: BackendSession = serde_json::from_str(&body)?;
            self.publish(SessionEvent::SignedIn);
            return Ok(session);
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            // GoTrue reports bad credentials as 400 with an error_description.
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|value| {
                    value
                        .get("error_description")
                        .or_else(|| value.get("msg"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or_else(|| "invalid credentials".to_string());
            Err(BackendError::Rejected {
                status: status.as_u16(),
                message,
            })
        } else {
            Err(BackendError::UnexpectedStatus {
                status: status.as_u16(),
            })
        }
    }

    async fn sign_out(&self, credentials: &SessionCredentials) -> Result<(), BackendError> {
        let Some(token) = credentials.access_token() else {
            return Ok(());
        };

        let response = self
            .http
            .post(self.endpoint("/auth/v1/logout"))
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        // 401 means the token was already dead, which is what sign-out wanted.
        if status.is_success() || status == reqwest::StatusCode::UNAUTHORIZED {
            self.publish(SessionEvent::SignedOut);
            Ok(())
        } else {
            Err(BackendError::UnexpectedStatus {
                status: status.as_u16(),
            })
        }
    }

    async fn query_rows(&self, table: &str) -> Result<Vec<Value>, BackendError> {
        let url = self.endpoint(&format!("/rest/v1/{table}?select=*"));
        debug!("Querying table '{}'", table);
        let response = self
            .http
            .get(&url)
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(self.anon_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
