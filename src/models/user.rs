use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::auth::{AuthSessionState, AuthStateProvider, GuardView, RouteGuard, LOGIN_PATH};
use crate::metrics::MetricsRecorder;
use crate::state::AppState;
use crate::utils::http_helpers::{session_credentials, HTTPError};

/// A visitor with a confirmed session, as reported by the auth backend's
/// user endpoint. Unknown payload fields are ignored so backend additions
/// never break a deploy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub last_sign_in_at: Option<String>,
}

impl AuthUser {
    /// Name to greet the visitor with on rendered pages.
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or("member")
    }
}

/// Implementation of the request extractor for AuthUser.
///
/// A handler taking `AuthUser` only runs after a fresh backend check has
/// confirmed the visitor's session on this request. Anything else, an
/// unresolved check included, is rejected with a redirect to the login
/// page so protected content is never written to an unconfirmed client.
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = HTTPError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<AuthUser, HTTPError> {
        let credentials = session_credentials(&parts.headers);

        // Client IP for the audit trail.
        let client_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let provider = AuthStateProvider::new(state.backend.clone(), credentials)
            .with_metrics(state.metrics.clone());
        provider.start().await;

        let session = provider.state();
        let mut guard = RouteGuard::new();
        let directive = guard.observe(&session);

        match (directive.view, session) {
            (GuardView::Content, AuthSessionState::Authenticated(user)) => {
                debug!(user = %user.id, ip = %client_ip, "session check passed");
                Ok(user)
            }
            _ => {
                let location = provider
                    .redirect_to_login()
                    .map(|redirect| redirect.location)
                    .unwrap_or_else(|| LOGIN_PATH.to_string());
                state.metrics.record_guard_redirect();
                debug!(ip = %client_ip, "no valid session, redirecting to login");
                Err(HTTPError::see_other(location))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_backend_user_payload() {
        // Trimmed-down copy of what GoTrue's user endpoint returns.
        let payload = r#"{
            "id": "11111111-2222-3333-4444-555555555555",
            "aud": "authenticated",
            "role": "authenticated",
            "email": "ada@example.com",
            "email_confirmed_at": "2025-03-01T10:00:00Z",
            "phone": "",
            "last_sign_in_at": "2025-03-04T08:30:00Z",
            "app_metadata": { "provider": "email", "providers": ["email"] },
            "user_metadata": {},
            "created_at": "2025-01-15T09:00:00Z"
        }"#;

        let user: AuthUser = serde_json::from_str(payload).unwrap();
        assert_eq!(
            user.id,
            "11111111-2222-3333-4444-555555555555".parse().unwrap()
        );
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
        assert_eq!(user.role.as_deref(), Some("authenticated"));
        assert_eq!(user.last_sign_in_at.as_deref(), Some("2025-03-04T08:30:00Z"));
    }

    #[test]
    fn tolerates_missing_optional_fields() {
        let payload = r#"{ "id": "11111111-2222-3333-4444-555555555555" }"#;
        let user: AuthUser = serde_json::from_str(payload).unwrap();
        assert_eq!(user.email, None);
        assert_eq!(user.display_name(), "member");
    }

    #[test]
    fn display_name_prefers_the_email() {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some("ada@example.com".to_string()),
            role: None,
            last_sign_in_at: None,
        };
        assert_eq!(user.display_name(), "ada@example.com");
    }
}
