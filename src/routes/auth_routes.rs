//! Sign-in, sign-out and session introspection endpoints.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::{AuthStateProvider, LOGIN_PATH};
use crate::backend::BackendError;
use crate::metrics::MetricsRecorder;
use crate::state::AppState;
use crate::utils::http_helpers::{session_credentials, HTTPError, SESSION_COOKIE};

/// Registers authentication routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/api/session", get(session))
}

#[derive(Deserialize)]
struct LoginForm {
    email: String,
    password: String,
}

/// Builds the session cookie. HttpOnly keeps page scripts away from the
/// token. Secure is only added in production so local HTTP logins work.
fn session_cookie(token: &str, production: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    if production {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear_session_cookie(production: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if production {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Exchanges the login form for a session cookie.
///
/// Bad credentials bounce back to the login page; a missing backend
/// configuration fails fast with a descriptive 503 instead of pretending
/// the credentials were wrong.
async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, HTTPError> {
    let production = state.config.environment.is_production();

    match state.backend.sign_in(&form.email, &form.password).await {
        Ok(session) => {
            state.metrics.record_sign_in("success");
            info!(user = %session.user.id, "sign-in succeeded");
            Ok((
                StatusCode::SEE_OTHER,
                [
                    (
                        header::SET_COOKIE,
                        session_cookie(&session.access_token, production),
                    ),
                    (header::LOCATION, "/dashboard".to_string()),
                ],
            )
                .into_response())
        }
        Err(BackendError::Rejected { status, message }) => {
            state.metrics.record_sign_in("rejected");
            info!(status, message, "sign-in rejected");
            Ok((
                StatusCode::SEE_OTHER,
                [(header::LOCATION, format!("{LOGIN_PATH}?error=1"))],
            )
                .into_response())
        }
        Err(err @ BackendError::NotConfigured(_)) => {
            state.metrics.record_sign_in("unavailable");
            Err(HTTPError::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string()))
        }
        Err(err) => {
            state.metrics.record_sign_in("error");
            warn!(error = %err, "sign-in failed against the backend");
            Err(HTTPError::new(
                StatusCode::BAD_GATEWAY,
                "authentication service is unavailable, try again later",
            ))
        }
    }
}

/// Signs the visitor out. Best effort: a backend failure is logged, the
/// cookie is cleared regardless, and the visitor always lands on the
/// login page.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let credentials = session_credentials(&headers);
    if let Err(err) = state.backend.sign_out(&credentials).await {
        warn!(error = %err, "sign-out against the backend failed");
    }

    (
        StatusCode::SEE_OTHER,
        [
            (
                header::SET_COOKIE,
                clear_session_cookie(state.config.environment.is_production()),
            ),
            (header::LOCATION, LOGIN_PATH.to_string()),
        ],
    )
        .into_response()
}

/// Session introspection. Answers the same fresh-check question the page
/// gate asks, but as JSON and without redirecting, so clients can poll it.
async fn session(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    let provider = AuthStateProvider::new(state.backend.clone(), session_credentials(&headers))
        .with_metrics(state.metrics.clone());
    provider.start().await;

    let session = provider.state();
    match session.user() {
        Some(user) => Json(json!({ "authenticated": true, "user": user })),
        None => Json(json!({ "authenticated": false })),
    }
}
