//! Page handlers, public and protected.
//!
//! Pages are deliberately plain HTML; they are the surfaces the session
//! gate protects (or leaves open), not a UI layer.

use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tracing::debug;

use crate::models::AuthUser;
use crate::state::AppState;

/// Registers the page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/login", get(login_page))
        .route("/dashboard", get(dashboard))
}

/// Minimal HTML escaping for values that end up inside markup.
fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Public landing page.
async fn landing(State(state): State<AppState>) -> Html<String> {
    let name = escape_html(&state.config.app_name);
    Html(format!(
        "<!doctype html>\n<html>\n<head><title>{name}</title></head>\n<body>\n\
         <h1>{name}</h1>\n\
         <p>Event management for venues and the people who run them.</p>\n\
         <nav><a href=\"/login\">Sign in</a> | <a href=\"/legal/terms\">Terms</a> | \
         <a href=\"/legal/privacy\">Privacy</a></nav>\n\
         </body>\n</html>"
    ))
}

#[derive(Deserialize)]
struct LoginQuery {
    error: Option<String>,
}

/// Public sign-in page. A failed attempt redirects back here with
/// `?error=1`, which only toggles the notice below.
async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Html<String> {
    let name = escape_html(&state.config.app_name);
    let notice = if query.error.is_some() {
        "<p role=\"alert\">Sign-in failed. Check your email and password.</p>\n"
    } else {
        ""
    };
    Html(format!(
        "<!doctype html>\n<html>\n<head><title>Sign in - {name}</title></head>\n<body>\n\
         <h1>Sign in</h1>\n{notice}\
         <form method=\"post\" action=\"/auth/login\">\n\
         <label>Email <input type=\"email\" name=\"email\" required></label>\n\
         <label>Password <input type=\"password\" name=\"password\" required></label>\n\
         <button type=\"submit\">Sign in</button>\n\
         </form>\n\
         </body>\n</html>"
    ))
}

/// The protected area. The `AuthUser` argument is what makes it protected:
/// the extractor rejects the request before this body ever runs.
async fn dashboard(user: AuthUser, State(state): State<AppState>) -> Html<String> {
    // Presentational only. A failed read degrades to a note; it never
    // blocks the page and is never part of the access decision.
    let events_note = match state.backend.query_rows("events").await {
        Ok(rows) => format!("{} event(s) on the schedule", rows.len()),
        Err(err) => {
            debug!(error = %err, "events table unavailable");
            "Event schedule is unavailable right now".to_string()
        }
    };

    let who = escape_html(user.display_name());
    Html(format!(
        "<!doctype html>\n<html>\n<head><title>Dashboard</title></head>\n<body>\n\
         <h1>Dashboard</h1>\n\
         <p>Signed in as {who}</p>\n\
         <p>{events_note}</p>\n\
         <form method=\"post\" action=\"/auth/logout\"><button type=\"submit\">Sign out</button></form>\n\
         </body>\n</html>"
    ))
}
