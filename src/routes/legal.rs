//! Static legal pages, reachable without a session.

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Registers the legal page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/legal/terms", get(terms))
        .route("/legal/privacy", get(privacy))
}

async fn terms(State(state): State<AppState>) -> Html<String> {
    let name = &state.config.app_name;
    Html(format!(
        "<!doctype html>\n<html>\n<head><title>Terms of Service</title></head>\n<body>\n\
         <h1>Terms of Service</h1>\n\
         <p>{name} is provided as-is to event organizers and venue staff. \
         Accounts are personal and may not be shared.</p>\n\
         <p><a href=\"/\">Back</a></p>\n\
         </body>\n</html>"
    ))
}

async fn privacy(State(state): State<AppState>) -> Html<String> {
    let name = &state.config.app_name;
    Html(format!(
        "<!doctype html>\n<html>\n<head><title>Privacy Policy</title></head>\n<body>\n\
         <h1>Privacy Policy</h1>\n\
         <p>{name} stores the account details you provide and the events you \
         manage. Session tokens live in a cookie scoped to this site.</p>\n\
         <p><a href=\"/\">Back</a></p>\n\
         </body>\n</html>"
    ))
}
